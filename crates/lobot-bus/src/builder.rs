//! ServoBusBuilder -- fluent builder for constructing [`ServoBus`] instances.
//!
//! Separates configuration from construction so that callers can set up
//! serial port parameters and exchange timing before the port is opened.
//!
//! # Example
//!
//! ```no_run
//! use lobot_bus::builder::ServoBusBuilder;
//! use std::time::Duration;
//!
//! # async fn example() -> lobot_core::Result<()> {
//! let mut bus = ServoBusBuilder::new()
//!     .serial_port("/dev/ttyUSB0")
//!     .baud_rate(115_200)
//!     .response_timeout(Duration::from_millis(30))
//!     .build()
//!     .await?;
//! bus.move_to(1, 500, 1000).await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use lobot_core::error::{Error, Result};
use lobot_core::transport::Transport;
use lobot_transport::{SerialConfig, SerialTransport};

use crate::bus::ServoBus;
use crate::dispatch::{
    DEFAULT_INTER_BYTE_DELAY, DEFAULT_POLL_INTERVAL, DEFAULT_RESPONSE_TIMEOUT, ExchangeConfig,
};

/// Fluent builder for [`ServoBus`].
///
/// Every setting has a default matching the servo firmware, so the simplest
/// usage is:
///
/// ```no_run
/// # use lobot_bus::builder::ServoBusBuilder;
/// # async fn example() -> lobot_core::Result<()> {
/// let bus = ServoBusBuilder::new()
///     .serial_port("/dev/ttyUSB0")
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ServoBusBuilder {
    serial_port: Option<String>,
    serial_config: SerialConfig,
    response_timeout: Duration,
    poll_interval: Duration,
    inter_byte_delay: Duration,
}

impl Default for ServoBusBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServoBusBuilder {
    /// Create a builder with default settings (115200 8N1, 20 ms response
    /// timeout).
    pub fn new() -> Self {
        ServoBusBuilder {
            serial_port: None,
            serial_config: SerialConfig::default(),
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            inter_byte_delay: DEFAULT_INTER_BYTE_DELAY,
        }
    }

    /// Set the serial port path (e.g. `/dev/ttyUSB0` or `COM3`).
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// Override the baud rate (default: 115200).
    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.serial_config.baud_rate = baud;
        self
    }

    /// Replace the full line configuration (data bits, parity, etc.).
    pub fn serial_config(mut self, config: SerialConfig) -> Self {
        self.serial_config = config;
        self
    }

    /// Set how long a query waits for the first reply byte (default: 20ms).
    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Set how often a waiting query checks for reply bytes (default: 1ms).
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the pause after each received byte (default: 100us). Zero
    /// disables it.
    pub fn inter_byte_delay(mut self, delay: Duration) -> Self {
        self.inter_byte_delay = delay;
        self
    }

    fn exchange_config(&self) -> Result<ExchangeConfig> {
        if self.poll_interval.is_zero() {
            return Err(Error::InvalidParameter(
                "poll_interval must be greater than zero".into(),
            ));
        }
        Ok(ExchangeConfig {
            response_timeout: self.response_timeout,
            poll_interval: self.poll_interval,
            inter_byte_delay: self.inter_byte_delay,
        })
    }

    /// Build a [`ServoBus`] with a caller-provided transport.
    ///
    /// This is the entry point for testing (pass a `MockTransport` from
    /// `lobot-test-harness`) and for callers that manage the transport
    /// themselves.
    pub fn build_with_transport(self, transport: Box<dyn Transport>) -> Result<ServoBus> {
        let config = self.exchange_config()?;
        Ok(ServoBus::new(transport, config))
    }

    /// Build a [`ServoBus`] on a serial port.
    ///
    /// Requires that [`serial_port()`](Self::serial_port) has been called.
    pub async fn build(self) -> Result<ServoBus> {
        let port = self
            .serial_port
            .as_ref()
            .ok_or_else(|| Error::InvalidParameter("serial_port is required for build()".into()))?;
        let config = self.exchange_config()?;

        let transport = SerialTransport::open_with_config(port, self.serial_config).await?;
        Ok(ServoBus::new(Box::new(transport), config))
    }
}
