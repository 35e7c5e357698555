//! Transport implementations for lobot.
//!
//! This crate provides the concrete [`Transport`](lobot_core::Transport) used
//! to reach a servo bus:
//!
//! - [`SerialTransport`]: USB-to-TTL adapters and on-board UARTs
//!
//! # Example
//!
//! ```no_run
//! use lobot_transport::SerialTransport;
//! use lobot_core::transport::Transport;
//!
//! # async fn example() -> lobot_core::Result<()> {
//! let mut transport = SerialTransport::open("/dev/ttyUSB0", 115_200).await?;
//!
//! // Read the position of servo 1
//! transport.send(&[0xFF, 0xFF, 0x01, 0x03, 0x1C, 0xDF]).await?;
//! # Ok(())
//! # }
//! ```

pub mod serial;

pub use serial::{
    DEFAULT_BAUD_RATE, DataBits, FlowControl, Parity, SerialConfig, SerialTransport, StopBits,
};
