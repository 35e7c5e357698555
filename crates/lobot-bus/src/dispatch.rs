//! Request/response exchange on the servo bus.
//!
//! The bus is half-duplex and strictly serial: the host writes one frame and,
//! for queries, waits a bounded time for the addressed servo to answer. The
//! helpers here own that timing. [`ServoBus`](crate::bus::ServoBus) builds on
//! them and adds command encoding and reply decoding.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use lobot_core::error::{Error, Result};
use lobot_core::transport::Transport;

use crate::frame::ServoFrame;
use crate::receiver::{self, FrameResult};

/// Default time to wait for the first reply byte.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_millis(20);

/// Default interval between checks for reply bytes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Default pause after each received byte, giving the rest of the frame time
/// to arrive on a slow line.
pub const DEFAULT_INTER_BYTE_DELAY: Duration = Duration::from_micros(100);

/// Timing parameters for a single exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeConfig {
    /// Upper bound on the wait for the first reply byte.
    pub response_timeout: Duration,
    /// Sleep between `bytes_available()` checks while waiting.
    pub poll_interval: Duration,
    /// Sleep after each byte read by the frame receiver. Zero disables it.
    pub inter_byte_delay: Duration,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        ExchangeConfig {
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            inter_byte_delay: DEFAULT_INTER_BYTE_DELAY,
        }
    }
}

/// Read and discard everything currently buffered on the transport.
///
/// Returns the number of bytes thrown away.
pub async fn drain_input(transport: &mut dyn Transport) -> Result<usize> {
    let mut drained = 0;
    while transport.bytes_available()? > 0 {
        transport.read_byte().await?;
        drained += 1;
    }
    if drained > 0 {
        debug!(drained, "discarded stale input before query");
    }
    Ok(drained)
}

/// Wait until at least one byte is readable or `config.response_timeout`
/// elapses.
///
/// Returns `Ok(true)` when data arrived, `Ok(false)` on timeout.
pub async fn wait_for_reply(transport: &mut dyn Transport, config: &ExchangeConfig) -> Result<bool> {
    let deadline = Instant::now() + config.response_timeout;
    loop {
        if transport.bytes_available()? > 0 {
            return Ok(true);
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(false);
        }
        tokio::time::sleep(config.poll_interval.min(deadline - now)).await;
    }
}

/// Send a command that expects no reply.
pub async fn execute_command(transport: &mut dyn Transport, frame: &[u8]) -> Result<()> {
    transport.send(frame).await
}

/// Send a query and receive the reply frame.
///
/// Stale input is drained first so that a late reply to an earlier query
/// cannot be mistaken for this one. A single echo of the query itself is
/// skipped. Errors:
///
/// - [`Error::Timeout`] if no byte arrives within the response timeout
/// - [`Error::Checksum`] if the reply frame is corrupted
/// - [`Error::NoFrame`] if bytes arrived but no complete frame could be
///   assembled from them
/// - any transport error, unchanged
pub async fn execute_query(
    transport: &mut dyn Transport,
    frame: &[u8],
    config: &ExchangeConfig,
) -> Result<ServoFrame> {
    drain_input(transport).await?;
    transport.send(frame).await?;

    let mut echo_skipped = false;
    loop {
        if !wait_for_reply(transport, config).await? {
            debug!(
                timeout_ms = config.response_timeout.as_millis() as u64,
                "no reply before timeout"
            );
            return Err(Error::Timeout);
        }

        match receiver::receive(transport, config.inter_byte_delay).await? {
            // Adapters without a tri-state buffer hear their own transmission.
            FrameResult::Frame(reply) if !echo_skipped && reply.encode() == frame => {
                debug!("skipping echo of query frame");
                echo_skipped = true;
            }
            FrameResult::Frame(reply) => return Ok(reply),
            FrameResult::ChecksumError => return Err(Error::Checksum),
            FrameResult::NoData => return Err(Error::NoFrame),
        }
    }
}
