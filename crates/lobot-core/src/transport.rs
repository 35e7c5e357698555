//! Transport trait for servo bus communication.
//!
//! The [`Transport`] trait abstracts over the physical link to the servo bus.
//! A serial implementation lives in `lobot-transport`; a scripted mock for
//! tests lives in `lobot-test-harness`.
//!
//! The protocol engine in `lobot-bus` consumes bytes one at a time and only
//! while [`Transport::bytes_available`] reports pending input, so a transport
//! never has to block inside [`Transport::read_byte`].

use async_trait::async_trait;

use crate::error::Result;

/// Asynchronous byte-level transport to a servo bus.
///
/// The link is half-duplex: bytes written with [`send`](Transport::send) go
/// out on the shared data line, and replies from servos show up as pending
/// input. There is no flow control and no framing at this layer; line noise
/// or dropped bytes surface only as checksum mismatches or missing replies in
/// the protocol engine.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send raw bytes to the bus.
    ///
    /// Implementations should not return until all bytes have been handed
    /// to the underlying device (serial TX buffer flushed).
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Number of received bytes that can be read without waiting.
    fn bytes_available(&mut self) -> Result<usize>;

    /// Read one pending byte.
    ///
    /// Only valid when [`bytes_available`](Transport::bytes_available)
    /// returned a non-zero count. Implementations may return
    /// [`Error::Timeout`](crate::error::Error::Timeout) if called with no
    /// pending input.
    async fn read_byte(&mut self) -> Result<u8>;

    /// Close the transport connection.
    ///
    /// After calling `close()`, subsequent calls should return
    /// [`Error::NotConnected`](crate::error::Error::NotConnected).
    async fn close(&mut self) -> Result<()>;

    /// Check whether the transport is currently connected.
    fn is_connected(&self) -> bool;
}
