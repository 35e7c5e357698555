//! Mock transport for deterministic testing of the protocol engine.
//!
//! [`MockTransport`] implements the [`Transport`] trait with pre-loaded
//! request/response pairs. This lets you test frame encoding, the frame
//! receiver, and reply decoding without a servo on the bench.
//!
//! # Example
//!
//! ```
//! use lobot_test_harness::MockTransport;
//!
//! let mut mock = MockTransport::new();
//! // When the engine sends a position read for servo 1, answer with 500.
//! mock.expect(&[0xFF, 0xFF, 0x01, 0x03, 0x1C, 0xDF],
//!             &[0xFF, 0xFF, 0x01, 0x05, 0x1C, 0xF4, 0x01, 0xE8]);
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;

use lobot_core::error::{Error, Result};
use lobot_core::transport::Transport;

/// A pre-loaded request/response pair for the mock transport.
#[derive(Debug, Clone)]
struct Expectation {
    /// The exact bytes we expect to be sent.
    request: Vec<u8>,
    /// The bytes that become readable once the matching request is sent.
    response: Vec<u8>,
}

/// A mock [`Transport`] for testing the protocol engine without hardware.
///
/// Expectations are consumed in order. When `send()` is called, the sent
/// data is recorded and matched against the next expectation; its response
/// bytes are then queued as pending input. Bytes can also be queued directly
/// with [`inject`](MockTransport::inject) to model line noise or stale
/// replies that arrived before a request.
///
/// With [`lenient`](MockTransport::lenient) set, sends that have no matching
/// expectation are recorded and accepted instead of failing. Fire-and-forget
/// commands are usually tested this way.
#[derive(Debug)]
pub struct MockTransport {
    /// Ordered queue of expected request/response pairs.
    expectations: VecDeque<Expectation>,
    /// Bytes waiting to be read.
    rx: VecDeque<u8>,
    /// Whether the transport is "connected".
    connected: bool,
    /// Accept unmatched sends instead of returning an error.
    lenient: bool,
    /// Log of all bytes sent through this transport.
    sent_log: Vec<Vec<u8>>,
    /// Total number of bytes handed out by `read_byte()`.
    bytes_read: usize,
}

impl MockTransport {
    /// Create a new mock transport in the connected state.
    pub fn new() -> Self {
        MockTransport {
            expectations: VecDeque::new(),
            rx: VecDeque::new(),
            connected: true,
            lenient: false,
            sent_log: Vec::new(),
            bytes_read: 0,
        }
    }

    /// Create a mock that accepts any send without an expectation.
    pub fn lenient() -> Self {
        MockTransport {
            lenient: true,
            ..Self::new()
        }
    }

    /// Add an expected request/response pair.
    ///
    /// When `send()` is called with data matching `request`, `response`
    /// becomes readable. An empty `response` models a servo that never
    /// answers.
    pub fn expect(&mut self, request: &[u8], response: &[u8]) {
        self.expectations.push_back(Expectation {
            request: request.to_vec(),
            response: response.to_vec(),
        });
    }

    /// Queue bytes as pending input right now, independent of any send.
    pub fn inject(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    /// Return a reference to all data that has been sent through this transport.
    ///
    /// Each element is the byte slice from one `send()` call.
    pub fn sent_data(&self) -> &[Vec<u8>] {
        &self.sent_log
    }

    /// Return the number of expectations that have not yet been consumed.
    pub fn remaining_expectations(&self) -> usize {
        self.expectations.len()
    }

    /// Number of bytes still pending.
    pub fn pending_bytes(&self) -> usize {
        self.rx.len()
    }

    /// Total number of bytes consumed through `read_byte()`.
    pub fn bytes_read(&self) -> usize {
        self.bytes_read
    }

    /// Set the connected state of the mock transport.
    ///
    /// When set to `false`, subsequent calls return [`Error::NotConnected`].
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        self.sent_log.push(data.to_vec());

        match self.expectations.pop_front() {
            Some(expectation) => {
                if data != expectation.request.as_slice() {
                    return Err(Error::Protocol(format!(
                        "unexpected send data: expected {:02X?}, got {:02X?}",
                        expectation.request, data
                    )));
                }
                self.rx.extend(expectation.response);
                Ok(())
            }
            None if self.lenient => Ok(()),
            None => Err(Error::Protocol(
                "no more expectations in mock transport".into(),
            )),
        }
    }

    fn bytes_available(&mut self) -> Result<usize> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        Ok(self.rx.len())
    }

    async fn read_byte(&mut self) -> Result<u8> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        let byte = self.rx.pop_front().ok_or(Error::Timeout)?;
        self.bytes_read += 1;
        Ok(byte)
    }

    async fn close(&mut self) -> Result<()> {
        self.connected = false;
        self.rx.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
