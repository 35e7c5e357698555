//! Incremental frame receiver.
//!
//! Replies from a servo arrive on a shared, possibly noisy line. The
//! [`FrameReceiver`] consumes that stream one byte at a time and rebuilds
//! a single frame, re-synchronizing on the `0xFF 0xFF` header whenever it
//! sees garbage.
//!
//! # State machine
//!
//! ```text
//!            0xFF        0xFF
//!   Idle(0) ------> Idle(1) ------> Active --+-- len < 3 or too big --> Idle(0)
//!     ^  ^            |                      |
//!     |  +-- other ---+                      +-- len + 3 bytes --> Frame | ChecksumError
//! ```
//!
//! In `Active` every byte is appended to a 32-byte buffer laid out like the
//! wire frame (index 1 holds the second header byte, `id` lands at index 2,
//! `len` at index 3). Once `len + 3` bytes are buffered the checksum is
//! checked and the frame is handed back.

use std::time::Duration;

use lobot_core::error::Result;
use lobot_core::transport::Transport;
use tracing::{debug, trace};

use crate::frame::{
    CMD_INDEX, HEADER, ID_INDEX, LEN_INDEX, LEN_OFFSET, MAX_FRAME_LEN, MIN_LEN, PARAM_INDEX,
    ServoFrame, checksum,
};

/// Outcome of scanning for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameResult {
    /// A complete frame with a valid checksum.
    Frame(ServoFrame),
    /// A complete frame whose checksum byte did not match its contents.
    ChecksumError,
    /// No frame could be completed from the bytes that were available.
    NoData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Looking for the header; counts consecutive `0xFF` bytes seen (0 or 1).
    Idle { header_count: u8 },
    /// Header seen; accumulating the rest of the frame.
    Active,
}

/// Byte-at-a-time frame reassembler.
#[derive(Debug, Clone)]
pub struct FrameReceiver {
    state: State,
    buf: [u8; MAX_FRAME_LEN],
    count: usize,
    declared_len: Option<u8>,
}

impl Default for FrameReceiver {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameReceiver {
    /// Create a receiver waiting for a frame header.
    pub fn new() -> Self {
        FrameReceiver {
            state: State::Idle { header_count: 0 },
            buf: [0; MAX_FRAME_LEN],
            count: 0,
            declared_len: None,
        }
    }

    /// Drop any partial frame and go back to looking for a header.
    pub fn reset(&mut self) {
        self.state = State::Idle { header_count: 0 };
        self.count = 0;
        self.declared_len = None;
    }

    /// `true` when no header has been matched yet.
    pub fn is_idle(&self) -> bool {
        matches!(self.state, State::Idle { .. })
    }

    /// Number of frame bytes buffered so far (0 while idle).
    pub fn buffered(&self) -> usize {
        self.count
    }

    /// Feed one byte.
    ///
    /// Returns `Some` when the byte completes a frame, either
    /// [`FrameResult::Frame`] or [`FrameResult::ChecksumError`]. The
    /// receiver is back in the idle state afterwards.
    pub fn push(&mut self, byte: u8) -> Option<FrameResult> {
        match self.state {
            State::Idle { header_count } => {
                if byte != HEADER {
                    self.state = State::Idle { header_count: 0 };
                } else if header_count == 0 {
                    self.state = State::Idle { header_count: 1 };
                } else {
                    self.buf[0] = HEADER;
                    self.buf[1] = HEADER;
                    self.count = 2;
                    self.state = State::Active;
                }
                None
            }
            State::Active => self.push_active(byte),
        }
    }

    fn push_active(&mut self, byte: u8) -> Option<FrameResult> {
        self.buf[self.count] = byte;
        self.count += 1;

        if self.count == LEN_INDEX + 1 {
            let frame_len = byte as usize + LEN_OFFSET;
            if byte < MIN_LEN || frame_len > MAX_FRAME_LEN {
                debug!(len = byte, "abandoning frame with invalid length field");
                self.reset();
                return None;
            }
            self.declared_len = Some(byte);
        }

        let len = self.declared_len?;
        if self.count < len as usize + LEN_OFFSET {
            return None;
        }

        let frame = &self.buf[..self.count];
        let received = frame[self.count - 1];
        let expected = checksum(frame);
        let result = if expected == Some(received) {
            FrameResult::Frame(ServoFrame::new(
                frame[ID_INDEX],
                frame[CMD_INDEX],
                &frame[PARAM_INDEX..self.count - 1],
            ))
        } else {
            debug!(
                id = frame[ID_INDEX],
                ?expected,
                received,
                "frame checksum mismatch"
            );
            FrameResult::ChecksumError
        };
        self.reset();
        Some(result)
    }

    /// Consume pending transport bytes until a frame completes or the
    /// transport has nothing more to give.
    ///
    /// A partial frame is kept in `self` when the transport runs dry, so a
    /// receiver held across calls can finish a frame whose bytes straddle
    /// two scans. [`receive`] uses a fresh receiver per call instead.
    pub async fn scan(
        &mut self,
        transport: &mut dyn Transport,
        inter_byte_delay: Duration,
    ) -> Result<FrameResult> {
        while transport.bytes_available()? > 0 {
            let byte = transport.read_byte().await?;
            trace!(byte = format_args!("{byte:02X}"), "rx");
            if !inter_byte_delay.is_zero() {
                tokio::time::sleep(inter_byte_delay).await;
            }
            if let Some(result) = self.push(byte) {
                return Ok(result);
            }
        }
        Ok(FrameResult::NoData)
    }
}

/// Scan the transport for one frame, starting from a clean state.
///
/// Every byte currently available is consumed at most once. If the
/// transport runs out mid-frame the partial frame is discarded and
/// [`FrameResult::NoData`] is returned; the caller re-invokes once more
/// bytes have arrived. Transport failures are returned as `Err`.
pub async fn receive(
    transport: &mut dyn Transport,
    inter_byte_delay: Duration,
) -> Result<FrameResult> {
    let mut receiver = FrameReceiver::new();
    let result = receiver.scan(transport, inter_byte_delay).await?;
    if result == FrameResult::NoData && !receiver.is_idle() {
        debug!(
            buffered = receiver.buffered(),
            "input drained mid-frame, discarding partial frame"
        );
    }
    Ok(result)
}
