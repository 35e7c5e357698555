//! Lobot bus frame encoder and checksum.
//!
//! Lobot/HiWonder bus servos share one half-duplex data line. Every command
//! from the host and every reply from a servo uses the same frame layout.
//! This module handles the pure byte-level side of that: building frames and
//! computing the checksum. Decoding a live byte stream is the job of
//! [`receiver`](crate::receiver).
//!
//! # Frame format
//!
//! ```text
//! 0xFF 0xFF <id> <len> <cmd> [<param>...] <checksum>
//! ```
//!
//! - Header: two `0xFF` bytes
//! - `id`: servo address (0-253, 254 = broadcast)
//! - `len`: byte count from `len` through `checksum` inclusive, i.e.
//!   `3 + params`
//! - `cmd`: command code
//! - `param`: little-endian parameters (0 to 6 bytes for this command set)
//! - `checksum`: `!(id + len + cmd + params)` truncated to 8 bits
//!
//! The whole frame is `len + 3` bytes on the wire.

use bytes::{BufMut, BytesMut};

/// Header byte repeated twice at the start of every frame.
pub const HEADER: u8 = 0xFF;

/// Bytes in a frame that `len` does not count: both header bytes and `id`.
pub const LEN_OFFSET: usize = 3;

/// Smallest legal `len` value (a frame with no parameters).
pub const MIN_LEN: u8 = 3;

/// Hard capacity of a receive buffer. A declared `len` whose frame would
/// not fit is treated as garbage.
pub const MAX_FRAME_LEN: usize = 32;

/// Largest parameter block that still fits in [`MAX_FRAME_LEN`].
pub const MAX_PAYLOAD_LEN: usize = MAX_FRAME_LEN - LEN_OFFSET - MIN_LEN as usize;

/// Byte offset of `id` within a frame.
pub const ID_INDEX: usize = 2;

/// Byte offset of `len` within a frame.
pub const LEN_INDEX: usize = 3;

/// Byte offset of `cmd` within a frame.
pub const CMD_INDEX: usize = 4;

/// Byte offset of the first parameter within a frame.
pub const PARAM_INDEX: usize = 5;

/// A decoded (or to-be-encoded) bus frame without its header and checksum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServoFrame {
    /// Servo address.
    pub id: u8,
    /// Command code.
    pub command: u8,
    /// Parameter bytes following the command code.
    pub payload: Vec<u8>,
}

impl ServoFrame {
    /// Create a frame for `id` carrying `command` and `payload`.
    pub fn new(id: u8, command: u8, payload: &[u8]) -> Self {
        ServoFrame {
            id,
            command,
            payload: payload.to_vec(),
        }
    }

    /// Value of the `len` field for this frame.
    ///
    /// Payloads longer than [`MAX_PAYLOAD_LEN`] count as that many bytes,
    /// matching what [`encode`](Self::encode) puts on the wire.
    pub fn len_field(&self) -> u8 {
        MIN_LEN + self.payload.len().min(MAX_PAYLOAD_LEN) as u8
    }

    /// Encode this frame into raw bytes ready for transmission.
    pub fn encode(&self) -> Vec<u8> {
        encode_frame(self.id, self.command, &self.payload)
    }

    /// Interpret the first two payload bytes as a little-endian `u16`.
    pub fn payload_u16(&self) -> Option<u16> {
        match self.payload.as_slice() {
            [lo, hi, ..] => Some(u16::from_le_bytes([*lo, *hi])),
            _ => None,
        }
    }

    /// Interpret the first two payload bytes as a little-endian `i16`.
    pub fn payload_i16(&self) -> Option<i16> {
        self.payload_u16().map(|v| v as i16)
    }
}

/// Compute the checksum of a frame.
///
/// `frame` starts at the first header byte. The sum covers `id` through the
/// last parameter byte as counted by the `len` field; any trailing bytes,
/// such as a checksum already present, are ignored.
///
/// Returns `None` if `frame` is shorter than the range its `len` field
/// declares (or too short to hold `len` at all).
///
/// # Example
///
/// ```
/// use lobot_bus::frame::checksum;
///
/// // Stop command to servo 1
/// assert_eq!(checksum(&[0xFF, 0xFF, 0x01, 0x03, 0x0C]), Some(0xEF));
/// assert_eq!(checksum(&[0xFF, 0xFF, 0x01]), None);
/// ```
pub fn checksum(frame: &[u8]) -> Option<u8> {
    let end = *frame.get(LEN_INDEX)? as usize + 2;
    frame.get(ID_INDEX..end).map(sum_complement)
}

/// Return `true` if the last byte of a complete frame is its checksum.
pub fn verify_checksum(frame: &[u8]) -> bool {
    match (frame.last(), frame.get(LEN_INDEX)) {
        (Some(&received), Some(&len)) => {
            frame.len() == len as usize + LEN_OFFSET && checksum(frame) == Some(received)
        }
        _ => false,
    }
}

fn sum_complement(bytes: &[u8]) -> u8 {
    !bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Encode a frame into raw bytes ready for transmission.
///
/// Produces the full wire format including header, `len`, and checksum.
/// At most [`MAX_PAYLOAD_LEN`] payload bytes are sent; any excess is
/// dropped so the frame stays within [`MAX_FRAME_LEN`].
///
/// # Example
///
/// ```
/// use lobot_bus::frame::encode_frame;
///
/// // Load/unload write (31) with "load" to servo 1
/// let bytes = encode_frame(0x01, 31, &[1]);
/// assert_eq!(bytes, vec![0xFF, 0xFF, 0x01, 0x04, 0x1F, 0x01, 0xDA]);
/// ```
pub fn encode_frame(id: u8, command: u8, payload: &[u8]) -> Vec<u8> {
    let payload = &payload[..payload.len().min(MAX_PAYLOAD_LEN)];
    let len = MIN_LEN + payload.len() as u8;
    let mut buf = BytesMut::with_capacity(len as usize + LEN_OFFSET);
    buf.put_u8(HEADER);
    buf.put_u8(HEADER);
    buf.put_u8(id);
    buf.put_u8(len);
    buf.put_u8(command);
    buf.put_slice(payload);
    let sum = sum_complement(&buf[ID_INDEX..]);
    buf.put_u8(sum);
    buf.to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_stop_servo_1() {
        assert_eq!(checksum(&[0xFF, 0xFF, 0x01, 0x03, 0x0C]), Some(0xEF));
    }

    #[test]
    fn checksum_ignores_trailing_checksum_byte() {
        let frame = [0xFF, 0xFF, 0x01, 0x03, 0x0C, 0xEF];
        assert_eq!(checksum(&frame), Some(0xEF));
    }

    #[test]
    fn checksum_wraps_past_255() {
        // 0xFE + 0x07 + 0x01 + 0xE8 + 0x03 + 0xF4 + 0x01 = 0x2E6 -> 0xE6 -> !0xE6 = 0x19
        let frame = [0xFF, 0xFF, 0xFE, 0x07, 0x01, 0xE8, 0x03, 0xF4, 0x01];
        assert_eq!(checksum(&frame), Some(0x19));
    }

    #[test]
    fn checksum_of_short_slice_is_none() {
        assert_eq!(checksum(&[]), None);
        assert_eq!(checksum(&[0xFF, 0xFF, 0x01]), None);
        // len claims two parameters that never arrived.
        assert_eq!(checksum(&[0xFF, 0xFF, 0x01, 0x05, 0x1C]), None);
    }

    #[test]
    fn encode_frame_zero_payload() {
        let bytes = encode_frame(0x05, 28, &[]);
        assert_eq!(bytes, vec![0xFF, 0xFF, 0x05, 0x03, 0x1C, 0xDB]);
    }

    #[test]
    fn encode_frame_total_length_is_len_plus_three() {
        for n in 0..=6 {
            let payload = vec![0x10; n];
            let bytes = encode_frame(0x01, 0x01, &payload);
            assert_eq!(bytes[LEN_INDEX] as usize, 3 + n);
            assert_eq!(bytes.len(), bytes[LEN_INDEX] as usize + LEN_OFFSET);
        }
    }

    #[test]
    fn encode_frame_caps_oversized_payload() {
        let payload: Vec<u8> = (0..=255).cycle().take(300).collect();
        let bytes = encode_frame(0x01, 0x01, &payload);
        assert_eq!(bytes.len(), MAX_FRAME_LEN);
        assert_eq!(bytes[LEN_INDEX] as usize, MIN_LEN as usize + MAX_PAYLOAD_LEN);
        assert_eq!(&bytes[PARAM_INDEX..MAX_FRAME_LEN - 1], &payload[..MAX_PAYLOAD_LEN]);
        assert!(verify_checksum(&bytes));

        let frame = ServoFrame::new(0x01, 0x01, &payload);
        assert_eq!(frame.len_field(), 29);
        assert_eq!(frame.encode(), bytes);
    }

    #[test]
    fn encode_frame_checksum_verifies() {
        let bytes = encode_frame(0x03, 0x1D, &[0x01, 0x00, 0x18, 0xFC]);
        assert!(verify_checksum(&bytes));
    }

    #[test]
    fn verify_rejects_corrupted_checksum() {
        let mut bytes = encode_frame(0x03, 0x0C, &[]);
        *bytes.last_mut().unwrap() ^= 0x01;
        assert!(!verify_checksum(&bytes));
    }

    #[test]
    fn verify_rejects_wrong_length() {
        let mut bytes = encode_frame(0x03, 0x0C, &[]);
        bytes.push(0x00);
        assert!(!verify_checksum(&bytes));
        assert!(!verify_checksum(&[0xFF, 0xFF]));
        assert!(!verify_checksum(&[]));
    }

    #[test]
    fn servo_frame_encode_matches_encode_frame() {
        let frame = ServoFrame::new(0x02, 0x0D, &[0x07]);
        assert_eq!(frame.len_field(), 4);
        assert_eq!(frame.encode(), encode_frame(0x02, 0x0D, &[0x07]));
    }

    #[test]
    fn servo_frame_payload_words() {
        let frame = ServoFrame::new(0x01, 28, &[0xF4, 0x01]);
        assert_eq!(frame.payload_u16(), Some(500));
        assert_eq!(frame.payload_i16(), Some(500));

        let negative = ServoFrame::new(0x01, 28, &[0xF6, 0xFF]);
        assert_eq!(negative.payload_i16(), Some(-10));
        assert_eq!(negative.payload_u16(), Some(0xFFF6));

        let short = ServoFrame::new(0x01, 28, &[0x01]);
        assert_eq!(short.payload_u16(), None);
    }
}
