//! Lobot command builders and reply parsers.
//!
//! This module provides functions to construct command frames for the
//! servo operations the bus driver supports (move, stop, ID write, mode
//! write, load/unload, position and voltage reads) and to parse the
//! corresponding replies.
//!
//! All functions are pure: they produce or consume bytes without performing
//! any I/O. Encoders never fail. Out-of-range positions are clamped and
//! signed speeds are sent as their two's-complement bit pattern.

use lobot_core::types::clamp_position;
use lobot_core::{Error, Result, ServoMode};

use crate::frame::{ServoFrame, encode_frame};

// ---------------------------------------------------------------
// Command codes
// ---------------------------------------------------------------

/// Move to a position over a time span (params: position u16, time u16).
pub const CMD_MOVE_TIME_WRITE: u8 = 1;
/// Read back the last move-time target.
pub const CMD_MOVE_TIME_READ: u8 = 2;
/// Preload a move-time target without starting it.
pub const CMD_MOVE_TIME_WAIT_WRITE: u8 = 7;
/// Read back the preloaded move-time target.
pub const CMD_MOVE_TIME_WAIT_READ: u8 = 8;
/// Start a preloaded move.
pub const CMD_MOVE_START: u8 = 11;
/// Stop any motion in progress.
pub const CMD_MOVE_STOP: u8 = 12;
/// Write a new servo ID (param: new id).
pub const CMD_ID_WRITE: u8 = 13;
/// Read the servo ID.
pub const CMD_ID_READ: u8 = 14;
/// Adjust the angle offset (not persisted).
pub const CMD_ANGLE_OFFSET_ADJUST: u8 = 17;
/// Persist the angle offset.
pub const CMD_ANGLE_OFFSET_WRITE: u8 = 18;
/// Read the angle offset.
pub const CMD_ANGLE_OFFSET_READ: u8 = 19;
/// Write the min/max angle limits.
pub const CMD_ANGLE_LIMIT_WRITE: u8 = 20;
/// Read the min/max angle limits.
pub const CMD_ANGLE_LIMIT_READ: u8 = 21;
/// Write the supply voltage limits.
pub const CMD_VIN_LIMIT_WRITE: u8 = 22;
/// Read the supply voltage limits.
pub const CMD_VIN_LIMIT_READ: u8 = 23;
/// Write the over-temperature limit.
pub const CMD_TEMP_MAX_LIMIT_WRITE: u8 = 24;
/// Read the over-temperature limit.
pub const CMD_TEMP_MAX_LIMIT_READ: u8 = 25;
/// Read the internal temperature.
pub const CMD_TEMP_READ: u8 = 26;
/// Read the supply voltage in millivolts.
pub const CMD_VIN_READ: u8 = 27;
/// Read the current position.
pub const CMD_POS_READ: u8 = 28;
/// Select position or motor mode (params: mode, 0, speed i16).
pub const CMD_SERVO_OR_MOTOR_MODE_WRITE: u8 = 29;
/// Read the mode and motor speed.
pub const CMD_SERVO_OR_MOTOR_MODE_READ: u8 = 30;
/// Energize or release the motor (param: 1 = load, 0 = unload).
pub const CMD_LOAD_OR_UNLOAD_WRITE: u8 = 31;
/// Read the load state.
pub const CMD_LOAD_OR_UNLOAD_READ: u8 = 32;
/// Write the LED on/off setting.
pub const CMD_LED_CTRL_WRITE: u8 = 33;
/// Read the LED on/off setting.
pub const CMD_LED_CTRL_READ: u8 = 34;
/// Write which faults flash the LED.
pub const CMD_LED_ERROR_WRITE: u8 = 35;
/// Read which faults flash the LED.
pub const CMD_LED_ERROR_READ: u8 = 36;

// ---------------------------------------------------------------
// Command builders
// ---------------------------------------------------------------

/// Build a move command: go to `position` (clamped to 0..=1000) in `time_ms`.
///
/// # Example
///
/// ```
/// use lobot_bus::commands::encode_move;
///
/// // Servo 1 to position 300 in 500 ms
/// let bytes = encode_move(1, 300, 500);
/// assert_eq!(bytes, vec![0xFF, 0xFF, 0x01, 0x07, 0x01, 0x2C, 0x01, 0xF4, 0x01, 0xD4]);
/// ```
pub fn encode_move(id: u8, position: i16, time_ms: u16) -> Vec<u8> {
    let [p_lo, p_hi] = clamp_position(position).to_le_bytes();
    let [t_lo, t_hi] = time_ms.to_le_bytes();
    encode_frame(id, CMD_MOVE_TIME_WRITE, &[p_lo, p_hi, t_lo, t_hi])
}

/// Build a stop command.
pub fn encode_stop(id: u8) -> Vec<u8> {
    encode_frame(id, CMD_MOVE_STOP, &[])
}

/// Build an ID write addressed to `old_id`, assigning `new_id`.
pub fn encode_set_id(old_id: u8, new_id: u8) -> Vec<u8> {
    encode_frame(old_id, CMD_ID_WRITE, &[new_id])
}

/// Build a mode write.
///
/// `speed` only matters in motor mode (-1000 to +1000); it is sent as the
/// raw two's-complement bit pattern.
pub fn encode_set_mode(id: u8, mode: u8, speed: i16) -> Vec<u8> {
    let [s_lo, s_hi] = (speed as u16).to_le_bytes();
    encode_frame(id, CMD_SERVO_OR_MOTOR_MODE_WRITE, &[mode, 0, s_lo, s_hi])
}

/// Build a mode write that puts the servo in motor mode at `speed`.
pub fn encode_run(id: u8, speed: i16) -> Vec<u8> {
    encode_set_mode(id, ServoMode::Motor.as_byte(), speed)
}

/// Build a load (`enabled = true`) or unload command.
pub fn encode_load(id: u8, enabled: bool) -> Vec<u8> {
    encode_frame(id, CMD_LOAD_OR_UNLOAD_WRITE, &[enabled as u8])
}

/// Build a position read query.
pub fn encode_read_position(id: u8) -> Vec<u8> {
    encode_frame(id, CMD_POS_READ, &[])
}

/// Build a supply voltage read query.
pub fn encode_read_vin(id: u8) -> Vec<u8> {
    encode_frame(id, CMD_VIN_READ, &[])
}

// ---------------------------------------------------------------
// Reply parsers
// ---------------------------------------------------------------

/// Parse a position read reply.
///
/// The position is carried as an unsigned 16-bit value; it is returned as
/// `i16` so that callers can share the `-1` failure sentinel.
pub fn parse_position_reply(frame: &ServoFrame) -> Result<i16> {
    let raw = reply_word(frame, CMD_POS_READ, "position")?;
    Ok(raw as i16)
}

/// Parse a supply voltage read reply (millivolts, signed 16-bit).
pub fn parse_vin_reply(frame: &ServoFrame) -> Result<i16> {
    let raw = reply_word(frame, CMD_VIN_READ, "voltage")?;
    Ok(raw as i16)
}

fn reply_word(frame: &ServoFrame, expected_cmd: u8, label: &str) -> Result<u16> {
    if frame.command != expected_cmd {
        return Err(Error::Protocol(format!(
            "expected {label} reply (cmd {expected_cmd}), got cmd {}",
            frame.command
        )));
    }
    frame.payload_u16().ok_or_else(|| {
        Error::Protocol(format!(
            "{label} reply too short: {} payload byte(s)",
            frame.payload.len()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{PARAM_INDEX, checksum, verify_checksum};

    fn param_word(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes([bytes[PARAM_INDEX + offset], bytes[PARAM_INDEX + offset + 1]])
    }

    #[test]
    fn encode_move_bytes() {
        let bytes = encode_move(1, 300, 500);
        assert_eq!(
            bytes,
            vec![0xFF, 0xFF, 0x01, 0x07, 0x01, 0x2C, 0x01, 0xF4, 0x01, 0xD4]
        );
    }

    #[test]
    fn encode_move_clamps_high() {
        let bytes = encode_move(1, 1500, 500);
        assert_eq!(param_word(&bytes, 0), 1000);
        assert_eq!(param_word(&bytes, 2), 500);
        assert!(verify_checksum(&bytes));
    }

    #[test]
    fn encode_move_clamps_negative() {
        let bytes = encode_move(1, -50, 500);
        assert_eq!(param_word(&bytes, 0), 0);
        assert!(verify_checksum(&bytes));
    }

    #[test]
    fn encode_move_full_time_range() {
        let bytes = encode_move(9, 1000, u16::MAX);
        assert_eq!(param_word(&bytes, 2), u16::MAX);
    }

    #[test]
    fn encode_stop_bytes() {
        assert_eq!(encode_stop(1), vec![0xFF, 0xFF, 0x01, 0x03, 0x0C, 0xEF]);
    }

    #[test]
    fn encode_set_id_addresses_old_id() {
        let bytes = encode_set_id(1, 7);
        assert_eq!(bytes, vec![0xFF, 0xFF, 0x01, 0x04, 0x0D, 0x07, 0xE6]);
    }

    #[test]
    fn encode_set_mode_negative_speed_bit_pattern() {
        let bytes = encode_set_mode(2, 1, -1000);
        assert_eq!(bytes[PARAM_INDEX], 1);
        assert_eq!(bytes[PARAM_INDEX + 1], 0);
        // -1000 = 0xFC18
        assert_eq!(bytes[PARAM_INDEX + 2], 0x18);
        assert_eq!(bytes[PARAM_INDEX + 3], 0xFC);
        assert!(verify_checksum(&bytes));
    }

    #[test]
    fn encode_run_is_motor_mode() {
        assert_eq!(encode_run(3, 250), encode_set_mode(3, 1, 250));
    }

    #[test]
    fn encode_load_unload() {
        let load = encode_load(1, true);
        let unload = encode_load(1, false);
        assert_eq!(load, vec![0xFF, 0xFF, 0x01, 0x04, 0x1F, 0x01, 0xDA]);
        assert_eq!(unload, vec![0xFF, 0xFF, 0x01, 0x04, 0x1F, 0x00, 0xDB]);
    }

    #[test]
    fn encode_queries() {
        assert_eq!(
            encode_read_position(1),
            vec![0xFF, 0xFF, 0x01, 0x03, 0x1C, 0xDF]
        );
        assert_eq!(encode_read_vin(1), vec![0xFF, 0xFF, 0x01, 0x03, 0x1B, 0xE0]);
    }

    #[test]
    fn every_encoder_checksum_matches_last_byte() {
        let frames = [
            encode_move(0, 0, 0),
            encode_move(253, 1000, 30_000),
            encode_move(254, i16::MIN, 1),
            encode_stop(17),
            encode_set_id(0, 253),
            encode_set_mode(5, 0, i16::MAX),
            encode_set_mode(5, 1, i16::MIN),
            encode_run(6, -1),
            encode_load(200, true),
            encode_load(200, false),
            encode_read_position(42),
            encode_read_vin(42),
        ];
        for bytes in &frames {
            let last = *bytes.last().unwrap();
            assert_eq!(checksum(bytes), Some(last), "frame {bytes:02X?}");
        }
    }

    #[test]
    fn parse_position_reply_ok() {
        let frame = ServoFrame::new(1, CMD_POS_READ, &[0xF4, 0x01]);
        assert_eq!(parse_position_reply(&frame).unwrap(), 500);
    }

    #[test]
    fn parse_vin_reply_ok() {
        // 7400 mV = 0x1CE8
        let frame = ServoFrame::new(1, CMD_VIN_READ, &[0xE8, 0x1C]);
        assert_eq!(parse_vin_reply(&frame).unwrap(), 7400);
    }

    #[test]
    fn parse_vin_reply_signed() {
        let frame = ServoFrame::new(1, CMD_VIN_READ, &[0xFF, 0xFF]);
        assert_eq!(parse_vin_reply(&frame).unwrap(), -1);
    }

    #[test]
    fn parse_reply_wrong_command() {
        let frame = ServoFrame::new(1, CMD_VIN_READ, &[0xF4, 0x01]);
        let err = parse_position_reply(&frame).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn parse_reply_too_short() {
        let frame = ServoFrame::new(1, CMD_POS_READ, &[0xF4]);
        assert!(matches!(
            parse_position_reply(&frame),
            Err(Error::Protocol(_))
        ));
    }
}
