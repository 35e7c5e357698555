//! Core types shared by the lobot crates.
//!
//! Servo addresses are plain `u8` values on the wire; the constants here
//! name the reserved address and the value ranges the protocol defines.

use std::fmt;
use std::str::FromStr;

/// Address every servo on the bus listens to.
///
/// The protocol engine does not treat it specially; it is just a byte.
pub const BROADCAST_ID: u8 = 254;

/// Highest address a single servo can be assigned.
pub const MAX_SERVO_ID: u8 = 253;

/// Lowest commandable position.
pub const POSITION_MIN: i16 = 0;

/// Highest commandable position (240 degrees at 0.24 degrees per step).
pub const POSITION_MAX: i16 = 1000;

/// Returned by `read_position` when no valid reply was received.
pub const POSITION_READ_FAILED: i16 = -1;

/// Returned by `read_vin` when no valid reply was received.
///
/// Supply voltage is reported in millivolts and is never negative, so this
/// value cannot collide with a real reading.
pub const VIN_READ_FAILED: i16 = -2048;

/// Clamp a requested position into `[POSITION_MIN, POSITION_MAX]`.
///
/// # Example
///
/// ```
/// use lobot_core::types::clamp_position;
///
/// assert_eq!(clamp_position(1500), 1000);
/// assert_eq!(clamp_position(-50), 0);
/// assert_eq!(clamp_position(300), 300);
/// ```
pub fn clamp_position(position: i16) -> i16 {
    position.clamp(POSITION_MIN, POSITION_MAX)
}

/// Operating mode of a bus servo.
///
/// In position mode the servo drives its output to a commanded position.
/// In motor mode it rotates continuously at a commanded speed
/// (-1000 to +1000).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ServoMode {
    #[default]
    Position,
    Motor,
}

impl ServoMode {
    /// Wire value of this mode in a mode-write payload.
    pub fn as_byte(self) -> u8 {
        match self {
            ServoMode::Position => 0,
            ServoMode::Motor => 1,
        }
    }
}

impl From<ServoMode> for u8 {
    fn from(mode: ServoMode) -> Self {
        mode.as_byte()
    }
}

impl TryFrom<u8> for ServoMode {
    type Error = ParseServoModeError;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(ServoMode::Position),
            1 => Ok(ServoMode::Motor),
            other => Err(ParseServoModeError(format!("{other}"))),
        }
    }
}

impl fmt::Display for ServoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServoMode::Position => "position",
            ServoMode::Motor => "motor",
        };
        write!(f, "{s}")
    }
}

/// Error returned when a string or byte cannot be turned into a [`ServoMode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseServoModeError(String);

impl fmt::Display for ParseServoModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown servo mode: {}", self.0)
    }
}

impl std::error::Error for ParseServoModeError {}

impl FromStr for ServoMode {
    type Err = ParseServoModeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "position" | "servo" | "0" => Ok(ServoMode::Position),
            "motor" | "1" => Ok(ServoMode::Motor),
            _ => Err(ParseServoModeError(s.to_string())),
        }
    }
}
