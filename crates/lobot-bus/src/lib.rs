//! Lobot bus servo protocol engine.
//!
//! This crate implements the framed binary protocol spoken by Lobot/HiWonder
//! serial bus servos (LX-15D, LX-16A, LX-224 and friends). It provides:
//!
//! - **Frame codec** ([`frame`]) -- build frames and compute the checksum.
//! - **Command builders** ([`commands`]) -- encode move, stop, ID, mode and
//!   load commands, encode read queries and parse their replies.
//! - **Frame receiver** ([`receiver`]) -- byte-at-a-time state machine that
//!   re-synchronizes on the header and validates checksums.
//! - **Exchange helpers** ([`dispatch`]) -- drain, send, and bounded wait for
//!   a reply.
//! - **ServoBus** ([`bus`]) -- the command surface tying the above to a
//!   [`Transport`](lobot_core::Transport).
//! - **ServoBusBuilder** ([`builder`]) -- fluent construction with serial and
//!   timing settings.
//!
//! # Example
//!
//! ```
//! use lobot_bus::commands::encode_read_position;
//! use lobot_bus::frame::encode_frame;
//! use lobot_bus::receiver::{FrameReceiver, FrameResult};
//!
//! // Position query for servo 1
//! assert_eq!(encode_read_position(1), vec![0xFF, 0xFF, 0x01, 0x03, 0x1C, 0xDF]);
//!
//! // Decode a reply carrying position 500
//! let reply = encode_frame(1, 28, &[0xF4, 0x01]);
//! let mut rx = FrameReceiver::new();
//! let result = reply.iter().find_map(|&b| rx.push(b));
//! if let Some(FrameResult::Frame(frame)) = result {
//!     assert_eq!(frame.payload_u16(), Some(500));
//! }
//! ```

pub mod builder;
pub mod bus;
pub mod commands;
pub mod dispatch;
pub mod frame;
pub mod receiver;

pub use builder::ServoBusBuilder;
pub use bus::ServoBus;
pub use dispatch::ExchangeConfig;
pub use frame::ServoFrame;
pub use receiver::{FrameReceiver, FrameResult};
