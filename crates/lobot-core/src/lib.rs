//! lobot-core: Core traits, types, and error definitions for lobot.
//!
//! This crate defines the pieces every other lobot crate agrees on: the
//! byte-level [`Transport`] the protocol engine drives, the shared
//! [`Error`] type, and the value ranges of the servo bus.
//!
//! # Key types
//!
//! - [`Transport`] -- byte-level communication channel
//! - [`ServoMode`] -- position or continuous-rotation mode
//! - [`Error`] / [`Result`] -- error handling

pub mod error;
pub mod transport;
pub mod types;

pub use error::{Error, Result};
pub use transport::Transport;
pub use types::*;
