//! # lobot -- async control of Lobot bus servos
//!
//! `lobot` is an asynchronous Rust library for driving Lobot/HiWonder serial
//! bus servos. Up to 253 servos share one half-duplex data line; the host
//! addresses each one by ID to move it, stop it, switch it between position
//! and motor mode, and read back its position and supply voltage.
//!
//! ## Quick Start
//!
//! ```no_run
//! use lobot::ServoBusBuilder;
//!
//! #[tokio::main]
//! async fn main() -> lobot::Result<()> {
//!     let mut bus = ServoBusBuilder::new()
//!         .serial_port("/dev/ttyUSB0")
//!         .build()
//!         .await?;
//!
//!     bus.move_to(1, 500, 1000).await?;
//!     let position = bus.query_position(1).await?;
//!     println!("servo 1 at {position}");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! | Crate                 | Purpose                                          |
//! |-----------------------|--------------------------------------------------|
//! | `lobot-core`          | [`Transport`] trait, shared types, errors         |
//! | `lobot-transport`     | Serial port transport                            |
//! | `lobot-bus`           | Frame codec, receiver, [`ServoBus`]              |
//! | `lobot-test-harness`  | Mock transport for tests                         |
//! | **`lobot`**           | This facade crate -- re-exports everything       |
//!
//! ## Reads and failure sentinels
//!
//! Writes never wait for an answer. Reads come in two flavors:
//! [`ServoBus::query_position`] returns a `Result` that tells a timeout apart
//! from a corrupted reply, while [`ServoBus::read_position`] returns
//! [`POSITION_READ_FAILED`] on any failure (and likewise
//! [`VIN_READ_FAILED`] for voltage).

pub use lobot_core::*;

pub use lobot_bus::{ExchangeConfig, ServoBus, ServoBusBuilder};

/// Protocol engine: frame codec, commands, receiver, and exchange helpers.
pub mod bus {
    pub use lobot_bus::*;
}

/// Transport implementations.
pub mod transport {
    pub use lobot_transport::*;
}
