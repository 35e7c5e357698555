//! lobot-test-harness: Test utilities and mock transports for lobot.
//!
//! This crate provides [`MockTransport`] for deterministic unit testing of
//! the protocol engine without a servo bus attached.

pub mod mock_serial;

pub use mock_serial::MockTransport;
