//! ServoBus -- command surface for a chain of Lobot bus servos.
//!
//! A [`ServoBus`] owns the transport for one physical bus line. Every
//! operation takes `&mut self`, so exchanges never interleave.
//!
//! Writes are fire-and-forget: the servo does not acknowledge them and the
//! call returns as soon as the frame is on the wire. Reads send a query and
//! wait a bounded time for the reply. Two flavors are offered:
//!
//! - [`query_position`](ServoBus::query_position) /
//!   [`query_vin`](ServoBus::query_vin) return `Result<i16>` and say why a
//!   read failed.
//! - [`read_position`](ServoBus::read_position) /
//!   [`read_vin`](ServoBus::read_vin) return the value or a sentinel
//!   ([`POSITION_READ_FAILED`], [`VIN_READ_FAILED`]).

use tracing::{debug, warn};

use lobot_core::error::Result;
use lobot_core::transport::Transport;
use lobot_core::types::{POSITION_READ_FAILED, ServoMode, VIN_READ_FAILED};

use crate::commands;
use crate::dispatch::{self, ExchangeConfig};
use crate::frame::ServoFrame;

/// A servo bus driven over a single [`Transport`].
pub struct ServoBus {
    transport: Box<dyn Transport>,
    config: ExchangeConfig,
}

impl std::fmt::Debug for ServoBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServoBus")
            .field("connected", &self.transport.is_connected())
            .field("config", &self.config)
            .finish()
    }
}

impl ServoBus {
    /// Wrap an already-open transport.
    ///
    /// Most callers should go through
    /// [`ServoBusBuilder`](crate::builder::ServoBusBuilder) instead.
    pub fn new(transport: Box<dyn Transport>, config: ExchangeConfig) -> Self {
        ServoBus { transport, config }
    }

    /// Timing parameters used for queries.
    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    /// Whether the underlying transport is still usable.
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    // -----------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------

    /// Move servo `id` to `position` over `time_ms` milliseconds.
    ///
    /// `position` is clamped to 0..=1000 before encoding.
    pub async fn move_to(&mut self, id: u8, position: i16, time_ms: u16) -> Result<()> {
        debug!(id, position, time_ms, "move");
        self.send(&commands::encode_move(id, position, time_ms)).await
    }

    /// Stop servo `id` where it is.
    pub async fn stop_move(&mut self, id: u8) -> Result<()> {
        debug!(id, "stop");
        self.send(&commands::encode_stop(id)).await
    }

    /// Reassign the address of the servo currently at `old_id`.
    ///
    /// Both ids go on the wire unchanged; range checks are up to the caller.
    pub async fn set_id(&mut self, old_id: u8, new_id: u8) -> Result<()> {
        debug!(old_id, new_id, "set id");
        self.send(&commands::encode_set_id(old_id, new_id)).await
    }

    /// Write the raw mode byte and motor speed.
    ///
    /// See [`ServoMode`] for the known mode values; `speed` is only used in
    /// motor mode.
    pub async fn set_mode(&mut self, id: u8, mode: u8, speed: i16) -> Result<()> {
        debug!(id, mode, speed, "set mode");
        self.send(&commands::encode_set_mode(id, mode, speed)).await
    }

    /// Put servo `id` into position mode.
    pub async fn set_servo_mode(&mut self, id: u8) -> Result<()> {
        self.set_mode(id, ServoMode::Position.as_byte(), 0).await
    }

    /// Spin servo `id` continuously at `speed` (motor mode).
    pub async fn run(&mut self, id: u8, speed: i16) -> Result<()> {
        debug!(id, speed, "run");
        self.send(&commands::encode_run(id, speed)).await
    }

    /// Energize the motor of servo `id` so it holds position.
    pub async fn load(&mut self, id: u8) -> Result<()> {
        debug!(id, "load");
        self.send(&commands::encode_load(id, true)).await
    }

    /// Release the motor of servo `id` so it can be moved by hand.
    pub async fn unload(&mut self, id: u8) -> Result<()> {
        debug!(id, "unload");
        self.send(&commands::encode_load(id, false)).await
    }

    // -----------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------

    /// Read the current position of servo `id`.
    pub async fn query_position(&mut self, id: u8) -> Result<i16> {
        let reply = self.query(id, &commands::encode_read_position(id)).await?;
        commands::parse_position_reply(&reply)
    }

    /// Read the supply voltage of servo `id` in millivolts.
    pub async fn query_vin(&mut self, id: u8) -> Result<i16> {
        let reply = self.query(id, &commands::encode_read_vin(id)).await?;
        commands::parse_vin_reply(&reply)
    }

    /// Read the current position, or [`POSITION_READ_FAILED`] (-1) on any
    /// failure.
    pub async fn read_position(&mut self, id: u8) -> i16 {
        match self.query_position(id).await {
            Ok(position) => position,
            Err(e) => {
                debug!(id, error = %e, "position read failed");
                POSITION_READ_FAILED
            }
        }
    }

    /// Read the supply voltage, or [`VIN_READ_FAILED`] (-2048) on any
    /// failure.
    pub async fn read_vin(&mut self, id: u8) -> i16 {
        match self.query_vin(id).await {
            Ok(vin) => vin,
            Err(e) => {
                debug!(id, error = %e, "voltage read failed");
                VIN_READ_FAILED
            }
        }
    }

    // -----------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------

    /// Close the underlying transport.
    pub async fn close(&mut self) -> Result<()> {
        self.transport.close().await
    }

    /// Give back the transport, e.g. to inspect a mock after a test.
    pub fn into_transport(self) -> Box<dyn Transport> {
        self.transport
    }

    async fn send(&mut self, frame: &[u8]) -> Result<()> {
        dispatch::execute_command(&mut *self.transport, frame)
            .await
            .inspect_err(|e| warn!(error = %e, "bus write failed"))
    }

    async fn query(&mut self, id: u8, frame: &[u8]) -> Result<ServoFrame> {
        let reply = dispatch::execute_query(&mut *self.transport, frame, &self.config).await?;
        if reply.id != id {
            debug!(expected = id, got = reply.id, "reply from unexpected servo id");
        }
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{CMD_POS_READ, CMD_VIN_READ};
    use crate::frame::encode_frame;
    use lobot_core::error::Error;
    use lobot_core::types::BROADCAST_ID;
    use lobot_test_harness::MockTransport;
    use std::time::Duration;

    fn fast_config() -> ExchangeConfig {
        ExchangeConfig {
            response_timeout: Duration::from_millis(5),
            poll_interval: Duration::from_millis(1),
            inter_byte_delay: Duration::ZERO,
        }
    }

    fn bus_with(mock: MockTransport) -> ServoBus {
        ServoBus::new(Box::new(mock), fast_config())
    }

    // ---------------------------------------------------------------
    // Writes
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn move_to_sends_move_frame() {
        let mut mock = MockTransport::new();
        mock.expect(
            &[0xFF, 0xFF, 0x01, 0x07, 0x01, 0x2C, 0x01, 0xF4, 0x01, 0xD4],
            &[],
        );
        let mut bus = bus_with(mock);
        bus.move_to(1, 300, 500).await.unwrap();
    }

    #[tokio::test]
    async fn move_to_clamps_position() {
        let mut mock = MockTransport::new();
        mock.expect(&commands::encode_move(2, 1000, 100), &[]);
        mock.expect(&commands::encode_move(2, 0, 100), &[]);
        let mut bus = bus_with(mock);
        bus.move_to(2, 1500, 100).await.unwrap();
        bus.move_to(2, -50, 100).await.unwrap();
    }

    #[tokio::test]
    async fn stop_and_load_frames() {
        let mut mock = MockTransport::new();
        mock.expect(&[0xFF, 0xFF, 0x01, 0x03, 0x0C, 0xEF], &[]);
        mock.expect(&[0xFF, 0xFF, 0x01, 0x04, 0x1F, 0x01, 0xDA], &[]);
        mock.expect(&[0xFF, 0xFF, 0x01, 0x04, 0x1F, 0x00, 0xDB], &[]);
        let mut bus = bus_with(mock);
        bus.stop_move(1).await.unwrap();
        bus.load(1).await.unwrap();
        bus.unload(1).await.unwrap();
    }

    #[tokio::test]
    async fn set_id_frame() {
        let mut mock = MockTransport::new();
        mock.expect(&[0xFF, 0xFF, 0x01, 0x04, 0x0D, 0x07, 0xE6], &[]);
        let mut bus = bus_with(mock);
        bus.set_id(1, 7).await.unwrap();
    }

    #[tokio::test]
    async fn set_id_sends_any_id_unchanged() {
        let mut mock = MockTransport::new();
        mock.expect(&commands::encode_set_id(1, BROADCAST_ID), &[]);
        mock.expect(&commands::encode_set_id(BROADCAST_ID, 9), &[]);
        let mut bus = bus_with(mock);
        bus.set_id(1, BROADCAST_ID).await.unwrap();
        bus.set_id(BROADCAST_ID, 9).await.unwrap();
    }

    #[tokio::test]
    async fn mode_and_run_frames() {
        let mut mock = MockTransport::new();
        mock.expect(&commands::encode_set_mode(3, 1, -500), &[]);
        mock.expect(&commands::encode_set_mode(3, 1, 250), &[]);
        mock.expect(&commands::encode_set_mode(3, 0, 0), &[]);
        let mut bus = bus_with(mock);
        bus.set_mode(3, 1, -500).await.unwrap();
        bus.run(3, 250).await.unwrap();
        bus.set_servo_mode(3).await.unwrap();
    }

    #[tokio::test]
    async fn writes_do_not_wait_for_reply() {
        let mut bus = ServoBus::new(
            Box::new(MockTransport::lenient()),
            ExchangeConfig {
                response_timeout: Duration::from_secs(60),
                ..fast_config()
            },
        );
        tokio::time::timeout(Duration::from_secs(1), bus.move_to(1, 500, 0))
            .await
            .expect("write must not wait for a reply")
            .unwrap();
    }

    #[tokio::test]
    async fn write_surfaces_transport_failure() {
        let mut mock = MockTransport::new();
        mock.set_connected(false);
        let mut bus = bus_with(mock);
        assert!(matches!(bus.stop_move(1).await, Err(Error::NotConnected)));
    }

    // ---------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn read_position_decodes_reply() {
        let mut mock = MockTransport::new();
        mock.expect(
            &commands::encode_read_position(1),
            &encode_frame(1, CMD_POS_READ, &[0xF4, 0x01]),
        );
        let mut bus = bus_with(mock);
        assert_eq!(bus.read_position(1).await, 500);
    }

    #[tokio::test]
    async fn read_position_timeout_is_sentinel() {
        let mut mock = MockTransport::new();
        mock.expect(&commands::encode_read_position(1), &[]);
        let mut bus = bus_with(mock);
        assert_eq!(bus.read_position(1).await, POSITION_READ_FAILED);
    }

    #[tokio::test]
    async fn query_position_timeout_is_error() {
        let mut mock = MockTransport::new();
        mock.expect(&commands::encode_read_position(1), &[]);
        let mut bus = bus_with(mock);
        assert!(matches!(bus.query_position(1).await, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn read_position_checksum_error_is_sentinel() {
        let mut mock = MockTransport::new();
        let mut reply = encode_frame(1, CMD_POS_READ, &[0xF4, 0x01]);
        *reply.last_mut().unwrap() ^= 0x01;
        mock.expect(&commands::encode_read_position(1), &reply);
        let mut bus = bus_with(mock);
        assert_eq!(bus.read_position(1).await, POSITION_READ_FAILED);
    }

    #[tokio::test]
    async fn query_position_wrong_command_is_protocol_error() {
        let mut mock = MockTransport::new();
        mock.expect(
            &commands::encode_read_position(1),
            &encode_frame(1, CMD_VIN_READ, &[0xF4, 0x01]),
        );
        let mut bus = bus_with(mock);
        assert!(matches!(bus.query_position(1).await, Err(Error::Protocol(_))));
    }

    #[tokio::test]
    async fn query_position_short_payload_is_protocol_error() {
        let mut mock = MockTransport::new();
        mock.expect(
            &commands::encode_read_position(1),
            &encode_frame(1, CMD_POS_READ, &[0xF4]),
        );
        let mut bus = bus_with(mock);
        assert!(matches!(bus.query_position(1).await, Err(Error::Protocol(_))));
    }

    #[tokio::test]
    async fn broadcast_id_is_queried_like_any_other() {
        let mut mock = MockTransport::new();
        mock.expect(
            &commands::encode_read_position(BROADCAST_ID),
            &encode_frame(BROADCAST_ID, CMD_POS_READ, &[0x2C, 0x01]),
        );
        mock.expect(
            &commands::encode_read_vin(BROADCAST_ID),
            &encode_frame(BROADCAST_ID, CMD_VIN_READ, &[0xE8, 0x1C]),
        );
        let mut bus = bus_with(mock);
        assert_eq!(bus.read_position(BROADCAST_ID).await, 300);
        assert_eq!(bus.query_vin(BROADCAST_ID).await.unwrap(), 7400);
    }

    #[tokio::test]
    async fn read_vin_decodes_millivolts() {
        let mut mock = MockTransport::new();
        // 7400 mV = 0x1CE8
        mock.expect(
            &commands::encode_read_vin(4),
            &encode_frame(4, CMD_VIN_READ, &[0xE8, 0x1C]),
        );
        let mut bus = bus_with(mock);
        assert_eq!(bus.read_vin(4).await, 7400);
    }

    #[tokio::test]
    async fn read_vin_signed_value() {
        let mut mock = MockTransport::new();
        mock.expect(
            &commands::encode_read_vin(4),
            &encode_frame(4, CMD_VIN_READ, &[0xF6, 0xFF]),
        );
        let mut bus = bus_with(mock);
        assert_eq!(bus.query_vin(4).await.unwrap(), -10);
    }

    #[tokio::test]
    async fn read_vin_timeout_is_sentinel() {
        let mut mock = MockTransport::new();
        mock.expect(&commands::encode_read_vin(4), &[]);
        let mut bus = bus_with(mock);
        assert_eq!(bus.read_vin(4).await, VIN_READ_FAILED);
    }

    #[tokio::test]
    async fn read_on_closed_transport_is_sentinel() {
        let mut bus = bus_with(MockTransport::new());
        bus.close().await.unwrap();
        assert!(!bus.is_connected());
        assert_eq!(bus.read_position(1).await, POSITION_READ_FAILED);
    }

    #[tokio::test]
    async fn read_skips_stale_noise() {
        let mut mock = MockTransport::new();
        mock.inject(&[0xFF, 0x00, 0x13]);
        mock.expect(
            &commands::encode_read_position(2),
            &encode_frame(2, CMD_POS_READ, &[0x00, 0x00]),
        );
        let mut bus = bus_with(mock);
        assert_eq!(bus.read_position(2).await, 0);
    }
}
