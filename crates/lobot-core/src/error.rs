//! Error types for lobot.
//!
//! All fallible operations across the library return [`Result<T>`], which
//! uses [`Error`] as the error type. Transport-layer and protocol-layer
//! failures are both captured here.

/// The error type for all lobot operations.
///
/// Variants cover the failure modes seen on a half-duplex servo bus:
/// physical transport failures, corrupted or malformed reply frames,
/// and servos that never answer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A transport-level error (serial port open/configure failure).
    #[error("transport error: {0}")]
    Transport(String),

    /// A reply frame was well-formed but not what the request asked for.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Timed out waiting for the first byte of a reply.
    ///
    /// This typically indicates the servo is unpowered, the baud rate is
    /// wrong, or no servo answers to the requested ID.
    #[error("timeout waiting for response")]
    Timeout,

    /// A complete reply frame was received but its checksum did not match.
    #[error("checksum mismatch in reply frame")]
    Checksum,

    /// Reply bytes arrived but no complete frame could be assembled from them.
    #[error("no complete frame in reply")]
    NoFrame,

    /// An invalid parameter was passed to a command.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The transport has been closed or was never opened.
    #[error("not connected")]
    NotConnected,

    /// The connection to the bus adapter was lost unexpectedly.
    #[error("connection lost")]
    ConnectionLost,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_transport() {
        let e = Error::Transport("port busy".into());
        assert_eq!(e.to_string(), "transport error: port busy");
    }

    #[test]
    fn error_display_protocol() {
        let e = Error::Protocol("unexpected reply command 0x1A".into());
        assert_eq!(e.to_string(), "protocol error: unexpected reply command 0x1A");
    }

    #[test]
    fn error_display_timeout() {
        assert_eq!(Error::Timeout.to_string(), "timeout waiting for response");
    }

    #[test]
    fn error_display_checksum() {
        assert_eq!(Error::Checksum.to_string(), "checksum mismatch in reply frame");
    }

    #[test]
    fn error_display_no_frame() {
        assert_eq!(Error::NoFrame.to_string(), "no complete frame in reply");
    }

    #[test]
    fn error_display_invalid_parameter() {
        let e = Error::InvalidParameter("serial_port is required".into());
        assert_eq!(e.to_string(), "invalid parameter: serial_port is required");
    }

    #[test]
    fn error_display_not_connected() {
        assert_eq!(Error::NotConnected.to_string(), "not connected");
    }

    #[test]
    fn error_display_connection_lost() {
        assert_eq!(Error::ConnectionLost.to_string(), "connection lost");
    }

    #[test]
    fn error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broken");
        let e: Error = io_err.into();
        assert!(matches!(e, Error::Io(_)));
        assert!(e.to_string().contains("pipe broken"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn result_alias_works() {
        let ok: Result<u16> = Ok(512);
        assert_eq!(ok.unwrap(), 512);

        let err: Result<u16> = Err(Error::Timeout);
        assert!(err.is_err());
    }
}
