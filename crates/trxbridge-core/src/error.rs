//! Error types for the transceiver bridge.
//!
//! All fallible device operations return [`Result<T>`], which uses [`Error`]
//! as the error type. The driver and the PTY bridge absorb these errors at
//! their own boundary: a failed open, read, write, or control-line access is
//! logged and turned into a reopen with backoff, so nothing here ever reaches
//! the event loop.

/// The error type for device and protocol operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A transport-level error (serial port or PTY could not be used).
    #[error("transport error: {0}")]
    Transport(String),

    /// A protocol-level error (unsupported request, malformed command).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Timed out waiting for data.
    ///
    /// This is the normal outcome of a bounded read on an idle connection.
    #[error("timeout waiting for data")]
    Timeout,

    /// The requested operation is not supported by this device.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// An invalid parameter was passed to a device command.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// No connection to the device is held.
    #[error("not connected")]
    NotConnected,

    /// The connection to the device was lost unexpectedly.
    #[error("connection lost")]
    ConnectionLost,

    /// The peer closed its end of the connection (zero-length read).
    #[error("peer disconnected")]
    PeerDisconnected,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error means the connection must be torn down and
    /// reopened after a backoff period.
    ///
    /// Timeouts and protocol-level warnings leave the connection alone.
    pub fn is_connection_error(&self) -> bool {
        !matches!(
            self,
            Error::Timeout
                | Error::Protocol(_)
                | Error::Unsupported(_)
                | Error::InvalidParameter(_)
        )
    }
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
        let e = Error::Protocol("unsupported modulation AM".into());
        assert_eq!(e.to_string(), "protocol error: unsupported modulation AM");
    }

    #[test]
    fn error_display_timeout() {
        assert_eq!(Error::Timeout.to_string(), "timeout waiting for data");
    }

    #[test]
    fn error_display_peer_disconnected() {
        assert_eq!(Error::PeerDisconnected.to_string(), "peer disconnected");
    }

    #[test]
    fn error_display_not_connected() {
        assert_eq!(Error::NotConnected.to_string(), "not connected");
    }

    #[test]
    fn error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broken");
        let e: Error = io_err.into();
        assert!(matches!(e, Error::Io(_)));
        assert!(e.to_string().contains("pipe broken"));
    }

    #[test]
    fn connection_errors_are_classified() {
        assert!(Error::ConnectionLost.is_connection_error());
        assert!(Error::PeerDisconnected.is_connection_error());
        assert!(Error::NotConnected.is_connection_error());
        assert!(Error::Transport("gone".into()).is_connection_error());
        assert!(Error::Io(std::io::Error::other("eio")).is_connection_error());
    }

    #[test]
    fn warnings_are_not_connection_errors() {
        assert!(!Error::Timeout.is_connection_error());
        assert!(!Error::Protocol("bad".into()).is_connection_error());
        assert!(!Error::Unsupported("AM".into()).is_connection_error());
        assert!(!Error::InvalidParameter("0 Hz".into()).is_connection_error());
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
