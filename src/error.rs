//! Unified error handling for the basalt engine.

use thiserror::Error;

/// Errors raised by an active connection.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The watchdog detected a silent peer and force-closed the connection.
    #[error("ping timeout")]
    Timeout,

    /// The peer closed the connection.
    #[error("connection closed by peer")]
    Closed,

    /// A line failed to frame or decode.
    #[error("codec error: {0}")]
    Codec(#[from] basalt_proto::LineCodecError),

    /// An underlying I/O error, e.g. during connect.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors raised while registering with the server.
///
/// All of these are fatal to the current connection attempt only; the
/// supervisor decides whether to retry.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The server reported our nick as taken (numeric 433).
    #[error("nick already in use")]
    NickInUse,

    /// SASL authentication failed (numeric 904).
    #[error("SASL authentication failed")]
    SaslFailed,

    /// The connection died mid-handshake.
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}
