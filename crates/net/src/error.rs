//! Relay error types

use std::io;

/// Relay result type
pub type Result<T> = std::result::Result<T, Error>;

/// Relay errors. Session-terminal values double as the disconnect
/// reason via their display text.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Ping timeout")]
    PingTimeout,

    #[error("Protocol desync: {0}")]
    Desync(String),

    /// Handshake failed; the rejection text already went out in an
    /// error frame (or intentionally did not, for silent vetoes).
    #[error("Handshake rejected: {0}")]
    Rejected(String),
}
