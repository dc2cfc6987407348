//! Transport errors.
//!
//! Only `create_connection` returns an error to the caller; every other
//! failure crosses the worker boundary as a [`crate::SessionEvent::Error`]
//! event, because a message channel cannot propagate exceptions.

use crate::keys::SessionKey;

/// Errors surfaced from the transport's awaitable operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// A required argument was empty or malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The socket did not reach the open state within the configured window.
    #[error("connection timeout for session {0}")]
    ConnectTimeout(SessionKey),

    /// The handshake failed before the socket opened.
    #[error("failed to connect session {session}: {reason}")]
    ConnectFailed {
        /// Session whose open attempt failed.
        session: SessionKey,
        /// Handshake failure description.
        reason: String,
    },

    /// The transport worker task is gone; the manager is unusable.
    #[error("transport worker unavailable")]
    ChannelClosed,
}
