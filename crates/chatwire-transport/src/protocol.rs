//! Coordinator ↔ worker channel messages.
//!
//! Conceptual, not wire-stable: these never leave the process. Requests flow
//! coordinator → worker on an unbounded channel (fire-and-forget from the
//! caller's perspective); events flow back on a bounded
//! channel the dispatch task drains. Round-trip answers (`Check`, and the
//! create-resolves-on-open acknowledgment) ride oneshot channels carried
//! inside the request.

use chatwire_core::{MessagePayload, SessionKey, TransportError};
use serde_json::Value;
use tokio::sync::oneshot;

/// Coordinator → worker.
pub(crate) enum WorkerRequest {
    /// Open a connection for a session. The reply resolves `Ok(true)` once
    /// the socket is open, `Ok(false)` if the key is already live, `Err` on
    /// timeout or handshake failure.
    Create {
        session: SessionKey,
        user_id: String,
        token: Option<String>,
        preset_id: Option<String>,
        endpoint: String,
        reply: oneshot::Sender<Result<bool, TransportError>>,
    },
    /// Forward a JSON payload to the session's socket.
    Send { session: SessionKey, payload: Value },
    /// Close the session's connection.
    Close { session: SessionKey },
    /// Re-key a connection (temporary key promoted to a server-assigned id).
    Rename { old: SessionKey, new: SessionKey },
    /// Does a connection exist with an open socket?
    Check {
        session: SessionKey,
        reply: oneshot::Sender<bool>,
    },
}

/// Worker → coordinator.
pub(crate) enum WorkerEvent {
    /// Inbound data for a session.
    Message {
        session: SessionKey,
        payload: MessagePayload,
    },
    /// A worker-side failure, described but never thrown.
    Error { session: SessionKey, error: String },
    /// A connection was released.
    Close { session: SessionKey },
    /// A socket reached the open state (log-only at the coordinator).
    Open { session: SessionKey },
    /// Rename acknowledged (log-only at the coordinator).
    IdUpdated { old: SessionKey, new: SessionKey },
}
