//! Connection coordinator: the caller-facing session-keyed API.
//!
//! [`SocketManager::spawn`] starts the transport worker and an event
//! dispatch task, returning a cheap-to-clone handle. No global singleton —
//! callers own the instance and pass it where needed, so tests run as many
//! independent transports as they like.
//!
//! All methods except [`SocketManager::create_connection`] are
//! fire-and-forget: effects are observed through subsequently delivered
//! events, and `Close` event delivery (not the `close_connection` return)
//! is the authoritative signal that resources were released.

use std::sync::Arc;

use chatwire_core::{
    EventHandler, EventKind, SessionEvent, SessionKey, TransportConfig, TransportError,
};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::eviction::{EvictionPolicy, OldestFirst};
use crate::protocol::{WorkerEvent, WorkerRequest};
use crate::registry::ListenerRegistry;
use crate::worker::Worker;

/// Handle to one transport instance. Cloning shares the same worker and
/// listener registry.
#[derive(Clone)]
pub struct SocketManager {
    requests: mpsc::UnboundedSender<WorkerRequest>,
    registry: Arc<Mutex<ListenerRegistry>>,
}

impl SocketManager {
    /// Spawn a transport with the default oldest-first eviction policy.
    pub fn spawn(config: TransportConfig) -> Self {
        Self::spawn_with_policy(config, Box::new(OldestFirst))
    }

    /// Spawn a transport with a caller-supplied eviction policy.
    pub fn spawn_with_policy(config: TransportConfig, policy: Box<dyn EvictionPolicy>) -> Self {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(config.event_buffer);
        let registry = Arc::new(Mutex::new(ListenerRegistry::new()));

        drop(tokio::spawn(
            Worker::new(request_rx, event_tx, config, policy).run(),
        ));
        drop(tokio::spawn(dispatch_loop(
            event_rx,
            Arc::clone(&registry),
        )));

        Self {
            requests: request_tx,
            registry,
        }
    }

    /// Open a connection for `session` owned by `user_id`.
    ///
    /// Resolves `Ok(false)` when a live connection already exists for the
    /// key (idempotent no-op, not an error), `Ok(true)` once the socket is
    /// open, `Err` on a failed or timed-out open. Lazily initializes the
    /// session's listener registry, so `on` before and after create both
    /// work.
    pub async fn create_connection(
        &self,
        session: SessionKey,
        user_id: &str,
        token: Option<&str>,
        preset_id: Option<&str>,
        endpoint: &str,
    ) -> Result<bool, TransportError> {
        if session.is_empty() {
            return Err(TransportError::InvalidArgument("session key is empty"));
        }
        if user_id.is_empty() {
            return Err(TransportError::InvalidArgument("user id is empty"));
        }

        self.registry.lock().ensure(&session);

        // Round trip: does the worker already hold a live connection?
        let (check_tx, check_rx) = oneshot::channel();
        self.post(WorkerRequest::Check {
            session: session.clone(),
            reply: check_tx,
        })?;
        if check_rx.await.map_err(|_| TransportError::ChannelClosed)? {
            debug!(session = %session, "connection already exists, skipping create");
            return Ok(false);
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        self.post(WorkerRequest::Create {
            session,
            user_id: user_id.to_owned(),
            token: token.map(str::to_owned),
            preset_id: preset_id.map(str::to_owned),
            endpoint: endpoint.to_owned(),
            reply: reply_tx,
        })?;
        reply_rx.await.map_err(|_| TransportError::ChannelClosed)?
    }

    /// Forward a JSON payload to the session's socket. Fire-and-forget: if
    /// the socket is not open, the failure arrives as an `Error` event.
    pub fn send_message(&self, session: &SessionKey, payload: Value) {
        if self
            .post(WorkerRequest::Send {
                session: session.clone(),
                payload,
            })
            .is_err()
        {
            warn!(session = %session, "send dropped: transport worker is gone");
        }
    }

    /// Close the session's connection and drop its listener registry
    /// immediately (without waiting for the worker). The worker still emits
    /// `Close`, but with the registry gone it dispatches to nobody.
    pub fn close_connection(&self, session: &SessionKey) {
        let _ = self.registry.lock().remove(session);
        if self
            .post(WorkerRequest::Close {
                session: session.clone(),
            })
            .is_err()
        {
            warn!(session = %session, "close dropped: transport worker is gone");
        }
    }

    /// Register a listener for one event kind. Creates the session's
    /// registry when absent, so listeners may be registered before the
    /// create request is acknowledged. Registering the same handler twice
    /// is a no-op.
    pub fn on(&self, session: &SessionKey, kind: EventKind, handler: EventHandler) {
        let _ = self.registry.lock().on(session, kind, handler);
    }

    /// Remove a listener previously registered with [`SocketManager::on`].
    /// Matches by handler identity.
    pub fn off(&self, session: &SessionKey, kind: EventKind, handler: &EventHandler) {
        let _ = self.registry.lock().off(session, kind, handler);
    }

    /// Promote a session to a new key (temporary → server-assigned id).
    ///
    /// Moves the local listener registry synchronously — best-effort: when
    /// no registry exists under `old` this does nothing locally — and posts
    /// the rename to the worker, which re-keys the connection without
    /// dropping the socket.
    pub fn update_connection_id(&self, old: &SessionKey, new: &SessionKey) {
        if let Some(counts) = self.registry.lock().rename(old, new) {
            for (kind, count) in counts {
                if count > 0 {
                    debug!(old = %old, new = %new, ?kind, count, "transferring handlers");
                }
            }
        }
        if self
            .post(WorkerRequest::Rename {
                old: old.clone(),
                new: new.clone(),
            })
            .is_err()
        {
            warn!(old = %old, new = %new, "rename dropped: transport worker is gone");
        }
    }

    fn post(&self, request: WorkerRequest) -> Result<(), TransportError> {
        self.requests
            .send(request)
            .map_err(|_| TransportError::ChannelClosed)
    }
}

/// Forward worker events to registered listeners.
///
/// Handlers are snapshotted out of the registry before invocation so a
/// listener may call back into the manager (`on`, `off`, `send_message`)
/// without deadlocking. `Open` and `IdUpdated` are log-only; a socket-level
/// `Close` deletes the session's registry after dispatch, so listeners
/// observe the close exactly once.
async fn dispatch_loop(
    mut events: mpsc::Receiver<WorkerEvent>,
    registry: Arc<Mutex<ListenerRegistry>>,
) {
    while let Some(event) = events.recv().await {
        match event {
            WorkerEvent::Message { session, payload } => {
                dispatch(&registry, &session, &SessionEvent::Message(payload));
            }
            WorkerEvent::Error { session, error } => {
                warn!(session = %session, %error, "transport error");
                dispatch(&registry, &session, &SessionEvent::Error(error));
            }
            WorkerEvent::Close { session } => {
                dispatch(&registry, &session, &SessionEvent::Close);
                let _ = registry.lock().remove(&session);
            }
            WorkerEvent::Open { session } => {
                info!(session = %session, "connection open");
            }
            WorkerEvent::IdUpdated { old, new } => {
                debug!(old = %old, new = %new, "connection id updated");
            }
        }
    }
}

fn dispatch(registry: &Mutex<ListenerRegistry>, session: &SessionKey, event: &SessionEvent) {
    let handlers = registry.lock().handlers_for(session, event.kind());
    for handler in handlers {
        handler(event);
    }
}
