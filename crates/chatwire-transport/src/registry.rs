//! Per-session listener registry.
//!
//! One owned map from session key to three listener sets (message, error,
//! close). Set semantics use `Arc` pointer identity: registering the same
//! handler twice is a no-op, and `off` removes exactly the clone that was
//! registered. Renaming a session *moves* the entry, preserving handler
//! identity across the temporary → durable key transition.

use std::collections::HashMap;
use std::sync::Arc;

use chatwire_core::{EventHandler, EventKind, SessionKey};

/// Listener sets for one session.
#[derive(Default)]
pub(crate) struct EventRegistry {
    message: Vec<EventHandler>,
    error: Vec<EventHandler>,
    close: Vec<EventHandler>,
}

impl EventRegistry {
    fn set(&self, kind: EventKind) -> &Vec<EventHandler> {
        match kind {
            EventKind::Message => &self.message,
            EventKind::Error => &self.error,
            EventKind::Close => &self.close,
        }
    }

    fn set_mut(&mut self, kind: EventKind) -> &mut Vec<EventHandler> {
        match kind {
            EventKind::Message => &mut self.message,
            EventKind::Error => &mut self.error,
            EventKind::Close => &mut self.close,
        }
    }

    /// Handler counts per kind, for rename logging.
    pub(crate) fn counts(&self) -> [(EventKind, usize); 3] {
        [
            (EventKind::Message, self.message.len()),
            (EventKind::Error, self.error.len()),
            (EventKind::Close, self.close.len()),
        ]
    }
}

/// All sessions' listener registries. Mutated only on the coordinator side.
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    sessions: HashMap<SessionKey, EventRegistry>,
}

impl ListenerRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Lazily create the session's registry (on `create_connection` and on
    /// first `on`, so listeners can be registered before create resolves).
    pub(crate) fn ensure(&mut self, session: &SessionKey) {
        if !self.sessions.contains_key(session) {
            let _ = self.sessions.insert(session.clone(), EventRegistry::default());
        }
    }

    /// Register a handler. Returns `false` when the identical handler was
    /// already registered for this kind (set semantics).
    pub(crate) fn on(&mut self, session: &SessionKey, kind: EventKind, handler: EventHandler) -> bool {
        let registry = self.sessions.entry(session.clone()).or_default();
        let set = registry.set_mut(kind);
        if set.iter().any(|h| Arc::ptr_eq(h, &handler)) {
            return false;
        }
        set.push(handler);
        true
    }

    /// Remove a handler by identity. Returns whether anything was removed.
    pub(crate) fn off(&mut self, session: &SessionKey, kind: EventKind, handler: &EventHandler) -> bool {
        let Some(registry) = self.sessions.get_mut(session) else {
            return false;
        };
        let set = registry.set_mut(kind);
        let before = set.len();
        set.retain(|h| !Arc::ptr_eq(h, handler));
        set.len() != before
    }

    /// Drop the session's registry entirely.
    pub(crate) fn remove(&mut self, session: &SessionKey) -> bool {
        self.sessions.remove(session).is_some()
    }

    /// Move the entry from `old` to `new`, preserving handler identity.
    /// Returns the moved handler counts, or `None` when `old` had no entry
    /// (best-effort: the caller proceeds regardless).
    pub(crate) fn rename(
        &mut self,
        old: &SessionKey,
        new: &SessionKey,
    ) -> Option<[(EventKind, usize); 3]> {
        let registry = self.sessions.remove(old)?;
        let counts = registry.counts();
        let _ = self.sessions.insert(new.clone(), registry);
        Some(counts)
    }

    /// Snapshot the handlers for one session/kind. Cloned out so dispatch
    /// never runs listeners under the registry lock.
    pub(crate) fn handlers_for(&self, session: &SessionKey, kind: EventKind) -> Vec<EventHandler> {
        self.sessions
            .get(session)
            .map(|r| r.set(kind).clone())
            .unwrap_or_default()
    }
}
