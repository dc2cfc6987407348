//! Per-user connection budget eviction.
//!
//! When a user hits their connection ceiling, the worker asks the policy
//! which live connection to close before creating the new one. The default
//! closes the oldest by creation time (ties arbitrary); tests inject
//! alternative policies.

use std::time::Instant;

use chatwire_core::SessionKey;

/// One of the user's live connections, offered to the policy.
#[derive(Clone, Debug)]
pub struct EvictionCandidate {
    /// Session key owning the connection.
    pub session: SessionKey,
    /// When the connection was created.
    pub created_at: Instant,
}

/// Strategy choosing which connection to close when the per-user ceiling is
/// reached. `candidates` holds every live connection owned by the user at
/// the ceiling; returning `None` skips eviction (the new connection is
/// created anyway, exceeding the ceiling — policies normally never do this).
pub trait EvictionPolicy: Send + Sync + 'static {
    /// Pick the victim.
    fn select_victim(&self, candidates: &[EvictionCandidate]) -> Option<SessionKey>;
}

/// Default policy: evict the connection created earliest.
#[derive(Clone, Copy, Debug, Default)]
pub struct OldestFirst;

impl EvictionPolicy for OldestFirst {
    fn select_victim(&self, candidates: &[EvictionCandidate]) -> Option<SessionKey> {
        candidates
            .iter()
            .min_by_key(|c| c.created_at)
            .map(|c| c.session.clone())
    }
}
