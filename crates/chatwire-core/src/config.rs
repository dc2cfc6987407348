//! Transport configuration.

use std::time::Duration;

/// Default ceiling on simultaneously open connections per owning user.
pub const DEFAULT_MAX_CONNECTIONS_PER_USER: usize = 5;

/// Default window for a socket to reach the open state.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default capacity of the worker → coordinator event channel.
pub const DEFAULT_EVENT_BUFFER: usize = 256;

/// Tunables for one transport instance.
#[derive(Clone, Debug)]
pub struct TransportConfig {
    /// Per-user connection budget; creating one past the ceiling evicts the
    /// policy's victim (oldest first by default).
    pub max_connections_per_user: usize,
    /// How long an open attempt (TCP + WebSocket handshake) may take before
    /// the pending create rejects.
    pub connect_timeout: Duration,
    /// Capacity of the event channel between worker and dispatch task.
    /// Events are never dropped; a full buffer applies backpressure to the
    /// worker, preserving per-session ordering.
    pub event_buffer: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_connections_per_user: DEFAULT_MAX_CONNECTIONS_PER_USER,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_policy() {
        let config = TransportConfig::default();
        assert_eq!(config.max_connections_per_user, 5);
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert!(config.event_buffer > 0);
    }
}
