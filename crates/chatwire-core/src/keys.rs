//! Session keys.
//!
//! A session key identifies one logical conversation. Keys come in two
//! flavors:
//!
//! - **Temporary**: client-minted, `tmp-` prefixed. The conversation has not
//!   been persisted server-side yet; the remote endpoint receives the
//!   sentinel `-1` instead of the raw key and replies with a durable id.
//! - **Durable**: server-assigned, passed to the endpoint unchanged.
//!
//! Keys are canonically strings. The backend serializes conversation ids as
//! JSON numbers in some frames; [`SessionKey::from_wire`] normalizes both
//! representations to the decimal string form so lookups never diverge on
//! number-vs-string.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix marking a client-minted key not yet persisted server-side.
pub const TEMP_PREFIX: &str = "tmp-";

/// Sentinel sent in place of a temporary key, asking the remote endpoint to
/// allocate a durable id.
pub const SENTINEL_ID: &str = "-1";

/// Canonical string key for one logical conversation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionKey(String);

impl SessionKey {
    /// Create a key from any string-like value.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the key is empty (rejected at the transport boundary).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether this is a client-minted temporary key.
    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMP_PREFIX)
    }

    /// The value sent to the remote endpoint as the session-identifying
    /// query parameter: the sentinel for temporary keys, the key itself
    /// otherwise.
    pub fn wire_id(&self) -> &str {
        if self.is_temporary() { SENTINEL_ID } else { &self.0 }
    }

    /// Normalize a wire-side conversation id (JSON string or number) to a
    /// canonical key. Returns `None` for shapes that cannot identify a
    /// conversation (null, objects, arrays, bools).
    pub fn from_wire(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Some(Self(s.clone())),
            serde_json::Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SessionKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionKey {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}
