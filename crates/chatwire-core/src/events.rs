//! Events delivered to registered session listeners.
//!
//! The transport worker reports everything as events; listeners subscribe
//! per session key and per [`EventKind`]. Handlers are plain closures held
//! behind `Arc` — registration and removal use pointer identity, so
//! registering the same handler twice is a no-op.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::keys::SessionKey;

/// The three listener-facing event kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Complete messages, stream updates, and raw passthrough frames.
    Message,
    /// Transport failures: open timeout, send-while-closed, parse errors.
    Error,
    /// Connection released (explicit close, remote close, or eviction).
    Close,
}

/// A fully reassembled model response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompleteMessage {
    /// Conversation the response belongs to.
    #[serde(rename = "conversationId")]
    pub conversation_id: SessionKey,
    /// Full accumulated content (the terminal fragment's increment included).
    pub content: String,
    /// Full accumulated reasoning.
    pub thought_process: String,
}

/// An in-flight stream update: the newest increment plus the accumulation so
/// far, so a late-attaching listener can always resync.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StreamUpdate {
    /// Conversation the response belongs to.
    #[serde(rename = "conversationId")]
    pub conversation_id: SessionKey,
    /// This fragment's content increment.
    pub content: String,
    /// This fragment's reasoning increment.
    pub reasoning_content: String,
    /// Accumulated content including this fragment.
    pub partial_content: String,
    /// Accumulated reasoning including this fragment.
    pub partial_reasoning: String,
}

/// Payload of a [`SessionEvent::Message`].
#[derive(Clone, Debug, PartialEq)]
pub enum MessagePayload {
    /// Terminal fragment arrived; buffers drained into the full response.
    Complete(CompleteMessage),
    /// Non-terminal fragment; incremental fields plus current accumulation.
    Stream(StreamUpdate),
    /// Frame without a conversation id, forwarded verbatim.
    Raw(Value),
}

impl MessagePayload {
    /// Render the payload in the wire shape downstream consumers expect:
    /// `{"type":"chat","data":{..}}` for complete messages,
    /// `{"type":"stream","data":{..}}` for stream updates, and the original
    /// frame unchanged for raw passthrough.
    pub fn to_wire(&self) -> Value {
        match self {
            Self::Complete(msg) => json!({"type": "chat", "data": msg}),
            Self::Stream(update) => json!({"type": "stream", "data": update}),
            Self::Raw(value) => value.clone(),
        }
    }
}

/// One event dispatched to a session's listeners.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    /// Inbound data for the session.
    Message(MessagePayload),
    /// A transport failure, described but never thrown.
    Error(String),
    /// The session's connection was released.
    Close,
}

impl SessionEvent {
    /// The listener set this event dispatches to.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Message(_) => EventKind::Message,
            Self::Error(_) => EventKind::Error,
            Self::Close => EventKind::Close,
        }
    }
}

/// A registered listener. Identity (the `Arc` pointer) is what `off`
/// matches on, so callers must keep the clone they registered with.
pub type EventHandler = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_wire_shape() {
        let payload = MessagePayload::Complete(CompleteMessage {
            conversation_id: SessionKey::from("42"),
            content: "abc".into(),
            thought_process: "xy".into(),
        });
        assert_eq!(
            payload.to_wire(),
            json!({
                "type": "chat",
                "data": {
                    "conversationId": "42",
                    "content": "abc",
                    "thought_process": "xy",
                }
            })
        );
    }

    #[test]
    fn stream_wire_shape() {
        let payload = MessagePayload::Stream(StreamUpdate {
            conversation_id: SessionKey::from("42"),
            content: "c".into(),
            reasoning_content: String::new(),
            partial_content: "abc".into(),
            partial_reasoning: String::new(),
        });
        let wire = payload.to_wire();
        assert_eq!(wire["type"], "stream");
        assert_eq!(wire["data"]["partial_content"], "abc");
        assert_eq!(wire["data"]["content"], "c");
    }

    #[test]
    fn raw_wire_shape_is_verbatim() {
        let original = json!({"kind": "notice", "n": 1});
        let payload = MessagePayload::Raw(original.clone());
        assert_eq!(payload.to_wire(), original);
    }

    #[test]
    fn event_kinds() {
        assert_eq!(
            SessionEvent::Message(MessagePayload::Raw(json!({}))).kind(),
            EventKind::Message
        );
        assert_eq!(SessionEvent::Error("x".into()).kind(), EventKind::Error);
        assert_eq!(SessionEvent::Close.kind(), EventKind::Close);
    }
}
