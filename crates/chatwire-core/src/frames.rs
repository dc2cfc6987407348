//! Inbound wire frames and streamed-fragment accumulation.
//!
//! Every inbound socket frame is JSON. A frame carrying a `conversationId`
//! field is a streamed token fragment of the in-flight model response;
//! anything else passes through to listeners verbatim. Fragments accumulate
//! in a [`PartialMessage`] until one arrives with `end: true`, at which
//! point the buffers are drained into a complete message.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::keys::SessionKey;

/// One streamed piece of a model-generated response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    /// Conversation this fragment belongs to (normalized to string form).
    #[serde(rename = "conversationId")]
    pub conversation_id: SessionKey,
    /// Content increment. Absent on the wire means empty.
    #[serde(default)]
    pub content: String,
    /// Reasoning/thought-process increment.
    #[serde(default)]
    pub reasoning_content: String,
    /// Terminator flag — `true` on the final fragment of a response.
    #[serde(default)]
    pub end: bool,
}

/// A parsed inbound frame.
#[derive(Clone, Debug, PartialEq)]
pub enum InboundFrame {
    /// Streamed token fragment (frame carried a `conversationId`).
    Fragment(Fragment),
    /// Opaque payload forwarded to listeners as-is.
    Raw(Value),
}

impl InboundFrame {
    /// Parse one inbound text frame.
    ///
    /// Errors only on non-JSON input; callers surface that as a generic
    /// parse error without the detail (transport internals stay private).
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;
        let Some(id) = value.get("conversationId").and_then(SessionKey::from_wire) else {
            return Ok(Self::Raw(value));
        };
        let content = value
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        let reasoning_content = value
            .get("reasoning_content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        let end = value.get("end").and_then(Value::as_bool).unwrap_or(false);
        Ok(Self::Fragment(Fragment {
            conversation_id: id,
            content,
            reasoning_content,
            end,
        }))
    }
}

/// In-progress accumulation of streamed fragments.
///
/// Both buffers reset to empty exactly when the terminal fragment is
/// drained via [`PartialMessage::take`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PartialMessage {
    /// Accumulated content so far.
    pub content: String,
    /// Accumulated reasoning/thought-process so far.
    pub reasoning_content: String,
}

impl PartialMessage {
    /// Append a fragment's increments to the buffers.
    pub fn absorb(&mut self, fragment: &Fragment) {
        self.content.push_str(&fragment.content);
        self.reasoning_content.push_str(&fragment.reasoning_content);
    }

    /// Drain the accumulated buffers, resetting them to empty.
    pub fn take(&mut self) -> (String, String) {
        (
            std::mem::take(&mut self.content),
            std::mem::take(&mut self.reasoning_content),
        )
    }

    /// Whether nothing has accumulated.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty() && self.reasoning_content.is_empty()
    }
}
