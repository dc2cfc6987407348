//! Typed outbound frames for the backend chat protocol.
//!
//! The socket accepts arbitrary JSON, but well-behaved callers send one of
//! two shapes: a chat request (prompt plus model/sampling options) or a stop
//! request that halts generation. Optional sampling fields serialize only
//! when set.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Model used when the caller does not pick one.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Outbound chat request: `{"type":"chat", ...}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Frame discriminator, always `"chat"`.
    #[serde(rename = "type")]
    pub message_type: String,
    /// Prompt content.
    pub content: String,
    /// Model identifier.
    pub model: String,
    /// How many prior turns of context the backend should include.
    pub context: u32,
    /// Whether the backend may use web search.
    #[serde(rename = "enableWeb")]
    pub enable_web: bool,
    /// Token cap for the response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Nucleus sampling cutoff.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Top-k sampling cutoff.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// Presence penalty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    /// Frequency penalty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    /// Repetition penalty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repetition_penalty: Option<f32>,
}

impl ChatRequest {
    /// New request with the default model, single-turn context, web off.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            message_type: "chat".to_owned(),
            content: content.into(),
            model: DEFAULT_MODEL.to_owned(),
            context: 1,
            enable_web: false,
            max_tokens: None,
            temperature: None,
            top_p: None,
            top_k: None,
            presence_penalty: None,
            frequency_penalty: None,
            repetition_penalty: None,
        }
    }

    /// Set the model.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the context window (prior turns).
    #[must_use]
    pub fn context(mut self, context: u32) -> Self {
        self.context = context;
        self
    }

    /// Enable or disable web search.
    #[must_use]
    pub fn enable_web(mut self, enable: bool) -> Self {
        self.enable_web = enable;
        self
    }

    /// Cap the response token count.
    #[must_use]
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the sampling temperature.
    #[must_use]
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Convert to the JSON value `send_message` forwards to the socket.
    pub fn into_value(self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Outbound stop request: `{"type":"stop"}` — halts generation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StopRequest {
    /// Frame discriminator, always `"stop"`.
    #[serde(rename = "type")]
    pub message_type: String,
}

impl StopRequest {
    /// New stop request.
    pub fn new() -> Self {
        Self {
            message_type: "stop".to_owned(),
        }
    }

    /// Convert to the JSON value `send_message` forwards to the socket.
    pub fn into_value(self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
