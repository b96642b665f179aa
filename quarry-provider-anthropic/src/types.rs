//! Anthropic Messages API request/response types.

use serde::{Deserialize, Serialize};

/// Anthropic Messages API request body.
#[derive(Debug, Serialize)]
pub struct AnthropicRequest {
    /// Model identifier.
    pub model: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Conversation messages.
    pub messages: Vec<AnthropicMessage>,
    /// Optional system prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Top-k sampling cutoff.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// Nucleus sampling cutoff.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Whether to stream the response as server-sent events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

/// A message in the Anthropic Messages API format.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnthropicMessage {
    /// Role: "user" or "assistant".
    pub role: String,
    /// Message text content.
    pub content: String,
}

/// Anthropic Messages API response body.
#[derive(Debug, Deserialize)]
pub struct AnthropicResponse {
    /// Response content blocks.
    pub content: Vec<AnthropicContentBlock>,
    /// Model that generated the response.
    pub model: String,
    /// Stop reason.
    pub stop_reason: String,
    /// Token usage.
    pub usage: AnthropicUsage,
}

/// A content block in an Anthropic response.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum AnthropicContentBlock {
    /// Text content.
    #[serde(rename = "text")]
    Text {
        /// The text content.
        text: String,
    },
}

/// Token usage from the Anthropic API.
#[derive(Debug, Deserialize)]
pub struct AnthropicUsage {
    /// Input tokens used.
    pub input_tokens: u64,
    /// Output tokens generated.
    pub output_tokens: u64,
}

/// One server-sent event from a streaming Messages API call. Anthropic
/// sends several event types (`message_start`, `content_block_start`,
/// `content_block_delta`, `message_delta`, `message_stop`); only
/// `content_block_delta` with a `text_delta` carries generated text.
#[derive(Debug, Deserialize)]
pub struct AnthropicStreamEvent {
    /// The event's type.
    #[serde(rename = "type")]
    pub event_type: String,
    /// The incremental delta, present on `content_block_delta` events.
    #[serde(default)]
    pub delta: Option<AnthropicStreamDelta>,
}

/// The `delta` payload of a `content_block_delta` stream event.
#[derive(Debug, Deserialize)]
pub struct AnthropicStreamDelta {
    /// The incremental text, present when `delta.type == "text_delta"`.
    #[serde(default)]
    pub text: Option<String>,
}
