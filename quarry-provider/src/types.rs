//! Provider-agnostic request/response types — the lingua franca every
//! backend (`quarry-provider-openai`, `-anthropic`, `-ollama`, `-granite`)
//! translates to and from at its own API boundary.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Who authored a message in a conversation sent to a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The system/instruction message, if the backend supports one.
    System,
    /// A user-authored message (the question, or a templated prompt).
    User,
    /// A model-authored message (prior turns in a conversation).
    Assistant,
}

/// One piece of a message's content. Kept to the one variant the
/// generation and embedding stages actually need — there is no
/// tool-calling in this pipeline, so no `ToolUse`/`ToolResult` variants.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ContentPart {
    /// Plain text.
    #[serde(rename = "text")]
    Text {
        /// The text.
        text: String,
    },
}

impl ContentPart {
    /// Construct a text part.
    pub fn text(s: impl Into<String>) -> Self {
        ContentPart::Text { text: s.into() }
    }

    /// Borrow the text, if this part is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentPart::Text { text } => Some(text),
        }
    }
}

/// A single message in a request sent to a provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderMessage {
    /// Who authored this message.
    pub role: Role,
    /// The message content, as one or more parts.
    pub content: Vec<ContentPart>,
}

impl ProviderMessage {
    /// A message with a single text part.
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: vec![ContentPart::text(text)],
        }
    }

    /// The concatenated text of every text part in this message.
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .filter_map(ContentPart::as_text)
            .collect::<Vec<_>>()
            .join("")
    }
}

/// A request to generate a completion from a chat-style model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// The model identifier, in the backend's own naming scheme.
    pub model: String,
    /// The conversation so far, oldest first.
    pub messages: Vec<ProviderMessage>,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature, when the backend supports it.
    pub temperature: Option<f32>,
    /// Top-k sampling cutoff, when the backend supports it.
    pub top_k: Option<u32>,
    /// Nucleus sampling cutoff, when the backend supports it.
    pub top_p: Option<f32>,
    /// Repetition penalty, when the backend supports it.
    pub repetition_penalty: Option<f32>,
    /// System/instruction text, for backends with a dedicated field.
    pub system: Option<String>,
    /// Backend-specific extras that don't fit the common shape.
    #[serde(default)]
    pub extra: serde_json::Value,
}

impl GenerateRequest {
    /// A request with just the required fields, sane defaults for the rest.
    pub fn new(model: impl Into<String>, messages: Vec<ProviderMessage>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            messages,
            max_tokens,
            temperature: None,
            top_k: None,
            top_p: None,
            repetition_penalty: None,
            system: None,
            extra: serde_json::Value::Null,
        }
    }

    /// A request built from a resolved [`crate::params::LlmParameters`]
    /// set, carrying every sampling knob through to the backend.
    pub fn from_llm_parameters(
        model: impl Into<String>,
        messages: Vec<ProviderMessage>,
        params: &crate::params::LlmParameters,
    ) -> Self {
        Self {
            model: model.into(),
            messages,
            max_tokens: params.max_new_tokens,
            temperature: Some(params.temperature),
            top_k: Some(params.top_k),
            top_p: Some(params.top_p),
            repetition_penalty: params.repetition_penalty,
            system: None,
            extra: serde_json::Value::Null,
        }
    }
}

/// Why the model stopped generating.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The model reached a natural stopping point.
    EndTurn,
    /// `max_tokens` was reached before the model finished.
    MaxTokens,
    /// The backend's content filter interrupted generation.
    ContentFilter,
}

/// Token counts for a single request/response pair.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens in the request (prompt + prior turns).
    pub input_tokens: u64,
    /// Tokens in the response.
    pub output_tokens: u64,
}

impl TokenUsage {
    /// Total tokens across input and output.
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

/// The result of a [`crate::provider::Provider::generate`] call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// The generated content.
    pub content: Vec<ContentPart>,
    /// Why generation stopped.
    pub stop_reason: StopReason,
    /// Token accounting for this call.
    pub usage: TokenUsage,
    /// The model that actually served the request (may differ from the
    /// requested model if the backend aliases/redirects).
    pub model: String,
    /// Estimated cost in USD, when the backend's pricing is known.
    pub cost: Decimal,
}

impl GenerateResponse {
    /// The concatenated text of every text part in the response.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(ContentPart::as_text)
            .collect::<Vec<_>>()
            .join("")
    }
}

/// A request to embed one or more strings into vectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedRequest {
    /// The embedding model identifier.
    pub model: String,
    /// Texts to embed, in order.
    pub input: Vec<String>,
}

impl EmbedRequest {
    /// A request to embed a single string.
    pub fn single(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            input: vec![text.into()],
        }
    }
}

/// The result of a [`crate::provider::Provider::embed`] call. `embeddings`
/// is ordered to match `EmbedRequest::input`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedResponse {
    /// One vector per input string, in the same order.
    pub embeddings: Vec<Vec<f32>>,
    /// The model that actually served the request.
    pub model: String,
    /// Token accounting for this call (output_tokens is always 0).
    pub usage: TokenUsage,
    /// Estimated cost in USD, when the backend's pricing is known.
    pub cost: Decimal,
}
