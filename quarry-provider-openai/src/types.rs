//! OpenAI Chat Completions and Embeddings API request/response types.

use serde::{Deserialize, Serialize};

/// OpenAI Chat Completions API request body.
#[derive(Debug, Serialize)]
pub struct OpenAIRequest {
    /// Model identifier (e.g. "gpt-4o-mini").
    pub model: String,
    /// Conversation messages.
    pub messages: Vec<OpenAIMessage>,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Nucleus sampling cutoff. OpenAI has no `top_k` parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Penalizes tokens already present, the closest analogue OpenAI
    /// exposes to a repetition penalty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    /// Whether to stream the response as server-sent events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

/// A message in the OpenAI Chat Completions API format.
#[derive(Debug, Serialize, Deserialize)]
pub struct OpenAIMessage {
    /// Role: "system", "user", or "assistant".
    pub role: String,
    /// Message text content.
    pub content: String,
}

/// OpenAI Chat Completions API response body.
#[derive(Debug, Deserialize)]
pub struct OpenAIResponse {
    /// Model that generated the response.
    pub model: String,
    /// Response choices.
    pub choices: Vec<OpenAIChoice>,
    /// Token usage statistics.
    pub usage: OpenAIUsage,
}

/// A single choice in the response.
#[derive(Debug, Deserialize)]
pub struct OpenAIChoice {
    /// The generated message.
    pub message: OpenAIMessage,
    /// Why generation stopped.
    pub finish_reason: String,
}

/// Token usage statistics from the OpenAI API.
#[derive(Debug, Deserialize)]
pub struct OpenAIUsage {
    /// Number of tokens in the prompt.
    pub prompt_tokens: u64,
    /// Number of tokens in the completion.
    pub completion_tokens: u64,
}

/// OpenAI Embeddings API request body.
#[derive(Debug, Serialize)]
pub struct OpenAIEmbedRequest {
    /// Embedding model identifier (e.g. "text-embedding-3-small").
    pub model: String,
    /// Texts to embed.
    pub input: Vec<String>,
}

/// OpenAI Embeddings API response body.
#[derive(Debug, Deserialize)]
pub struct OpenAIEmbedResponse {
    /// Model that produced the embeddings.
    pub model: String,
    /// Embedding data, one entry per input string, in order.
    pub data: Vec<OpenAIEmbedData>,
    /// Token usage statistics.
    pub usage: OpenAIEmbedUsage,
}

/// A single embedding entry in an embeddings response.
#[derive(Debug, Deserialize)]
pub struct OpenAIEmbedData {
    /// The embedding vector.
    pub embedding: Vec<f32>,
}

/// Token usage statistics from the embeddings API.
#[derive(Debug, Deserialize)]
pub struct OpenAIEmbedUsage {
    /// Number of tokens in the input.
    pub prompt_tokens: u64,
}

/// One server-sent event from a streaming Chat Completions call. The
/// stream ends with a literal `data: [DONE]` line, which does not parse
/// as this shape and is filtered out by the caller.
#[derive(Debug, Deserialize)]
pub struct OpenAIStreamChunk {
    /// Incremental choices; empty chunks (e.g. a trailing usage-only
    /// chunk) carry no delta.
    #[serde(default)]
    pub choices: Vec<OpenAIStreamChoice>,
}

/// A single choice in a streaming chunk.
#[derive(Debug, Deserialize)]
pub struct OpenAIStreamChoice {
    /// The incremental delta for this choice.
    pub delta: OpenAIStreamDelta,
}

/// The `delta` payload of a streaming choice.
#[derive(Debug, Deserialize)]
pub struct OpenAIStreamDelta {
    /// The incremental text, absent on the role-announcing first chunk
    /// and the finish-reason-carrying last chunk.
    #[serde(default)]
    pub content: Option<String>,
}
