//! Ollama `/api/chat` and `/api/embed` request/response types.
//!
//! Key differences from OpenAI-compatible APIs:
//! - Endpoints are POST `/api/chat` and POST `/api/embed` (not `/v1/...`)
//! - No auth headers required
//! - Response includes token counts under `prompt_eval_count`/`eval_count`
//!   rather than a `usage` object

use serde::{Deserialize, Serialize};

/// Ollama `/api/chat` request body.
#[derive(Debug, Serialize)]
pub struct OllamaChatRequest {
    /// Model identifier (e.g. "llama3.2").
    pub model: String,
    /// Conversation messages.
    pub messages: Vec<OllamaMessage>,
    /// Whether to stream the response. Always `false` for this provider.
    pub stream: bool,
    /// How long to keep the model loaded in memory (e.g. "5m", "0").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<String>,
    /// Hardware tuning and generation options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<OllamaOptions>,
}

/// A message in the Ollama `/api/chat` format.
#[derive(Debug, Serialize, Deserialize)]
pub struct OllamaMessage {
    /// Role: "system", "user", or "assistant".
    pub role: String,
    /// Message text content.
    pub content: String,
}

/// Generation options for Ollama.
#[derive(Debug, Default, Serialize)]
pub struct OllamaOptions {
    /// Sampling temperature (0.0 - 2.0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum number of tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<u32>,
    /// Top-k sampling cutoff.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// Nucleus sampling cutoff.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Repetition penalty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat_penalty: Option<f32>,
}

/// Ollama `/api/chat` response body.
#[derive(Debug, Deserialize)]
pub struct OllamaChatResponse {
    /// Model that generated the response.
    pub model: String,
    /// The assistant's response message.
    pub message: OllamaMessage,
    /// Why generation stopped (e.g. "stop", "length").
    #[serde(default)]
    pub done_reason: Option<String>,
    /// Number of tokens in the prompt.
    #[serde(default)]
    pub prompt_eval_count: Option<u64>,
    /// Number of tokens generated.
    #[serde(default)]
    pub eval_count: Option<u64>,
}

/// Ollama `/api/embed` request body.
#[derive(Debug, Serialize)]
pub struct OllamaEmbedRequest {
    /// Embedding model identifier (e.g. "nomic-embed-text").
    pub model: String,
    /// Texts to embed.
    pub input: Vec<String>,
}

/// Ollama `/api/embed` response body.
#[derive(Debug, Deserialize)]
pub struct OllamaEmbedResponse {
    /// Model that produced the embeddings.
    pub model: String,
    /// One vector per input string, in the same order.
    pub embeddings: Vec<Vec<f32>>,
    /// Number of tokens in the input.
    #[serde(default)]
    pub prompt_eval_count: Option<u64>,
}

/// One line of a streaming `/api/chat` response. Ollama streams newline-
/// delimited JSON objects shaped like [`OllamaChatResponse`]; the final
/// line carries `done: true` and no further message content follows it.
#[derive(Debug, Deserialize)]
pub struct OllamaChatStreamLine {
    /// The incremental message fragment for this line.
    pub message: OllamaMessage,
    /// Whether this is the final line of the stream.
    #[serde(default)]
    pub done: bool,
}
