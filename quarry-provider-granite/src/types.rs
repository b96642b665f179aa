//! watsonx.ai `/ml/v1/text/generation` and `/ml/v1/text/embeddings` types.
//!
//! Granite models are served through IBM's watsonx.ai foundation-model
//! endpoints rather than a per-model API; every request carries a
//! `project_id` alongside the `model_id`.

use serde::{Deserialize, Serialize};

/// watsonx.ai text generation request body.
#[derive(Debug, Serialize)]
pub struct GraniteGenerateRequest {
    /// Model identifier (e.g. "ibm/granite-3-8b-instruct").
    pub model_id: String,
    /// The fully rendered prompt (watsonx has no chat message array; system
    /// prompt and conversation turns are flattened into one input string).
    pub input: String,
    /// watsonx project scoping this request.
    pub project_id: String,
    /// Generation parameters.
    pub parameters: GraniteParameters,
}

/// Generation parameters for a watsonx text generation request.
#[derive(Debug, Default, Serialize)]
pub struct GraniteParameters {
    /// Maximum number of tokens to generate.
    pub max_new_tokens: u32,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Top-k sampling cutoff.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// Nucleus sampling cutoff.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Repetition penalty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repetition_penalty: Option<f32>,
}

/// watsonx.ai text generation response body.
#[derive(Debug, Deserialize)]
pub struct GraniteGenerateResponse {
    /// Model that generated the response.
    pub model_id: String,
    /// Generation results, one per input (always length 1 for this backend).
    pub results: Vec<GraniteGenerateResult>,
}

/// A single generation result.
#[derive(Debug, Deserialize)]
pub struct GraniteGenerateResult {
    /// The generated text.
    pub generated_text: String,
    /// Why generation stopped (e.g. "eos_token", "max_tokens").
    pub stop_reason: String,
    /// Number of tokens in the input.
    pub input_token_count: u64,
    /// Number of tokens generated.
    pub generated_token_count: u64,
}

/// watsonx.ai text embeddings request body.
#[derive(Debug, Serialize)]
pub struct GraniteEmbedRequest {
    /// Embedding model identifier (e.g. "ibm/granite-embedding-107m-multilingual").
    pub model_id: String,
    /// Texts to embed.
    pub inputs: Vec<String>,
    /// watsonx project scoping this request.
    pub project_id: String,
}

/// watsonx.ai text embeddings response body.
#[derive(Debug, Deserialize)]
pub struct GraniteEmbedResponse {
    /// Model that produced the embeddings.
    pub model_id: String,
    /// Embedding results, one per input string, in order.
    pub results: Vec<GraniteEmbedResult>,
    /// Total tokens across all inputs.
    #[serde(default)]
    pub input_token_count: Option<u64>,
}

/// A single embedding result.
#[derive(Debug, Deserialize)]
pub struct GraniteEmbedResult {
    /// The embedding vector.
    pub embedding: Vec<f32>,
}

/// One server-sent event from a streaming `/ml/v1/text/generation_stream`
/// call. Each event carries the same `results` shape as the non-streaming
/// response, scoped to just the tokens generated since the last event.
#[derive(Debug, Deserialize)]
pub struct GraniteStreamEvent {
    /// Incremental generation results for this event.
    #[serde(default)]
    pub results: Vec<GraniteStreamResult>,
}

/// A single incremental result within a streaming event.
#[derive(Debug, Deserialize)]
pub struct GraniteStreamResult {
    /// The text generated since the previous event.
    #[serde(default)]
    pub generated_text: String,
}
