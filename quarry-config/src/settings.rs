use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Retrieval strategy used by the Retrieval stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalKind {
    /// Dense vector similarity search only.
    Vector,
    /// Sparse keyword search only.
    Keyword,
    /// Weighted combination of vector and keyword search.
    Hybrid,
}

/// Process-wide immutable settings, populated once from the environment
/// at start-up.
///
/// `Settings` is never mutated after construction. Per-pipeline overrides
/// are layered on top of it at lookup time by [`crate::resolve`], not by
/// mutating this struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Signing secret for bearer tokens issued to API clients.
    pub jwt_secret: String,
    /// Vector store host.
    pub vector_store_host: String,
    /// Vector store port.
    pub vector_store_port: u16,
    /// Embedding model identifier used when no pipeline override is set.
    pub embedding_model_id: String,
    /// Provider credentials keyed by provider name (`"openai"`, `"anthropic"`, ...).
    pub provider_credentials: HashMap<String, String>,

    /// Default chunking strategy name.
    pub chunking_strategy: String,
    /// Minimum chunk size, in characters.
    pub min_chunk_size: usize,
    /// Maximum chunk size, in characters.
    pub max_chunk_size: usize,
    /// Overlap between adjacent chunks, in characters.
    pub chunk_overlap: usize,

    /// Default retrieval strategy.
    pub retrieval_type: RetrievalKind,
    /// Default number of results to retrieve.
    pub number_of_results: usize,
    /// Weight given to the vector score in hybrid retrieval.
    pub vector_weight: f64,
    /// Weight given to the keyword score in hybrid retrieval.
    pub keyword_weight: f64,

    /// Whether reranking is enabled by default.
    pub enable_reranking: bool,
    /// Default reranker implementation name.
    pub reranker_type: String,
    /// Default number of hits kept after reranking.
    pub reranker_top_k: usize,

    /// Maximum chain-of-thought decomposition depth.
    pub cot_max_reasoning_depth: u32,
    /// Default chain-of-thought reasoning strategy name.
    pub cot_reasoning_strategy: String,
    /// Multiplier applied to `max_new_tokens` for the CoT branch's token budget.
    pub cot_token_budget_multiplier: f64,
    /// Fraction of the context window at which summarization kicks in.
    pub context_window_threshold: f64,
}

impl Settings {
    /// Load settings from the process environment.
    ///
    /// `jwt_secret`, `vector_store_host`, `vector_store_port`, and
    /// `embedding_model_id` are required; their absence is a startup
    /// error. At least one provider credential must be configured.
    /// Every other field falls back to the tunable default named in
    /// the environment variable table.
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = required_var("QUARRY_JWT_SECRET")?;
        let vector_store_host = required_var("QUARRY_VECTOR_STORE_HOST")?;
        let vector_store_port = required_var("QUARRY_VECTOR_STORE_PORT")?
            .parse()
            .map_err(|e| ConfigError::Invalid {
                field: "QUARRY_VECTOR_STORE_PORT".into(),
                reason: format!("{e}"),
            })?;
        let embedding_model_id = required_var("QUARRY_EMBEDDING_MODEL_ID")?;

        let provider_credentials = collect_provider_credentials();
        if provider_credentials.is_empty() {
            return Err(ConfigError::MissingEnvVar(
                "at least one QUARRY_PROVIDER_<NAME>_API_KEY".into(),
            ));
        }

        let retrieval_type = match std::env::var("QUARRY_RETRIEVAL_TYPE").ok().as_deref() {
            None => RetrievalKind::Vector,
            Some("vector") => RetrievalKind::Vector,
            Some("keyword") => RetrievalKind::Keyword,
            Some("hybrid") => RetrievalKind::Hybrid,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    field: "QUARRY_RETRIEVAL_TYPE".into(),
                    reason: format!("unknown retrieval type: {other}"),
                });
            }
        };

        Ok(Self {
            jwt_secret,
            vector_store_host,
            vector_store_port,
            embedding_model_id,
            provider_credentials,

            chunking_strategy: env_or("QUARRY_CHUNKING_STRATEGY", "fixed_size"),
            min_chunk_size: parse_env_or("QUARRY_MIN_CHUNK_SIZE", 256)?,
            max_chunk_size: parse_env_or("QUARRY_MAX_CHUNK_SIZE", 1024)?,
            chunk_overlap: parse_env_or("QUARRY_CHUNK_OVERLAP", 64)?,

            retrieval_type,
            number_of_results: parse_env_or("QUARRY_NUMBER_OF_RESULTS", 5)?,
            vector_weight: parse_env_or("QUARRY_VECTOR_WEIGHT", 0.5)?,
            keyword_weight: parse_env_or("QUARRY_KEYWORD_WEIGHT", 0.5)?,

            enable_reranking: parse_env_or("QUARRY_ENABLE_RERANKING", false)?,
            reranker_type: env_or("QUARRY_RERANKER_TYPE", "noop"),
            reranker_top_k: parse_env_or("QUARRY_RERANKER_TOP_K", 5)?,

            cot_max_reasoning_depth: parse_env_or("QUARRY_COT_MAX_REASONING_DEPTH", 3)?,
            cot_reasoning_strategy: env_or("QUARRY_COT_REASONING_STRATEGY", "decomposition"),
            cot_token_budget_multiplier: parse_env_or("QUARRY_COT_TOKEN_BUDGET_MULTIPLIER", 1.5)?,
            context_window_threshold: parse_env_or("QUARRY_CONTEXT_WINDOW_THRESHOLD", 0.8)?,
        })
    }
}

fn required_var(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.into()))
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_env_or<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => raw.parse().map_err(|e| ConfigError::Invalid {
            field: name.into(),
            reason: format!("{e}"),
        }),
    }
}

/// Collects `QUARRY_PROVIDER_<NAME>_API_KEY` environment variables into a
/// provider-name -> credential map.
fn collect_provider_credentials() -> HashMap<String, String> {
    const PREFIX: &str = "QUARRY_PROVIDER_";
    const SUFFIX: &str = "_API_KEY";
    std::env::vars()
        .filter_map(|(key, value)| {
            let name = key.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)?;
            Some((name.to_lowercase(), value))
        })
        .collect()
}
