//! The `Provider` trait — a uniform surface over chat-completion and
//! embedding backends.

use crate::types::{EmbedRequest, EmbedResponse, GenerateRequest, GenerateResponse};
use futures::stream::BoxStream;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// A lazy sequence of text deltas from a streaming generation. Each item
/// is one incremental chunk of generated text, in the order the backend
/// produced it; the stream ends when the backend signals completion.
pub type TextDeltaStream = BoxStream<'static, Result<String, ProviderError>>;

/// Errors a provider backend can raise. Transport details (HTTP status,
/// retry-after headers) are folded into these variants by each backend's
/// own `error.rs` so callers never see backend-specific error types.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The request reached the backend but it returned a failure.
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// The backend is rate-limiting this caller. `retry_after` carries the
    /// backend's suggested wait, parsed from a `Retry-After` header, when
    /// it sent one.
    #[error("rate limited: {message}")]
    RateLimited {
        /// The backend's response body or message.
        message: String,
        /// Suggested wait before retrying, when the backend sent one.
        retry_after: Option<Duration>,
    },

    /// Authentication with the backend failed.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The backend's response didn't match the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// A required configuration value (API key, base URL, model name,
    /// or an LLM parameter set with no explicit/user-default/system-default
    /// resolution) was missing.
    #[error("configuration missing: {0}")]
    ConfigurationMissing(String),

    /// A parameter value was present but out of its valid range (e.g. a
    /// temperature outside `[0, 2]`).
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ProviderError {
    /// A rate-limit error with no `Retry-After` hint.
    pub fn rate_limited(message: impl Into<String>) -> Self {
        ProviderError::RateLimited {
            message: message.into(),
            retry_after: None,
        }
    }

    /// A rate-limit error carrying a `Retry-After` wait.
    pub fn rate_limited_after(message: impl Into<String>, retry_after: Duration) -> Self {
        ProviderError::RateLimited {
            message: message.into(),
            retry_after: Some(retry_after),
        }
    }

    /// Whether a caller should retry this request. Rate limits and
    /// transient request failures are retryable; auth and configuration
    /// problems are not — retrying won't fix a missing API key.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderError::RateLimited { .. } | ProviderError::RequestFailed(_)
        )
    }

    /// The backend's suggested wait before retrying, if this error carries
    /// one.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ProviderError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

/// Protocol boundary for an LLM backend: generate a completion, stream
/// one, or embed text into vectors. Every concrete backend (OpenAI,
/// Anthropic, Ollama, Granite) implements this.
///
/// Uses `impl Future` return position instead of `async-trait` because
/// `Provider` is generic over nothing and never needs to be boxed as a
/// trait object on its own — callers that need dynamic dispatch go
/// through [`crate::registry::DynProvider`] instead, which erases this
/// trait behind an `async-trait` object-safe wrapper. The object-safe
/// boundary in this pipeline is `layer0::Stage`, not `Provider`.
pub trait Provider: Send + Sync {
    /// A short, stable name for this backend (e.g. `"openai"`).
    fn name(&self) -> &str;

    /// Generate a chat completion.
    fn generate(
        &self,
        request: GenerateRequest,
    ) -> impl Future<Output = Result<GenerateResponse, ProviderError>> + Send;

    /// Generate a chat completion as a lazy stream of text deltas, for
    /// callers that want to render output incrementally instead of
    /// waiting for the full response.
    ///
    /// The default forwards to [`Provider::generate`] and emits the
    /// complete response as a single delta; backends with a native
    /// streaming endpoint (every backend shipped in this workspace)
    /// override it to yield incremental chunks as they arrive.
    fn generate_stream(
        &self,
        request: GenerateRequest,
    ) -> impl Future<Output = Result<TextDeltaStream, ProviderError>> + Send {
        async move {
            let response = self.generate(request).await?;
            let text = response.text();
            Ok(Box::pin(futures::stream::once(async move { Ok(text) })) as TextDeltaStream)
        }
    }

    /// Embed one or more strings into vectors.
    fn embed(
        &self,
        request: EmbedRequest,
    ) -> impl Future<Output = Result<EmbedResponse, ProviderError>> + Send;

    /// Release any connections this backend holds. Idempotent — safe to
    /// call more than once, including after the backend is already
    /// closed. Backends built on `reqwest` hold no resources beyond the
    /// client's own pool, which tears itself down on drop, so the
    /// default is a no-op; a backend that opens a dedicated connection
    /// (a persistent websocket, a unix socket) overrides this.
    fn close(&self) -> impl Future<Output = ()> + Send {
        async {}
    }
}
