//! The top-level facade error: every lower-level crate's error folded
//! into one taxonomy, plus the boundary errors the facade itself raises.

use quarry_pipeline::PipelineError;
use quarry_provider::provider::ProviderError;
use quarry_retrieval::error::RetrievalError;
use quarry_template::TemplateError;
use thiserror::Error;

/// Errors from [`crate::SearchService::search`].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SearchError {
    /// The collection or the resolved pipeline does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request failed validation (empty question, malformed id).
    #[error("validation error: {0}")]
    ValidationError(String),

    /// No pipeline could be resolved for `(user, collection)` and no
    /// user default or system default exists either.
    #[error("configuration missing: {0}")]
    ConfigurationMissing(String),

    /// An upstream LLM provider failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The vector store failed or returned malformed records.
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    /// Template resolution or rendering failed.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// The pipeline executor failed (stage error, hook halt, deadline).
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl SearchError {
    /// A short, stable machine-readable code for the error variant,
    /// independent of the human-readable `Display` message.
    pub fn code(&self) -> &'static str {
        match self {
            SearchError::NotFound(_) => "not_found",
            SearchError::ValidationError(_) => "validation_error",
            SearchError::ConfigurationMissing(_) => "configuration_missing",
            SearchError::Provider(_) => "provider_error",
            SearchError::Retrieval(_) => "vector_store_error",
            SearchError::Template(_) => "template_error",
            SearchError::Pipeline(PipelineError::DeadlineExceeded(_)) => "deadline_exceeded",
            SearchError::Pipeline(_) => "pipeline_error",
        }
    }

    /// The user-visible structured body: `{detail, code}` plus a
    /// correlation id for support, with no stack trace.
    pub fn to_response(&self, correlation_id: Option<String>) -> ErrorResponse {
        ErrorResponse {
            detail: self.to_string(),
            code: self.code(),
            correlation_id,
        }
    }
}

/// The structured body a facade's HTTP layer would serialize back to
/// the caller.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ErrorResponse {
    /// Human-readable description of what went wrong.
    pub detail: String,
    /// Stable machine-readable error code.
    pub code: &'static str,
    /// Correlation id for support/log cross-referencing, if supplied.
    pub correlation_id: Option<String>,
}
