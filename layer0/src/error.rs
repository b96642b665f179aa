//! Error types for each protocol.

use thiserror::Error;

/// Stage execution errors.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StageError {
    /// An error from the model/LLM provider.
    #[error("provider error: {0}")]
    Provider(String),

    /// An error from the vector store or reranker.
    #[error("retrieval error: {0}")]
    Retrieval(String),

    /// Context/prompt assembly failed before the model call.
    #[error("context assembly failed: {0}")]
    ContextAssembly(String),

    /// The stage failed but retrying might succeed.
    /// The pipeline executor's retry policy decides.
    #[error("retryable: {0}")]
    Retryable(String),

    /// The stage failed and retrying won't help.
    /// Budget exceeded, invalid input, configuration missing.
    #[error("non-retryable: {0}")]
    NonRetryable(String),

    /// Catch-all. Include context.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// State errors.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StateError {
    /// Key not found in the given scope.
    #[error("not found: {scope}/{key}")]
    NotFound {
        /// The scope that was searched.
        scope: String,
        /// The key that was not found.
        key: String,
    },

    /// A write operation failed.
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Hook errors. These are logged but do NOT halt the pipeline
/// (use HookAction::Halt to halt).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum HookError {
    /// The hook execution failed.
    #[error("hook failed: {0}")]
    Failed(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
