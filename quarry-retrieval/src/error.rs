//! Errors raised by vector store and reranker implementations.

use thiserror::Error;

/// Errors a [`crate::store::VectorStore`] or [`crate::rerank::Reranker`] can raise.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The named collection does not exist.
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    /// A record's embedding dimension didn't match the collection's.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension the collection was created with.
        expected: usize,
        /// Dimension of the record that was rejected.
        actual: usize,
    },

    /// The backing store rejected a read or write.
    #[error("backend error: {0}")]
    Backend(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
