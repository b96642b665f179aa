//! The `VectorStore` protocol — how embedded chunks are indexed and searched.

use crate::error::RetrievalError;
use crate::types::{SearchFilter, VectorHit, VectorRecord};
use async_trait::async_trait;

/// Pluggable capability over a vector-embedding collection.
///
/// Always used as a trait object from the pipeline (`Arc<dyn VectorStore>`),
/// so this mirrors `layer0::state::StateStore` in using `#[async_trait]`
/// rather than native `impl Future` return position.
///
/// Searches return up to `k` hits ordered by descending score, ties broken
/// by lexicographic id; the hit count may be less than `k` if the
/// collection holds fewer records than requested.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a collection with the given embedding dimension, if it
    /// doesn't already exist. Idempotent.
    async fn ensure_collection(&self, name: &str, dim: usize) -> Result<(), RetrievalError>;

    /// Insert or overwrite records by id.
    async fn upsert(&self, name: &str, records: Vec<VectorRecord>) -> Result<(), RetrievalError>;

    /// Search for the `k` nearest records to `vector`, optionally filtered
    /// by tag equality.
    async fn search(
        &self,
        name: &str,
        vector: &[f32],
        k: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<VectorHit>, RetrievalError>;

    /// Delete a collection and all of its records.
    async fn delete(&self, name: &str) -> Result<(), RetrievalError>;
}

pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)) as f64
}
