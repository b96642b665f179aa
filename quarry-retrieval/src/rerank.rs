//! The `Reranker` protocol — reordering candidate hits by relevance.

use crate::error::RetrievalError;
use crate::types::VectorHit;
use async_trait::async_trait;
use std::collections::HashSet;

/// Reorders a query's candidate hits. Scores are monotone within a single
/// call but not comparable across calls.
///
/// Same object-safety rationale as [`crate::store::VectorStore`]: always
/// used as `Arc<dyn Reranker>` from the pipeline.
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Rerank `hits` against `query`, keeping at most `top_k`.
    async fn rerank(
        &self,
        query: &str,
        hits: Vec<VectorHit>,
        top_k: usize,
    ) -> Result<Vec<VectorHit>, RetrievalError>;
}

/// A reranker that passes hits through untouched, truncated to `top_k`.
/// Used when reranking is disabled via settings or a per-call override.
pub struct NoopReranker;

#[async_trait]
impl Reranker for NoopReranker {
    async fn rerank(
        &self,
        _query: &str,
        mut hits: Vec<VectorHit>,
        top_k: usize,
    ) -> Result<Vec<VectorHit>, RetrievalError> {
        hits.truncate(top_k);
        Ok(hits)
    }
}

/// A reranker scoring each hit by lexical word overlap with the query,
/// usable without an external cross-encoder service.
pub struct OverlapReranker;

fn words(s: &str) -> HashSet<String> {
    s.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

#[async_trait]
impl Reranker for OverlapReranker {
    async fn rerank(
        &self,
        query: &str,
        mut hits: Vec<VectorHit>,
        top_k: usize,
    ) -> Result<Vec<VectorHit>, RetrievalError> {
        let query_words = words(query);
        if query_words.is_empty() {
            hits.truncate(top_k);
            return Ok(hits);
        }

        for hit in &mut hits {
            let hit_words = words(&hit.text);
            let overlap = query_words.intersection(&hit_words).count();
            hit.score = overlap as f64 / query_words.len() as f64;
        }

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(top_k);
        Ok(hits)
    }
}
