//! `InMemoryVectorStore` — a `HashMap`-backed, cosine-similarity `VectorStore`.

use crate::error::RetrievalError;
use crate::store::{cosine_similarity, VectorStore};
use crate::types::{apply_filter, SearchFilter, VectorHit, VectorRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

struct Collection {
    dim: usize,
    records: HashMap<String, VectorRecord>,
}

/// In-memory vector store backed by a `HashMap` behind a `tokio::sync::RwLock`,
/// scoring candidates with cosine similarity. Intended for tests and the
/// worked examples; not durable across process restarts.
#[derive(Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryVectorStore {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn ensure_collection(&self, name: &str, dim: usize) -> Result<(), RetrievalError> {
        let mut collections = self.collections.write().await;
        collections.entry(name.to_owned()).or_insert_with(|| Collection {
            dim,
            records: HashMap::new(),
        });
        Ok(())
    }

    async fn upsert(&self, name: &str, records: Vec<VectorRecord>) -> Result<(), RetrievalError> {
        let mut collections = self.collections.write().await;
        let collection = collections
            .get_mut(name)
            .ok_or_else(|| RetrievalError::CollectionNotFound(name.to_owned()))?;

        for record in &records {
            if record.embedding.len() != collection.dim {
                return Err(RetrievalError::DimensionMismatch {
                    expected: collection.dim,
                    actual: record.embedding.len(),
                });
            }
        }

        for record in records {
            collection.records.insert(record.id.clone(), record);
        }
        Ok(())
    }

    async fn search(
        &self,
        name: &str,
        vector: &[f32],
        k: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<VectorHit>, RetrievalError> {
        let collections = self.collections.read().await;
        let collection = collections
            .get(name)
            .ok_or_else(|| RetrievalError::CollectionNotFound(name.to_owned()))?;

        let candidates: Vec<&VectorRecord> = match filter {
            Some(f) => apply_filter(collection.records.values(), f),
            None => collection.records.values().collect(),
        };

        let mut scored: Vec<VectorHit> = candidates
            .into_iter()
            .map(|record| VectorHit {
                id: record.id.clone(),
                score: cosine_similarity(vector, &record.embedding),
                text: record.text.clone(),
                tags: record.tags.clone(),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        scored.truncate(k);
        Ok(scored)
    }

    async fn delete(&self, name: &str) -> Result<(), RetrievalError> {
        let mut collections = self.collections.write().await;
        collections.remove(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, embedding: Vec<f32>) -> VectorRecord {
        VectorRecord::new(id, format!("text for {id}"), embedding)
    }

    #[tokio::test]
    async fn search_returns_hits_ordered_by_score_desc() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("docs", 2).await.unwrap();
        store
            .upsert(
                "docs",
                vec![
                    record("a", vec![1.0, 0.0]),
                    record("b", vec![0.0, 1.0]),
                    record("c", vec![0.9, 0.1]),
                ],
            )
            .await
            .unwrap();

        let hits = store.search("docs", &[1.0, 0.0], 2, None).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "a");
        assert_eq!(hits[1].id, "c");
    }

    #[tokio::test]
    async fn search_respects_k_even_when_collection_is_smaller() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("docs", 2).await.unwrap();
        store.upsert("docs", vec![record("a", vec![1.0, 0.0])]).await.unwrap();

        let hits = store.search("docs", &[1.0, 0.0], 5, None).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn ties_broken_lexicographically_by_id() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("docs", 2).await.unwrap();
        store
            .upsert(
                "docs",
                vec![record("z", vec![1.0, 0.0]), record("a", vec![1.0, 0.0])],
            )
            .await
            .unwrap();

        let hits = store.search("docs", &[1.0, 0.0], 2, None).await.unwrap();
        assert_eq!(hits[0].id, "a");
        assert_eq!(hits[1].id, "z");
    }

    #[tokio::test]
    async fn upsert_into_unknown_collection_errors() {
        let store = InMemoryVectorStore::new();
        let err = store
            .upsert("missing", vec![record("a", vec![1.0])])
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::CollectionNotFound(_)));
    }

    #[tokio::test]
    async fn upsert_with_wrong_dimension_errors() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("docs", 2).await.unwrap();
        let err = store
            .upsert("docs", vec![record("a", vec![1.0, 0.0, 0.0])])
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::DimensionMismatch { expected: 2, actual: 3 }));
    }

    #[tokio::test]
    async fn search_honors_tag_filter() {
        use crate::types::SearchFilter;

        let store = InMemoryVectorStore::new();
        store.ensure_collection("docs", 1).await.unwrap();
        store
            .upsert(
                "docs",
                vec![
                    record("a", vec![1.0]).with_tag("doc_id", "d1"),
                    record("b", vec![1.0]).with_tag("doc_id", "d2"),
                ],
            )
            .await
            .unwrap();

        let filter = SearchFilter::tag("doc_id", "d2");
        let hits = store.search("docs", &[1.0], 10, Some(&filter)).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "b");
    }

    #[tokio::test]
    async fn delete_removes_collection() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("docs", 1).await.unwrap();
        store.upsert("docs", vec![record("a", vec![1.0])]).await.unwrap();
        store.delete("docs").await.unwrap();

        let err = store.search("docs", &[1.0], 1, None).await.unwrap_err();
        assert!(matches!(err, RetrievalError::CollectionNotFound(_)));
    }
}
