//! Shared record/hit types for the vector store and reranker contracts.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A document chunk to be indexed: an id, its text, its embedding, and
/// arbitrary tags (document id, document name, page number, chunk index).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Unique id within the collection.
    pub id: String,
    /// The chunk's source text.
    pub text: String,
    /// The chunk's embedding.
    pub embedding: Vec<f32>,
    /// Arbitrary metadata (document id, page number, chunk index, etc.).
    #[serde(default)]
    pub tags: HashMap<String, serde_json::Value>,
}

impl VectorRecord {
    /// Create a record with no tags.
    pub fn new(id: impl Into<String>, text: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            embedding,
            tags: HashMap::new(),
        }
    }

    /// Attach a tag, builder-style.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// A single search result: the matched record's id, score, text, and tags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorHit {
    /// Id of the matched record.
    pub id: String,
    /// Similarity score (cosine similarity preferred; higher is more relevant).
    pub score: f64,
    /// The matched record's stored text.
    pub text: String,
    /// The matched record's tags.
    #[serde(default)]
    pub tags: HashMap<String, serde_json::Value>,
}

/// An optional filter on a search, matched against a hit's tags.
/// A hit matches if every `(key, value)` pair is present and equal in its tags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilter {
    /// Required tag equalities.
    pub tags: HashMap<String, serde_json::Value>,
}

impl SearchFilter {
    /// No filter — every record matches.
    pub fn none() -> Self {
        Self::default()
    }

    /// A filter requiring one tag to equal a value.
    pub fn tag(key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        let mut tags = HashMap::new();
        tags.insert(key.into(), value.into());
        Self { tags }
    }

    fn matches(&self, record: &VectorRecord) -> bool {
        self.tags
            .iter()
            .all(|(k, v)| record.tags.get(k) == Some(v))
    }
}

pub(crate) fn apply_filter<'a>(
    records: impl Iterator<Item = &'a VectorRecord>,
    filter: &SearchFilter,
) -> Vec<&'a VectorRecord> {
    records.filter(|r| filter.matches(r)).collect()
}
