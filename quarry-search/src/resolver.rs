//! Pipeline resolution: the `(user, collection) -> pipeline` lookup the
//! facade depends on but does not own. The production pipeline entity
//! (spec.md §3's `Pipeline Config`) lives in the relational store,
//! which is an external collaborator out of scope for this crate — this
//! module defines the seam plus one in-memory reference implementation,
//! matching `quarry-retrieval::memory::InMemoryVectorStore`'s pattern.

use async_trait::async_trait;
use layer0::id::{CollectionId, PipelineId, ProviderId, TemplateId, UserId};
use std::collections::HashMap;
use std::sync::RwLock;

/// The pieces of a pipeline configuration the facade needs to build and
/// run a stage sequence. Everything else a full `Pipeline Config` entity
/// might carry (owner metadata, creation timestamps) stays with the
/// external store.
#[derive(Debug, Clone)]
pub struct ResolvedPipeline {
    /// The pipeline's id, for logging/tracing only — never accepted
    /// from a caller (see [`crate::SearchInput`]'s doc comment).
    pub id: PipelineId,
    /// Name of the registered provider used for embeddings.
    pub embedding_provider: ProviderId,
    /// Model id passed to the embedding provider.
    pub embedding_model: String,
    /// Name of the registered provider used for generation.
    pub generation_provider: ProviderId,
    /// Model id passed to the generation provider.
    pub generation_model: String,
    /// Explicit RAG-query template to use; `None` falls through to the
    /// user/system default via `quarry_template::TemplateRegistry::resolve`.
    pub template_id: Option<TemplateId>,
    /// Per-pipeline config overrides, layered over `Settings` by
    /// `quarry_config::resolve`.
    pub config_metadata: HashMap<String, serde_json::Value>,
}

/// Resolves the pipeline configuration for a `(user, collection)` pair.
///
/// Selection policy (spec.md §4.K): a pipeline explicitly associated
/// with `(user, collection)`, else the user's default pipeline, else
/// `None` — which the facade turns into `SearchError::ConfigurationMissing`.
#[async_trait]
pub trait PipelineResolver: Send + Sync {
    /// Resolve the pipeline for this request, or `None` if no pipeline
    /// (explicit or default) exists for this user.
    async fn resolve(&self, user: &UserId, collection: &CollectionId) -> Option<ResolvedPipeline>;
}

/// An in-memory `PipelineResolver` keyed by `(user, collection)`, with a
/// per-user fallback. Intended for tests and single-process deployments,
/// the same role `InMemoryVectorStore` plays for retrieval.
#[derive(Default)]
pub struct StaticPipelineResolver {
    by_collection: RwLock<HashMap<(UserId, CollectionId), ResolvedPipeline>>,
    by_user: RwLock<HashMap<UserId, ResolvedPipeline>>,
}

impl StaticPipelineResolver {
    /// An empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pipeline for one specific `(user, collection)` pair.
    pub fn set_for_collection(&self, user: UserId, collection: CollectionId, pipeline: ResolvedPipeline) {
        self.by_collection
            .write()
            .expect("pipeline resolver lock poisoned")
            .insert((user, collection), pipeline);
    }

    /// Register a user's default pipeline, used when no collection-specific entry exists.
    pub fn set_user_default(&self, user: UserId, pipeline: ResolvedPipeline) {
        self.by_user
            .write()
            .expect("pipeline resolver lock poisoned")
            .insert(user, pipeline);
    }
}

#[async_trait]
impl PipelineResolver for StaticPipelineResolver {
    async fn resolve(&self, user: &UserId, collection: &CollectionId) -> Option<ResolvedPipeline> {
        if let Some(pipeline) = self
            .by_collection
            .read()
            .expect("pipeline resolver lock poisoned")
            .get(&(user.clone(), collection.clone()))
        {
            return Some(pipeline.clone());
        }

        self.by_user.read().expect("pipeline resolver lock poisoned").get(user).cloned()
    }
}
