use async_trait::async_trait;
use layer0::error::StageError;
use layer0::stage::{PipelineContext, RetrievedDocument, Stage, StageOutcome};
use quarry_provider::registry::DynProvider;
use quarry_provider::types::EmbedRequest;
use quarry_retrieval::store::VectorStore;
use std::sync::Arc;

/// Embeds the effective query and searches the vector store for the
/// pipeline's collection, filling in `ctx.retrieved`.
pub struct RetrievalStage {
    vector_store: Arc<dyn VectorStore>,
    embed_provider: Arc<dyn DynProvider>,
    embedding_model: String,
    top_k: usize,
}

impl RetrievalStage {
    /// Build a retrieval stage from its dependencies.
    pub fn new(
        vector_store: Arc<dyn VectorStore>,
        embed_provider: Arc<dyn DynProvider>,
        embedding_model: impl Into<String>,
        top_k: usize,
    ) -> Self {
        Self {
            vector_store,
            embed_provider,
            embedding_model: embedding_model.into(),
            top_k,
        }
    }
}

#[async_trait]
impl Stage for RetrievalStage {
    fn name(&self) -> &str {
        "retrieval"
    }

    async fn execute(&self, mut ctx: PipelineContext) -> Result<StageOutcome, StageError> {
        if self.top_k == 0 {
            ctx.retrieved = Vec::new();
            ctx.metadata.stages_completed += 1;
            return Ok(StageOutcome::ok(ctx));
        }

        let query = ctx.effective_query().to_string();

        let embed_request = EmbedRequest::single(&self.embedding_model, &query);
        let embed_response = self
            .embed_provider
            .embed(embed_request)
            .await
            .map_err(|e| StageError::Provider(e.to_string()))?;
        let vector = embed_response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| StageError::Provider("embedding response was empty".into()))?;

        let hits = self
            .vector_store
            .search(ctx.collection.as_str(), &vector, self.top_k, None)
            .await
            .map_err(|e| StageError::Retrieval(e.to_string()))?;

        ctx.retrieved = hits
            .into_iter()
            .map(|hit| RetrievedDocument::new(hit.id, hit.text, hit.score))
            .collect();
        ctx.metadata.stages_completed += 1;

        Ok(StageOutcome::ok(ctx))
    }
}
