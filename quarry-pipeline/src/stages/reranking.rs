use async_trait::async_trait;
use layer0::error::StageError;
use layer0::stage::{PipelineContext, RetrievedDocument, Stage, StageOutcome};
use quarry_retrieval::rerank::Reranker;
use quarry_retrieval::types::VectorHit;
use std::sync::Arc;

/// Reorders `ctx.retrieved` by relevance via a pluggable [`Reranker`],
/// filling in `ctx.reranked`. A no-op when `enabled` is false — the
/// generation/reasoning stages fall back to `ctx.retrieved` either way
/// through `PipelineContext::effective_documents`.
pub struct RerankingStage {
    reranker: Arc<dyn Reranker>,
    top_k: usize,
    enabled: bool,
}

impl RerankingStage {
    /// Build a reranking stage from a reranker implementation and the
    /// number of documents to keep.
    pub fn new(reranker: Arc<dyn Reranker>, top_k: usize, enabled: bool) -> Self {
        Self {
            reranker,
            top_k,
            enabled,
        }
    }
}

#[async_trait]
impl Stage for RerankingStage {
    fn name(&self) -> &str {
        "reranking"
    }

    async fn execute(&self, mut ctx: PipelineContext) -> Result<StageOutcome, StageError> {
        if !self.enabled {
            ctx.metadata.stages_completed += 1;
            return Ok(StageOutcome::ok(ctx));
        }

        let query = ctx.effective_query().to_string();
        let hits: Vec<VectorHit> = ctx
            .retrieved
            .iter()
            .map(|doc| VectorHit {
                id: doc.id.clone(),
                score: doc.score,
                text: doc.content.clone(),
                tags: Default::default(),
            })
            .collect();

        let reranked = self
            .reranker
            .rerank(&query, hits, self.top_k)
            .await
            .map_err(|e| StageError::Retrieval(e.to_string()))?;

        ctx.reranked = Some(
            reranked
                .into_iter()
                .map(|hit| RetrievedDocument::new(hit.id, hit.text, hit.score))
                .collect(),
        );
        ctx.metadata.stages_completed += 1;

        Ok(StageOutcome::ok(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layer0::id::{CollectionId, UserId};
    use quarry_retrieval::rerank::{NoopReranker, OverlapReranker};

    fn ctx_with_docs(docs: Vec<(&str, &str, f64)>) -> PipelineContext {
        let mut ctx = PipelineContext::new(UserId::new("u"), CollectionId::new("c"), "rust ownership rules");
        ctx.retrieved = docs
            .into_iter()
            .map(|(id, text, score)| RetrievedDocument::new(id, text, score))
            .collect();
        ctx
    }

    #[tokio::test]
    async fn disabled_reranking_leaves_reranked_none() {
        let stage = RerankingStage::new(Arc::new(NoopReranker), 5, false);
        let ctx = ctx_with_docs(vec![("a", "x", 0.1)]);
        let outcome = stage.execute(ctx).await.unwrap();
        assert!(outcome.context.reranked.is_none());
    }

    #[tokio::test]
    async fn enabled_reranking_sets_reranked_documents() {
        let stage = RerankingStage::new(Arc::new(OverlapReranker), 5, true);
        let ctx = ctx_with_docs(vec![
            ("low", "completely unrelated passage", 0.9),
            ("high", "rust ownership and borrowing rules", 0.1),
        ]);
        let outcome = stage.execute(ctx).await.unwrap();
        let reranked = outcome.context.reranked.expect("reranked documents");
        assert_eq!(reranked[0].id, "high");
    }

    #[tokio::test]
    async fn enabled_reranking_honors_top_k() {
        let stage = RerankingStage::new(Arc::new(NoopReranker), 1, true);
        let ctx = ctx_with_docs(vec![("a", "x", 0.1), ("b", "y", 0.2)]);
        let outcome = stage.execute(ctx).await.unwrap();
        assert_eq!(outcome.context.reranked.unwrap().len(), 1);
    }
}
