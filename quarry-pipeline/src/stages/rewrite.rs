use async_trait::async_trait;
use layer0::error::StageError;
use layer0::stage::{PipelineContext, Stage, StageOutcome};
use quarry_rewrite::{rewrite_query_with, RewriteOptions};

/// Normalizes and expands the user's raw query before retrieval:
/// lowercasing, whitespace collapsing, contraction expansion.
pub struct RewriteStage {
    options: RewriteOptions,
}

impl RewriteStage {
    /// A rewrite stage using the default options.
    pub fn new() -> Self {
        Self {
            options: RewriteOptions::default(),
        }
    }

    /// A rewrite stage using custom options.
    pub fn with_options(options: RewriteOptions) -> Self {
        Self { options }
    }
}

impl Default for RewriteStage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Stage for RewriteStage {
    fn name(&self) -> &str {
        "query_rewrite"
    }

    async fn execute(&self, mut ctx: PipelineContext) -> Result<StageOutcome, StageError> {
        let rewritten = rewrite_query_with(&ctx.original_query, &self.options);
        ctx.rewritten_query = Some(rewritten);
        ctx.metadata.stages_completed += 1;
        Ok(StageOutcome::ok(ctx))
    }
}
