//! EchoStage — returns the context unchanged, with a canned answer.

use crate::content::Content;
use crate::error::StageError;
use crate::stage::{PipelineContext, Stage, StageOutcome};
use async_trait::async_trait;

/// A stage implementation that sets `answer` to the effective query and
/// otherwise passes the context through untouched. Used for testing
/// pipeline executor wiring and hook dispatch.
pub struct EchoStage {
    name: String,
}

impl EchoStage {
    /// Create a new EchoStage with the given stage name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Stage for EchoStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, mut ctx: PipelineContext) -> Result<StageOutcome, StageError> {
        ctx.answer = Some(Content::text(ctx.effective_query().to_owned()));
        ctx.metadata.stages_completed += 1;
        Ok(StageOutcome::ok(ctx))
    }
}
