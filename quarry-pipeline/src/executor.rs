//! The pipeline executor: runs an ordered sequence of stages, dispatching
//! hooks at each stage's boundary and applying the effects each stage
//! declares.

use crate::error::PipelineError;
use layer0::effect::Effect;
use layer0::error::StateError;
use layer0::hook::{HookAction, HookContext, HookPoint};
use layer0::stage::{PipelineContext, Stage};
use layer0::state::StateStore;
use quarry_hooks::HookRegistry;
use std::sync::Arc;
use std::time::Duration;

fn hook_points(stage_name: &str) -> Option<(HookPoint, HookPoint)> {
    match stage_name {
        "query_rewrite" => Some((HookPoint::PreRewrite, HookPoint::PostRewrite)),
        "retrieval" => Some((HookPoint::PreRetrieval, HookPoint::PostRetrieval)),
        "reranking" => Some((HookPoint::PreRerank, HookPoint::PostRerank)),
        "reasoning" => Some((HookPoint::PreReasoning, HookPoint::PostReasoning)),
        "generation" => Some((HookPoint::PreGeneration, HookPoint::PostGeneration)),
        "evaluation" => Some((HookPoint::PreEvaluation, HookPoint::PostEvaluation)),
        _ => None,
    }
}

async fn apply_effect(state: &Arc<dyn StateStore>, effect: Effect) -> Result<(), StateError> {
    match effect {
        Effect::WriteMemory { scope, key, value } => state.write(&scope, &key, value).await,
        Effect::DeleteMemory { scope, key } => state.delete(&scope, &key).await,
        Effect::Log { level, message, data } => {
            tracing::debug!(?level, message = %message, data = ?data, "stage effect: log");
            Ok(())
        }
        Effect::Custom { effect_type, data } => {
            tracing::debug!(effect_type = %effect_type, data = ?data, "stage effect: custom (no handler registered)");
            Ok(())
        }
    }
}

/// Runs an ordered sequence of `Stage`s, one pipeline run at a time,
/// dispatching hooks at each stage's Pre*/Post* boundary and applying
/// each stage's declared effects through an injected `StateStore`. The
/// whole run is bounded by a deadline.
pub struct PipelineExecutor {
    stages: Vec<Arc<dyn Stage>>,
    hooks: HookRegistry,
    state: Option<Arc<dyn StateStore>>,
    deadline: Duration,
}

impl PipelineExecutor {
    /// Build an executor from an ordered stage list. Stages run in the
    /// order given; the canonical order is rewrite, retrieval,
    /// reranking, reasoning, generation, evaluation, but callers may
    /// omit stages (e.g. skip reranking) by not including them.
    pub fn new(stages: Vec<Arc<dyn Stage>>, hooks: HookRegistry, state: Option<Arc<dyn StateStore>>, deadline: Duration) -> Self {
        Self {
            stages,
            hooks,
            state,
            deadline,
        }
    }

    /// Run every stage in order against `ctx`, returning the final context.
    pub async fn run(&self, ctx: PipelineContext) -> Result<PipelineContext, PipelineError> {
        match tokio::time::timeout(self.deadline, self.run_unbounded(ctx)).await {
            Ok(result) => result,
            Err(_) => Err(PipelineError::DeadlineExceeded(self.deadline)),
        }
    }

    async fn run_unbounded(&self, mut ctx: PipelineContext) -> Result<PipelineContext, PipelineError> {
        for stage in &self.stages {
            let name = stage.name().to_string();
            let points = hook_points(&name);

            if let Some((pre, _)) = points {
                ctx = self.dispatch_pre(pre, &name, ctx).await?;
            }

            let outcome = stage
                .execute(ctx)
                .await
                .map_err(|source| PipelineError::StageError { stage: name.clone(), source })?;

            if !outcome.success {
                return Err(PipelineError::StageFailed {
                    stage: name,
                    reason: outcome.error.unwrap_or_else(|| "stage reported failure with no reason".into()),
                });
            }

            ctx = outcome.context;

            if let Some(state) = &self.state {
                for effect in outcome.effects {
                    if let Err(err) = apply_effect(state, effect).await {
                        tracing::warn!(stage = %name, error = %err, "failed to apply stage effect");
                    }
                }
            } else if !outcome.effects.is_empty() {
                tracing::warn!(stage = %name, count = outcome.effects.len(), "stage declared effects but no state store is configured");
            }

            if let Some((_, post)) = points {
                ctx = self.dispatch_post(post, &name, ctx).await?;
            }
        }

        Ok(ctx)
    }

    async fn dispatch_pre(&self, point: HookPoint, stage_name: &str, ctx: PipelineContext) -> Result<PipelineContext, PipelineError> {
        let mut hook_ctx = HookContext::new(point, stage_name);
        hook_ctx.stage_input = serde_json::to_value(&ctx).ok();
        hook_ctx.tokens_used = ctx.metadata.tokens_in + ctx.metadata.tokens_out;
        hook_ctx.cost = ctx.metadata.cost;
        hook_ctx.stages_completed = ctx.metadata.stages_completed;
        hook_ctx.elapsed = ctx.metadata.duration;

        match self.hooks.dispatch(&hook_ctx).await {
            HookAction::Continue => Ok(ctx),
            HookAction::Halt { reason } => Err(PipelineError::HookHalt {
                stage: stage_name.to_string(),
                reason,
            }),
            HookAction::ModifyInput { new_input } => serde_json::from_value(new_input).map_err(|e| PipelineError::MalformedHookPayload {
                stage: stage_name.to_string(),
                reason: e.to_string(),
            }),
            HookAction::ModifyOutput { .. } => Err(PipelineError::MalformedHookPayload {
                stage: stage_name.to_string(),
                reason: "ModifyOutput is only valid at a Post* hook point".into(),
            }),
        }
    }

    async fn dispatch_post(&self, point: HookPoint, stage_name: &str, ctx: PipelineContext) -> Result<PipelineContext, PipelineError> {
        let mut hook_ctx = HookContext::new(point, stage_name);
        hook_ctx.stage_output = serde_json::to_value(&ctx).ok();
        hook_ctx.tokens_used = ctx.metadata.tokens_in + ctx.metadata.tokens_out;
        hook_ctx.cost = ctx.metadata.cost;
        hook_ctx.stages_completed = ctx.metadata.stages_completed;
        hook_ctx.elapsed = ctx.metadata.duration;

        match self.hooks.dispatch(&hook_ctx).await {
            HookAction::Continue => Ok(ctx),
            HookAction::Halt { reason } => Err(PipelineError::HookHalt {
                stage: stage_name.to_string(),
                reason,
            }),
            HookAction::ModifyOutput { new_output } => serde_json::from_value(new_output).map_err(|e| PipelineError::MalformedHookPayload {
                stage: stage_name.to_string(),
                reason: e.to_string(),
            }),
            HookAction::ModifyInput { .. } => Err(PipelineError::MalformedHookPayload {
                stage: stage_name.to_string(),
                reason: "ModifyInput is only valid at a Pre* hook point".into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use layer0::error::StageError;
    use layer0::hook::Hook;
    use layer0::id::{CollectionId, UserId};
    use layer0::stage::{Stage as _, StageOutcome};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingStage {
        stage_name: &'static str,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Stage for CountingStage {
        fn name(&self) -> &str {
            self.stage_name
        }

        async fn execute(&self, mut ctx: PipelineContext) -> Result<StageOutcome, StageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ctx.metadata.stages_completed += 1;
            Ok(StageOutcome::ok(ctx))
        }
    }

    struct FailingStage;

    #[async_trait]
    impl Stage for FailingStage {
        fn name(&self) -> &str {
            "retrieval"
        }

        async fn execute(&self, ctx: PipelineContext) -> Result<StageOutcome, StageError> {
            Ok(StageOutcome::failed(ctx, "no documents found"))
        }
    }

    struct HaltingHook;

    #[async_trait]
    impl Hook for HaltingHook {
        fn points(&self) -> &[HookPoint] {
            &[HookPoint::PreRetrieval]
        }

        async fn on_event(&self, _ctx: &HookContext) -> Result<HookAction, layer0::error::HookError> {
            Ok(HookAction::Halt { reason: "budget exceeded".into() })
        }
    }

    fn ctx() -> PipelineContext {
        PipelineContext::new(UserId::new("u"), CollectionId::new("c"), "q")
    }

    #[tokio::test]
    async fn runs_every_stage_in_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let executor = PipelineExecutor::new(
            vec![
                Arc::new(CountingStage { stage_name: "query_rewrite", calls: calls.clone() }),
                Arc::new(CountingStage { stage_name: "retrieval", calls: calls.clone() }),
            ],
            HookRegistry::new(),
            None,
            Duration::from_secs(5),
        );

        let result = executor.run(ctx()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(result.metadata.stages_completed, 2);
    }

    #[tokio::test]
    async fn stage_failure_short_circuits() {
        let executor = PipelineExecutor::new(vec![Arc::new(FailingStage)], HookRegistry::new(), None, Duration::from_secs(5));
        let err = executor.run(ctx()).await.unwrap_err();
        assert!(matches!(err, PipelineError::StageFailed { stage, .. } if stage == "retrieval"));
    }

    #[tokio::test]
    async fn hook_halt_stops_the_run() {
        let mut hooks = HookRegistry::new();
        hooks.add(Arc::new(HaltingHook));
        let calls = Arc::new(AtomicUsize::new(0));
        let executor = PipelineExecutor::new(
            vec![Arc::new(CountingStage { stage_name: "retrieval", calls: calls.clone() })],
            hooks,
            None,
            Duration::from_secs(5),
        );

        let err = executor.run(ctx()).await.unwrap_err();
        assert!(matches!(err, PipelineError::HookHalt { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn deadline_exceeded_when_a_stage_never_returns() {
        struct StallingStage;

        #[async_trait]
        impl Stage for StallingStage {
            fn name(&self) -> &str {
                "retrieval"
            }

            async fn execute(&self, ctx: PipelineContext) -> Result<StageOutcome, StageError> {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(StageOutcome::ok(ctx))
            }
        }

        let executor = PipelineExecutor::new(vec![Arc::new(StallingStage)], HookRegistry::new(), None, Duration::from_millis(10));
        let err = executor.run(ctx()).await.unwrap_err();
        assert!(matches!(err, PipelineError::DeadlineExceeded(_)));
    }
}
