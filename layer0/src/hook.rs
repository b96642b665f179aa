//! The Hook interface — observation and intervention in the pipeline's stage sequence.

use crate::{content::Content, error::HookError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Where in the pipeline a hook fires. One pair per stage, matching the
/// pipeline executor's stage sequence (query rewrite, retrieval,
/// reranking, reasoning, generation, evaluation).
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookPoint {
    /// Before query rewriting.
    PreRewrite,
    /// After query rewriting.
    PostRewrite,
    /// Before vector store retrieval.
    PreRetrieval,
    /// After vector store retrieval.
    PostRetrieval,
    /// Before reranking.
    PreRerank,
    /// After reranking.
    PostRerank,
    /// Before chain-of-thought reasoning.
    PreReasoning,
    /// After chain-of-thought reasoning.
    PostReasoning,
    /// Before the final generation call.
    PreGeneration,
    /// After the final generation call.
    PostGeneration,
    /// Before evaluation.
    PreEvaluation,
    /// After evaluation.
    PostEvaluation,
}

/// What context is available to a hook at its firing point.
/// Read-only — hooks observe and decide, they don't mutate directly.
/// (Mutation happens via HookAction::Modify.)
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookContext {
    /// Current hook point.
    pub point: HookPoint,
    /// Name of the stage this hook point brackets (e.g. "retrieval").
    pub stage_name: String,
    /// Stage input, when available at this point.
    pub stage_input: Option<serde_json::Value>,
    /// Stage output, when available at this point (Post* points).
    pub stage_output: Option<serde_json::Value>,
    /// Model response, if this point follows a model call.
    pub model_output: Option<Content>,
    /// Running count of tokens used so far in the pipeline run.
    pub tokens_used: u64,
    /// Running cost in USD.
    pub cost: rust_decimal::Decimal,
    /// Number of stages completed so far.
    pub stages_completed: u32,
    /// Time elapsed since the pipeline run started.
    pub elapsed: crate::duration::DurationMs,
}

impl HookContext {
    /// Create a new HookContext with only the hook point and stage name set.
    pub fn new(point: HookPoint, stage_name: impl Into<String>) -> Self {
        Self {
            point,
            stage_name: stage_name.into(),
            stage_input: None,
            stage_output: None,
            model_output: None,
            tokens_used: 0,
            cost: rust_decimal::Decimal::ZERO,
            stages_completed: 0,
            elapsed: crate::duration::DurationMs::ZERO,
        }
    }
}

/// What a hook decides to do.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum HookAction {
    /// Continue normally.
    Continue,
    /// Halt the pipeline run (observer tripwire). The run exits with
    /// a halted-by-hook error.
    Halt {
        /// Reason for halting.
        reason: String,
    },
    /// Replace the stage input before it runs (only valid at Pre* points).
    ModifyInput {
        /// The replacement stage input.
        new_input: serde_json::Value,
    },
    /// Replace the stage output after it runs (only valid at Post* points).
    ModifyOutput {
        /// The replacement stage output.
        new_output: serde_json::Value,
    },
}

/// A hook that can observe and intervene in the pipeline's stage sequence.
///
/// Hooks are registered externally (by the pipeline executor or search
/// facade) and the pipeline runtime calls them at the defined points.
/// The stage itself doesn't know who's watching.
///
/// Implementations:
/// - a budget hook: track cost, halt if over budget
/// - an evaluation hook: score the final answer against ground truth
/// - a telemetry hook: emit tracing spans for dashboards
///
/// Hook handlers SHOULD complete quickly. A hook that calls a model on
/// every stage boundary adds latency to every pipeline run. The
/// performance cost is the hook author's responsibility.
#[async_trait]
pub trait Hook: Send + Sync {
    /// Which points this hook fires at.
    fn points(&self) -> &[HookPoint];

    /// Called at each registered hook point.
    /// Returning an error does NOT halt the pipeline — it logs the error
    /// and continues. Use HookAction::Halt to halt.
    async fn on_event(&self, ctx: &HookContext) -> Result<HookAction, HookError>;
}
