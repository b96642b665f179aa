//! The Stage protocol — one step of the search-and-conversation pipeline.

use crate::{content::Content, duration::DurationMs, effect::Effect, error::StageError, id::*};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A document chunk returned by retrieval, and carried forward (possibly
/// reordered or filtered) by reranking, reasoning, and generation.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedDocument {
    /// Identifier of the source document/chunk in the vector store.
    pub id: String,
    /// The chunk text.
    pub content: String,
    /// Similarity/relevance score. Retrieval sets this from the vector
    /// store; reranking may overwrite it with a cross-encoder score.
    pub score: f64,
    /// Collection-defined source label (filename, URL, title).
    pub source: Option<String>,
    /// Arbitrary passthrough metadata (page number, chunk index, ...).
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl RetrievedDocument {
    /// Create a new retrieved document with required fields.
    pub fn new(id: impl Into<String>, content: impl Into<String>, score: f64) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            score,
            source: None,
            metadata: serde_json::Value::Null,
        }
    }
}

/// One step of chain-of-thought reasoning over a decomposed sub-question.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningStep {
    /// The sub-question this step answers.
    pub sub_question: String,
    /// The model's answer to the sub-question.
    pub sub_answer: String,
    /// Documents retrieved specifically for this sub-question.
    pub supporting_documents: Vec<RetrievedDocument>,
    /// Confidence in this step's answer, in `[0.0, 1.0]`.
    pub confidence: f64,
}

/// The accumulated trace of a chain-of-thought run: ordered steps plus
/// the synthesis confidence derived from them.
#[non_exhaustive]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReasoningTrace {
    /// Steps in execution order.
    pub steps: Vec<ReasoningStep>,
    /// Overall confidence for the synthesized answer — the minimum of
    /// each step's confidence, per the chain-of-thought engine's contract.
    pub total_confidence: f64,
}

/// The single artifact threaded through every pipeline stage. Each stage
/// reads what earlier stages produced and fills in its own fields before
/// handing the context to the next stage — the same "mutated context
/// flows forward" shape a staged `BaseStage`/`StageResult` pipeline uses.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineContext {
    /// The user running this pipeline.
    pub user: UserId,
    /// The collection being searched.
    pub collection: CollectionId,
    /// Conversation session this run belongs to, if any.
    pub session: Option<SessionId>,
    /// The question as originally submitted.
    pub original_query: String,
    /// The question after query-rewrite normalization/expansion.
    pub rewritten_query: Option<String>,
    /// Documents returned by retrieval.
    pub retrieved: Vec<RetrievedDocument>,
    /// Documents after reranking, if reranking ran.
    pub reranked: Option<Vec<RetrievedDocument>>,
    /// Chain-of-thought trace, if reasoning ran.
    pub reasoning: Option<ReasoningTrace>,
    /// The generated answer, once the generation stage has run.
    pub answer: Option<Content>,
    /// Evaluation scores, once the evaluation stage has run.
    pub evaluation: Option<serde_json::Value>,
    /// Per-run configuration overrides.
    pub config: Option<StageConfig>,
    /// Accumulated execution metadata (cost, tokens, timing).
    pub metadata: StageMetadata,
    /// Opaque metadata that passes through unchanged (trace id, caller
    /// routing hints, and anything the protocol doesn't need to understand).
    #[serde(default)]
    pub extra: serde_json::Value,
}

impl PipelineContext {
    /// Start a new pipeline run for a query against a collection.
    pub fn new(user: UserId, collection: CollectionId, original_query: impl Into<String>) -> Self {
        Self {
            user,
            collection,
            session: None,
            original_query: original_query.into(),
            rewritten_query: None,
            retrieved: Vec::new(),
            reranked: None,
            reasoning: None,
            answer: None,
            evaluation: None,
            config: None,
            metadata: StageMetadata::default(),
            extra: serde_json::Value::Null,
        }
    }

    /// The query text a retrieval/reasoning stage should use: the
    /// rewritten query if one exists, otherwise the original.
    pub fn effective_query(&self) -> &str {
        self.rewritten_query.as_deref().unwrap_or(&self.original_query)
    }

    /// The documents a generation/reasoning stage should use: reranked
    /// if reranking ran, otherwise the raw retrieval results.
    pub fn effective_documents(&self) -> &[RetrievedDocument] {
        self.reranked.as_deref().unwrap_or(&self.retrieved)
    }
}

/// Per-run configuration overrides. Every field is optional — None means
/// "use the pipeline configuration's default."
#[non_exhaustive]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageConfig {
    /// Maximum chain-of-thought reasoning depth.
    pub max_reasoning_depth: Option<u32>,
    /// Maximum cost for this pipeline run in USD.
    pub max_cost: Option<Decimal>,
    /// Maximum wall-clock time for this pipeline run.
    pub max_duration: Option<DurationMs>,
    /// Model override (implementation-specific string).
    pub model: Option<String>,
    /// Additional prompt instructions to append to the generation prompt.
    pub system_addendum: Option<String>,
    /// Explicit LLM parameter set to use for generation, overriding the
    /// owner's default and any system default.
    pub parameter_id: Option<ParameterSetId>,
}

/// Execution metadata accumulated across stages. Every field is concrete
/// (not optional) because every pipeline run produces this data.
/// Implementations that can't track a field use zero/default.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageMetadata {
    /// Input tokens consumed so far.
    pub tokens_in: u64,
    /// Output tokens generated so far.
    pub tokens_out: u64,
    /// Cost in USD so far.
    pub cost: Decimal,
    /// Number of stages completed so far.
    pub stages_completed: u32,
    /// Wall-clock duration so far.
    pub duration: DurationMs,
}

impl Default for StageMetadata {
    fn default() -> Self {
        Self {
            tokens_in: 0,
            tokens_out: 0,
            cost: Decimal::ZERO,
            stages_completed: 0,
            duration: DurationMs::ZERO,
        }
    }
}

/// Outcome of running one stage: whether it succeeded, the (possibly
/// mutated) context to hand to the next stage, and an error when it
/// didn't — mirroring a Python `BaseStage`/`StageResult` contract.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageOutcome {
    /// Whether the stage completed successfully.
    pub success: bool,
    /// The context to pass to the next stage, mutated by this stage.
    pub context: PipelineContext,
    /// The error, if `success` is false.
    pub error: Option<String>,
    /// Side-effects this stage wants executed by the pipeline executor.
    ///
    /// CRITICAL DESIGN DECISION: the stage declares effects but does not
    /// execute them. The calling layer (the pipeline executor) decides
    /// when and how to execute them. This is what makes stages
    /// independent of the persistence layer around them.
    #[serde(default)]
    pub effects: Vec<Effect>,
}

impl StageOutcome {
    /// A successful outcome carrying the mutated context forward.
    pub fn ok(context: PipelineContext) -> Self {
        Self {
            success: true,
            context,
            error: None,
            effects: vec![],
        }
    }

    /// A failed outcome. The context is still returned so the executor
    /// can log/persist whatever was accumulated before the failure.
    pub fn failed(context: PipelineContext, error: impl Into<String>) -> Self {
        Self {
            success: false,
            context,
            error: Some(error.into()),
            effects: vec![],
        }
    }

    /// Attach effects to this outcome.
    pub fn with_effects(mut self, effects: Vec<Effect>) -> Self {
        self.effects = effects;
        self
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// THE TRAIT
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Protocol ① — The Stage
///
/// One step of the search-and-conversation pipeline: query rewrite,
/// retrieval, reranking, reasoning, generation, or evaluation.
///
/// Implementations:
/// - the concrete stages in `quarry-pipeline` and `quarry-cot`
/// - a mock stage (for testing the pipeline executor's wiring)
///
/// The trait is intentionally one method. A stage is atomic from the
/// outside — it receives a context, it returns an outcome. Everything
/// that happens inside (how many model calls, what retry policy) is
/// the implementation's concern.
#[async_trait]
pub trait Stage: Send + Sync {
    /// A short, stable name used in tracing spans and hook contexts
    /// (e.g. `"retrieval"`, `"reranking"`, `"reasoning"`).
    fn name(&self) -> &str;

    /// Execute this stage against the current pipeline context.
    ///
    /// The stage MAY read from a StateStore (e.g. to look up a pipeline
    /// configuration). The stage MUST NOT write to external state
    /// directly — it declares writes as Effects in the outcome.
    async fn execute(&self, ctx: PipelineContext) -> Result<StageOutcome, StageError>;
}
