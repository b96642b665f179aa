//! Lifecycle events — cross-protocol coordination vocabulary.
//!
//! These are NOT a trait — they're a shared vocabulary. Each protocol
//! emits and/or consumes these events through whatever mechanism
//! is appropriate (channels, callbacks, event bus, direct calls).
//!
//! The Lifecycle Interface is deliberately not a trait because
//! lifecycle coordination is the pipeline executor's job. It listens
//! for events, applies policies (downgrade model, halt run, trigger
//! summarization), and takes action. There's no separate "lifecycle
//! service" — it's a responsibility of the orchestration layer.

use crate::{duration::DurationMs, effect::Scope, id::*};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Budget-related events.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BudgetEvent {
    /// Emitted after each model call.
    CostIncurred {
        /// The session the cost was incurred under, if any.
        session: Option<SessionId>,
        /// Cost of this individual operation.
        cost: Decimal,
        /// Cumulative cost so far for this pipeline run.
        cumulative: Decimal,
    },
    /// Emitted when nearing a configured limit.
    BudgetWarning {
        /// The session approaching its budget limit.
        session: Option<SessionId>,
        /// Amount spent so far.
        spent: Decimal,
        /// The budget limit.
        limit: Decimal,
    },
    /// Decision made in response to budget pressure.
    BudgetAction {
        /// The session the decision applies to.
        session: Option<SessionId>,
        /// The budget decision.
        action: BudgetDecision,
    },
}

/// What gets decided in response to budget pressure.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetDecision {
    /// Continue as normal.
    Continue,
    /// Switch to a cheaper model.
    DowngradeModel {
        /// The model being switched from.
        from: String,
        /// The model being switched to.
        to: String,
    },
    /// Stop the pipeline run.
    HaltRun,
    /// Request more budget from the caller.
    RequestIncrease {
        /// The additional amount requested.
        amount: Decimal,
    },
}

/// Context pressure events — for conversation context compaction
/// coordination (see `SlidingWindow` / `ContextStrategy`).
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CompactionEvent {
    /// Emitted when a session's context window is filling.
    ContextPressure {
        /// The session experiencing context pressure.
        session: SessionId,
        /// Percentage of context window used.
        fill_percent: f64,
        /// Tokens currently used.
        tokens_used: u64,
        /// Tokens still available.
        tokens_available: u64,
    },
    /// Emitted before compaction to trigger a summary flush.
    PreCompactionFlush {
        /// The session about to compact.
        session: SessionId,
        /// The scope to flush.
        scope: Scope,
    },
    /// Emitted after compaction completes.
    CompactionComplete {
        /// The session that completed compaction.
        session: SessionId,
        /// The compaction/summarization strategy used.
        strategy: String,
        /// Number of tokens freed.
        tokens_freed: u64,
    },
}

/// Observability events — the common vocabulary all layers emit.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservableEvent {
    /// Which protocol emitted this.
    pub source: EventSource,
    /// Event type (free-form, namespaced by convention).
    pub event_type: String,
    /// When it happened (milliseconds since pipeline run start, not wall clock).
    pub timestamp: DurationMs,
    /// Event payload.
    pub data: serde_json::Value,
    /// Correlation ID across protocols.
    pub trace_id: Option<String>,
    /// Session context.
    pub session_id: Option<SessionId>,
    /// Pipeline context.
    pub pipeline_id: Option<PipelineId>,
}

/// Which protocol layer emitted an event.
#[non_exhaustive]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum EventSource {
    /// From a pipeline stage.
    Stage,
    /// From the pipeline executor.
    Pipeline,
    /// From the state store.
    State,
    /// From a hook.
    Hook,
}

impl ObservableEvent {
    /// Create a new observable event with required fields.
    pub fn new(
        source: EventSource,
        event_type: impl Into<String>,
        timestamp: DurationMs,
        data: serde_json::Value,
    ) -> Self {
        Self {
            source,
            event_type: event_type.into(),
            timestamp,
            data,
            trace_id: None,
            session_id: None,
            pipeline_id: None,
        }
    }
}
