//! # layer0 — Protocol traits for a retrieval-augmented generation pipeline
//!
//! This crate defines the protocol boundaries that compose to form the
//! search-and-conversation pipeline: one step of the pipeline (a
//! [`Stage`]), how its results persist ([`StateStore`]), and the two
//! cross-cutting interfaces used to observe and coordinate it ([`Hook`],
//! [`BudgetEvent`]/[`CompactionEvent`]).
//!
//! ## The Protocols
//!
//! | Protocol | Trait | What it does |
//! |----------|-------|-------------|
//! | ① Stage | [`Stage`] | One step of the pipeline (rewrite, retrieve, rerank, reason, generate, evaluate) |
//! | ② State | [`StateStore`] | How data persists across pipeline runs and sessions |
//!
//! ## The Interfaces
//!
//! | Interface | Types | What it does |
//! |-----------|-------|-------------|
//! | ③ Hooks | [`Hook`], [`HookPoint`], [`HookAction`] | Observation + intervention at stage boundaries |
//! | ④ Lifecycle | [`BudgetEvent`], [`CompactionEvent`] | Cross-layer budget and context-compaction coordination |
//!
//! ## Design Principle
//!
//! Every protocol trait is operation-defined, not mechanism-defined.
//! [`Stage::execute`] means "run this step of the pipeline against the
//! current context" — not "call this particular HTTP endpoint." This is
//! what makes implementations swappable: an in-memory vector store and a
//! production one both implement [`StateStore`]; a heuristic reranker and
//! a cross-encoder reranker are interchangeable callers of [`Stage`].
//!
//! ## Dependency Notes
//!
//! This crate depends on `serde_json::Value` for extension data fields
//! (metadata, evaluation scores, custom payloads). This is an intentional
//! choice: JSON is the universal interchange format here, and
//! `serde_json::Value` is the de facto standard in the Rust ecosystem.
//! The alternative (generic `T: Serialize`) would complicate trait object
//! safety without practical benefit.
//!
//! ## Future: Native Async Traits
//!
//! Protocol traits currently use `async-trait` (heap-allocated futures).
//! When Rust stabilizes `async fn in dyn Trait` with `Send` bounds,
//! these traits will migrate to native async. This will be a breaking
//! change in a minor version bump before v1.0.

#![deny(missing_docs)]

pub mod content;
pub mod duration;
pub mod effect;
pub mod error;
pub mod hook;
pub mod id;
pub mod lifecycle;
pub mod stage;
pub mod state;

#[cfg(feature = "test-utils")]
pub mod test_utils;

// Re-exports for convenience
pub use content::{Content, ContentBlock};
pub use duration::DurationMs;
pub use effect::{Effect, LogLevel, Scope};
pub use error::{HookError, StageError, StateError};
pub use hook::{Hook, HookAction, HookContext, HookPoint};
pub use id::{CollectionId, ParameterSetId, PipelineId, ProviderId, ScopeId, SessionId, TemplateId, UserId};
pub use lifecycle::{BudgetEvent, CompactionEvent, ObservableEvent};
pub use stage::{
    PipelineContext, ReasoningStep, ReasoningTrace, RetrievedDocument, Stage, StageConfig,
    StageMetadata, StageOutcome,
};
pub use state::{SearchResult, StateReader, StateStore};
