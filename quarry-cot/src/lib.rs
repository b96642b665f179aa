#![deny(missing_docs)]
//! Chain-of-thought decomposition engine for the quarry RAG pipeline.
//!
//! Complex queries are split into ordered sub-questions, each answered
//! with its own retrieval pass while threading prior answers forward as
//! context. [`CotEngine`] implements `layer0::Stage` directly, so the
//! pipeline executor schedules it like any other stage; simple queries
//! pass through unchanged.

mod complexity;
mod decompose;
mod engine;
mod llm_classify;
mod llm_decompose;
mod summarize;

pub use complexity::{classify, Complexity};
pub use decompose::decompose_query;
pub use engine::{CotConfig, CotEngine};
pub use llm_classify::classify_via_llm;
pub use llm_decompose::decompose_via_llm;
pub use summarize::key_points_only;
