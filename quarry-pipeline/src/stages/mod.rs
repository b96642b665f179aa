//! Concrete `Stage` implementations composed by the executor in canonical
//! order: rewrite, retrieval, reranking, reasoning (`quarry-cot::CotEngine`),
//! generation, evaluation.

mod evaluation;
mod generation;
mod reranking;
mod retrieval;
mod rewrite;

pub use evaluation::EvaluationStage;
pub use generation::GenerationStage;
pub use reranking::RerankingStage;
pub use retrieval::RetrievalStage;
pub use rewrite::RewriteStage;
