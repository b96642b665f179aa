//! # quarry-retrieval — vector store and reranker contracts
//!
//! The retrieval layer of the search pipeline: a pluggable [`VectorStore`]
//! for upserting and searching embedded document chunks, and a pluggable
//! [`Reranker`] for reordering candidate hits by relevance.
//!
//! Both traits are `#[async_trait]`, matching `layer0::state::StateStore` —
//! the pipeline always holds them as `Arc<dyn VectorStore>` / `Arc<dyn
//! Reranker>`, so there is no benefit to the RPITIT dance `quarry-provider`
//! uses for its generic, non-boxed `Provider` trait.

#![deny(missing_docs)]

pub mod error;
pub mod memory;
pub mod rerank;
pub mod store;
pub mod types;

pub use error::RetrievalError;
pub use memory::InMemoryVectorStore;
pub use rerank::{NoopReranker, OverlapReranker, Reranker};
pub use store::VectorStore;
pub use types::{SearchFilter, VectorHit, VectorRecord};
