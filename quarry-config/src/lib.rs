#![deny(missing_docs)]
//! Hierarchical settings resolution for the quarry RAG pipeline.
//!
//! [`Settings`] is parsed once from the environment at process start-up
//! and wrapped in an `Arc` by the caller; it is never mutated. Individual
//! lookups go through [`resolve`], which layers a pipeline's own
//! `config_metadata` on top of the process-wide settings, falling back
//! to a caller-supplied default.

mod error;
mod resolve;
mod settings;

pub use error::ConfigError;
pub use resolve::resolve;
pub use settings::{RetrievalKind, Settings};
