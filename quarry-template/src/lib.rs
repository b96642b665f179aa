//! # quarry-template — prompt template storage, validation, and rendering
//!
//! Stores [`PromptTemplate`]s with the placeholder/`input_variables`
//! invariant enforced at construction, validates variables against an
//! optional per-variable [`VariableSchema`] at render time, and resolves
//! which template to use via [`TemplateRegistry`]'s explicit-id /
//! user-default / system-default selection policy.

#![deny(missing_docs)]

mod error;
mod registry;
mod template;

pub use error::TemplateError;
pub use registry::TemplateRegistry;
pub use template::{PromptTemplate, RenderedPrompt, TemplateType, VariableSchema, VariableType};
