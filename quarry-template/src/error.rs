//! Errors raised by template validation, rendering, and selection.

use thiserror::Error;

/// Errors from constructing, rendering, or looking up a [`crate::PromptTemplate`].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum TemplateError {
    /// A `{placeholder}` in `template_format` has no matching entry in
    /// `input_variables`.
    #[error("placeholder {0:?} is not declared in input_variables")]
    UndeclaredPlaceholder(String),

    /// Rendering was called without a value for a declared variable.
    #[error("missing variables: {0:?}")]
    MissingVariables(Vec<String>),

    /// A variable's value didn't match its declared schema.
    #[error("variable {name:?} failed validation: {reason}")]
    SchemaViolation {
        /// The variable that failed.
        name: String,
        /// Why it failed (type mismatch, too short, etc.).
        reason: String,
    },

    /// No template matched the selection policy (explicit id, user
    /// default, system default).
    #[error("no template found for type {0:?}")]
    TemplateNotFound(String),
}
