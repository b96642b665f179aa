use thiserror::Error;

/// Errors produced while resolving or loading settings.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A required environment variable was not set.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// A value was present but failed to parse into the expected type.
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// Name of the field that failed to parse.
        field: String,
        /// Human-readable reason the value was rejected.
        reason: String,
    },
}
