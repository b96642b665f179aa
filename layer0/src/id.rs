//! Typed ID wrappers for users, collections, sessions, and pipelines.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Typed ID wrappers prevent mixing up user IDs, session IDs, etc.
/// These are just strings underneath — no UUID enforcement, no format
/// requirement. The protocol doesn't care what your IDs look like,
/// though callers typically store a `uuid::Uuid::to_string()`.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            /// Create a new typed ID from anything that converts to String.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

typed_id!(UserId, "Unique identifier for a user.");
typed_id!(CollectionId, "Unique identifier for a document collection.");
typed_id!(SessionId, "Unique identifier for a conversation session.");
typed_id!(PipelineId, "Unique identifier for a pipeline configuration.");
typed_id!(ProviderId, "Unique identifier for an LLM provider.");
typed_id!(TemplateId, "Unique identifier for a prompt template.");
typed_id!(ScopeId, "Unique identifier for a state scope.");
typed_id!(ParameterSetId, "Unique identifier for a named LLM parameter set.");
