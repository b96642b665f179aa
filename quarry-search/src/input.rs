//! Request DTO for [`crate::SearchService::search`].

use layer0::id::{CollectionId, UserId};
use serde::Deserialize;
use std::collections::HashMap;

/// A search request.
///
/// Deliberately has no `pipeline_id` field and rejects unknown fields at
/// deserialization: the service resolves the pipeline from `(user_id,
/// collection_id)` itself, so a caller-supplied pipeline id — which
/// would let one user address another's pipeline configuration — is
/// rejected at the boundary rather than silently ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchInput {
    /// The user's question. Validated non-empty after trimming.
    pub question: String,
    /// Collection to search within.
    pub collection_id: CollectionId,
    /// User issuing the request, used to resolve the pipeline and the
    /// default template.
    pub user_id: UserId,
    /// Per-call overrides layered on top of the resolved pipeline's own
    /// `config_metadata` (see `quarry_config::resolve`).
    #[serde(default)]
    pub config_metadata: Option<HashMap<String, serde_json::Value>>,
}

impl SearchInput {
    /// Build a request directly (bypassing the `deny_unknown_fields`
    /// deserialization boundary, which only applies when parsing from
    /// wire JSON).
    pub fn new(question: impl Into<String>, collection_id: CollectionId, user_id: UserId) -> Self {
        Self {
            question: question.into(),
            collection_id,
            user_id,
            config_metadata: None,
        }
    }

    pub(crate) fn trimmed_question(&self) -> &str {
        self.question.trim()
    }
}

/// Caller-supplied request metadata that doesn't belong in [`SearchInput`]
/// itself: a correlation id for error responses and log lines.
#[derive(Debug, Clone, Default)]
pub struct SearchContext {
    /// Propagated into `SearchError::to_response`'s correlation id field.
    pub correlation_id: Option<String>,
}
