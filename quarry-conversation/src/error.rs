//! Errors raised by the conversation manager.

use layer0::id::SessionId;
use thiserror::Error;

/// Errors from [`crate::manager::ConversationManager`]'s operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConversationError {
    /// The request failed validation (empty session name, unknown export format).
    #[error("validation error: {0}")]
    ValidationError(String),

    /// No session exists with the given id.
    #[error("session not found: {0}")]
    NotFound(SessionId),

    /// The session's status is `expired`; no operation but reads is permitted.
    #[error("session {0} has expired")]
    SessionExpired(SessionId),

    /// The session's status is `paused` or `archived`; it does not accept new messages.
    #[error("session {0} does not accept new messages in its current state")]
    MessagesNotAccepted(SessionId),

    /// The underlying search pipeline failed while answering a message.
    #[error(transparent)]
    Search(#[from] quarry_search::SearchError),

    /// The state store failed to read or write session data.
    #[error(transparent)]
    State(#[from] layer0::error::StateError),
}
