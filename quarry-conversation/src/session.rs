//! Conversation session state and its lifecycle.

use layer0::id::{CollectionId, SessionId, UserId};
use serde::{Deserialize, Serialize};

/// A session's place in its lifecycle.
///
/// ```text
/// created -> active <-> paused -> archived
///               v
///            expired
/// ```
///
/// `expired` is set by [`crate::manager::ConversationManager::cleanup_expired_sessions`]
/// when a session's `updated_at` is older than the configured TTL and the
/// session isn't pinned; it can be reached from any non-archived state.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Just created; behaves like `Active` but not yet touched by a message.
    Created,
    /// Normal operation: reads and appends both permitted.
    Active,
    /// No new messages accepted; reads permitted.
    Paused,
    /// Read-only; excluded from default listings.
    Archived,
    /// Set by the periodic sweeper; reads permitted, no new messages.
    Expired,
}

impl SessionStatus {
    /// Whether a session in this state accepts new messages via
    /// `add_message`/`process_user_message`.
    pub fn accepts_messages(&self) -> bool {
        matches!(self, SessionStatus::Created | SessionStatus::Active)
    }
}

/// A conversational session: the container for an ordered set of
/// messages and the summaries that periodically subsume them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    /// Caller-supplied unique id.
    pub id: SessionId,
    /// The user who owns this session.
    pub user: UserId,
    /// The collection this session's questions are answered against.
    /// Referenced, not owned — deleting the collection does not delete
    /// the session; its history persists with a dangling reference.
    pub collection: CollectionId,
    /// Display name, required to be non-empty at creation.
    pub name: String,
    /// Current lifecycle state.
    pub status: SessionStatus,
    /// Token budget for `get_context`'s assembled window.
    pub context_window_size: u64,
    /// Soft cap on messages before older ones become eligible for
    /// summarization even under the token budget.
    pub max_messages: usize,
    /// Pinned sessions are never swept into `expired`.
    pub pinned: bool,
    /// Epoch milliseconds at creation.
    pub created_at: u64,
    /// Epoch milliseconds of the last message append or status change.
    pub updated_at: u64,
    /// Caller-defined metadata, opaque to the manager.
    pub session_metadata: serde_json::Value,
}

impl ConversationSession {
    /// Create a new session in the `Created` state.
    pub fn new(
        id: SessionId,
        user: UserId,
        collection: CollectionId,
        name: impl Into<String>,
        context_window_size: u64,
        now: u64,
    ) -> Self {
        Self {
            id,
            user,
            collection,
            name: name.into(),
            status: SessionStatus::Created,
            context_window_size,
            max_messages: usize::MAX,
            pinned: false,
            created_at: now,
            updated_at: now,
            session_metadata: serde_json::Value::Null,
        }
    }

    /// Whether this session is due for expiry: not pinned, not already
    /// archived, and idle for at least `ttl_secs`.
    pub fn is_due_for_expiry(&self, now: u64, ttl_secs: u64) -> bool {
        if self.pinned || self.status == SessionStatus::Archived || self.status == SessionStatus::Expired {
            return false;
        }
        now.saturating_sub(self.updated_at) >= ttl_secs.saturating_mul(1000)
    }
}
