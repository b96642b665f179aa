//! Conversation messages: immutable once committed.

use layer0::content::Content;
use layer0::duration::DurationMs;
use layer0::id::SessionId;
use serde::{Deserialize, Serialize};

/// Who a message is attributed to.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// The human user.
    User,
    /// The LLM's reply.
    Assistant,
    /// System-generated notices (e.g. "session was summarized").
    System,
}

/// What kind of turn a message represents, independent of its role.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// A user's question.
    Question,
    /// An assistant's answer.
    Answer,
    /// A user's follow-up on a prior question.
    FollowUp,
    /// A clarifying question, from either side.
    Clarification,
    /// A system-authored summary of earlier messages.
    Summary,
    /// Any other system notice (session paused, expired, etc.).
    SystemNotice,
}

/// One message in a session's history.
///
/// Messages are append-only: nothing in this crate mutates a message's
/// `content` after construction. `subsumed` is the one field a summary
/// pass is allowed to flip, and it never deletes the row — §3's
/// "delete cascades with session" rule is the only deletion path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// Caller-supplied unique id.
    pub id: String,
    /// The session this message belongs to.
    pub session: SessionId,
    /// Who said it.
    pub role: MessageRole,
    /// What kind of turn it is.
    pub message_type: MessageType,
    /// The message body.
    pub content: Content,
    /// Token count, computed at append time if not supplied.
    pub token_count: Option<u64>,
    /// How long this message took to produce (set for assistant replies
    /// that went through the search pipeline).
    pub execution_time: Option<DurationMs>,
    /// Caller-defined metadata, opaque to the manager.
    pub metadata: serde_json::Value,
    /// Epoch milliseconds at append time.
    pub created_at: u64,
    /// Set by `summarize_if_needed` once a summary covers this message.
    /// `get_context` excludes subsumed messages in favor of the summary
    /// that replaced them.
    pub subsumed: bool,
}

impl ConversationMessage {
    /// Construct a message with no token count or execution time yet.
    pub fn new(
        id: impl Into<String>,
        session: SessionId,
        role: MessageRole,
        message_type: MessageType,
        content: Content,
        created_at: u64,
    ) -> Self {
        Self {
            id: id.into(),
            session,
            role,
            message_type,
            content,
            token_count: None,
            execution_time: None,
            metadata: serde_json::Value::Null,
            created_at,
            subsumed: false,
        }
    }

    /// Attach a known token count (builder-style).
    pub fn with_token_count(mut self, tokens: u64) -> Self {
        self.token_count = Some(tokens);
        self
    }

    /// Attach a known execution time (builder-style).
    pub fn with_execution_time(mut self, duration: DurationMs) -> Self {
        self.execution_time = Some(duration);
        self
    }

    /// The message's text, if it has one.
    pub fn text(&self) -> Option<&str> {
        self.content.as_text()
    }
}
