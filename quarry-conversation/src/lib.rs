#![deny(missing_docs)]
//! Conversation session, message, and summarization state for the
//! quarry RAG pipeline.
//!
//! [`ConversationManager`] owns the session lifecycle (spec.md §3's
//! Conversation Session/Message/Summary entities), assembles bounded
//! context windows via [`quarry_context::SlidingWindow`], rewrites
//! ambiguous follow-up questions, and delegates question-answering to
//! [`quarry_search::SearchService`].

mod context;
mod enhance;
mod error;
mod manager;
mod message;
mod session;
mod summary;

pub use context::{ContextEntry, ConversationContext, ANSWER_HEADROOM_RATIO};
pub use enhance::{distinct_user_messages, enhance_question, is_ambiguous};
pub use error::ConversationError;
pub use manager::{now_ms, ConversationManager, DEFAULT_TTL_SECS};
pub use message::{ConversationMessage, MessageRole, MessageType};
pub use session::{ConversationSession, SessionStatus};
pub use summary::{ConversationSummary, SummarizationStrategy};
