//! Context window assembly: merging live messages and summaries into a
//! bounded window to hand to the next generation call.

use crate::message::{ConversationMessage, MessageRole};
use crate::summary::ConversationSummary;
use layer0::id::SessionId;
use quarry_context::SlidingWindow;
use quarry_provider::context::ContextStrategy;
use quarry_provider::types::{ProviderMessage, Role};
use serde::Serialize;

/// One entry in an assembled context window.
#[derive(Debug, Clone, Serialize)]
pub enum ContextEntry {
    /// A live (non-subsumed) message.
    Message {
        /// Who said it.
        role: MessageRole,
        /// Its text.
        content: String,
    },
    /// A summary standing in for messages it subsumed.
    Summary {
        /// The summary text.
        text: String,
    },
}

/// The window `get_context` hands back: chronological entries plus the
/// token total they add up to.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationContext {
    /// The session this window was assembled for.
    pub session: SessionId,
    /// Entries in chronological order.
    pub entries: Vec<ContextEntry>,
    /// Total estimated tokens across `entries`. Always `<= context_window_size`
    /// (spec.md §8 invariant 3), since the assembly compacts to fit.
    pub total_tokens: u64,
}

/// Fraction of `context_window_size` reserved for the next answer
/// rather than spent on history.
pub const ANSWER_HEADROOM_RATIO: f64 = 0.15;

fn to_provider_role(role: MessageRole) -> Role {
    match role {
        MessageRole::User => Role::User,
        MessageRole::Assistant => Role::Assistant,
        MessageRole::System => Role::System,
    }
}

fn from_provider_role(role: Role) -> MessageRole {
    match role {
        Role::User => MessageRole::User,
        Role::Assistant => MessageRole::Assistant,
        Role::System => MessageRole::System,
    }
}

/// Assemble a [`ConversationContext`] for a session.
///
/// Active (non-subsumed) messages and any summaries covering elided
/// ones are merged chronologically — a summary sorts at the position
/// of the earliest message it subsumes — then compacted to fit
/// `context_window_size` minus [`ANSWER_HEADROOM_RATIO`] via
/// [`quarry_context::SlidingWindow`], the same strategy `quarry-provider`
/// uses to trim a live prompt before a generation call.
///
/// `up_to_created_at` restricts the window to entries at or before that
/// timestamp, for reconstructing context as of a point in the session's
/// past.
pub fn get_context(
    session_id: &SessionId,
    messages: &[ConversationMessage],
    summaries: &[ConversationSummary],
    context_window_size: u64,
    up_to_created_at: Option<u64>,
) -> ConversationContext {
    let mut timestamped: Vec<(u64, Role, String)> = Vec::new();

    for summary in summaries {
        if up_to_created_at.is_some_and(|cutoff| summary.covers_from > cutoff) {
            continue;
        }
        timestamped.push((summary.covers_from, Role::System, summary.summary.clone()));
    }

    for message in messages {
        if message.subsumed {
            continue;
        }
        if up_to_created_at.is_some_and(|cutoff| message.created_at > cutoff) {
            continue;
        }
        if let Some(text) = message.text() {
            timestamped.push((message.created_at, to_provider_role(message.role), text.to_string()));
        }
    }

    timestamped.sort_by_key(|(created_at, _, _)| *created_at);

    let provider_messages: Vec<ProviderMessage> =
        timestamped.into_iter().map(|(_, role, text)| ProviderMessage::text(role, text)).collect();

    let budget = ((context_window_size as f64) * (1.0 - ANSWER_HEADROOM_RATIO)).floor() as usize;
    let strategy = SlidingWindow::new();

    // `SlidingWindow::compact` halves the list toward roughly half its
    // own token total per call, not straight down to `budget` — repeat
    // until under budget or it can no longer shrink (<= 2 messages left).
    let mut windowed = provider_messages;
    while strategy.should_compact(&windowed, budget) {
        let before = windowed.len();
        windowed = strategy.compact(windowed);
        if windowed.len() == before {
            break;
        }
    }

    let total_tokens = strategy.token_estimate(&windowed) as u64;

    let entries = windowed
        .into_iter()
        .map(|message| match message.role {
            Role::System => ContextEntry::Summary { text: message.text_content() },
            role => ContextEntry::Message { role: from_provider_role(role), content: message.text_content() },
        })
        .collect();

    ConversationContext { session: session_id.clone(), entries, total_tokens }
}
