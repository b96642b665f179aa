//! Context strategy for managing the conversation window sent to a
//! provider. Shared by provider-side truncation here and by
//! `quarry-conversation`'s history compaction — both trim the same
//! `ProviderMessage` sequence, just at different points in the pipeline.

use crate::types::{ContentPart, ProviderMessage};

/// Strategy for keeping a message list under a provider's context window.
///
/// Implementations: [`NoCompaction`] (passthrough), `SlidingWindow` in
/// `quarry-context` (drop oldest messages, keep a recent tail).
pub trait ContextStrategy: Send + Sync {
    /// Estimate token count for a message list.
    fn token_estimate(&self, messages: &[ProviderMessage]) -> usize;

    /// Whether compaction should run given the current messages and limit.
    fn should_compact(&self, messages: &[ProviderMessage], limit: usize) -> bool;

    /// Compact the message list. Returns a shorter (or equal) list.
    fn compact(&self, messages: Vec<ProviderMessage>) -> Vec<ProviderMessage>;
}

/// A no-op context strategy that never compacts. Useful for short
/// conversations, or when a provider truncates its own context natively.
pub struct NoCompaction;

impl ContextStrategy for NoCompaction {
    fn token_estimate(&self, messages: &[ProviderMessage]) -> usize {
        // Rough estimate: 4 chars per token.
        messages
            .iter()
            .flat_map(|m| &m.content)
            .map(|part| match part {
                ContentPart::Text { text } => text.len() / 4,
            })
            .sum()
    }

    fn should_compact(&self, _messages: &[ProviderMessage], _limit: usize) -> bool {
        false
    }

    fn compact(&self, messages: Vec<ProviderMessage>) -> Vec<ProviderMessage> {
        messages
    }
}
