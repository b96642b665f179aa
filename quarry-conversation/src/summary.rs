//! Summarization: collapsing older messages into a compact record once
//! a session's context window fills up.

use crate::message::{ConversationMessage, MessageRole};
use layer0::id::SessionId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Which of the four summarization strategies to apply.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummarizationStrategy {
    /// Keep the last `keep_recent` messages verbatim; summarize the rest
    /// into one paragraph.
    RecentPlusSummary,
    /// A bullet list of the most salient questions and answers.
    KeyPointsOnly,
    /// Cluster messages by shared vocabulary, one bullet per cluster.
    TopicBased,
    /// A short abstract plus a per-topic expansion.
    Hierarchical,
}

/// A compacted record standing in for the messages it subsumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    /// Caller-supplied unique id.
    pub id: String,
    /// The session this summary belongs to.
    pub session: SessionId,
    /// The summary body, shaped by `strategy`.
    pub summary: String,
    /// How many messages this summary subsumes.
    pub summarized_message_count: usize,
    /// `sum(tokens(m) for m in subsumed) - tokens(summary)`. Can be
    /// negative in pathological cases (a very verbose summary of very
    /// short messages), though that should not happen in practice.
    pub tokens_saved: i64,
    /// Salient topics pulled from the subsumed messages.
    pub key_topics: Vec<String>,
    /// Notable assistant answers from the subsumed window.
    pub important_decisions: Vec<String>,
    /// User questions in the subsumed window with no later answer.
    pub unresolved_questions: Vec<String>,
    /// Which strategy produced this summary.
    pub strategy: SummarizationStrategy,
    /// Epoch milliseconds of the earliest subsumed message. `get_context`
    /// places the summary at this position in the chronological merge.
    pub covers_from: u64,
    /// Epoch milliseconds the summary itself was produced.
    pub created_at: u64,
}

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "and", "or", "of", "to", "in", "on", "for", "what", "how", "does",
    "do", "did", "that", "this", "it", "with", "about", "i", "you", "your", "me",
];

fn significant_words(text: &str) -> HashSet<String> {
    text.split_whitespace()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|word| word.len() > 3 && !STOPWORDS.contains(&word.as_str()))
        .collect()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        format!("{}…", text.chars().take(max_chars).collect::<String>())
    }
}

/// Greedily group messages that share at least one significant word.
/// Each cluster's label is its longest shared word, falling back to
/// "general" for clusters with no extractable vocabulary.
fn cluster_by_topic<'a>(messages: &[&'a ConversationMessage]) -> Vec<(String, Vec<&'a ConversationMessage>)> {
    let mut clusters: Vec<(HashSet<String>, Vec<&ConversationMessage>)> = Vec::new();

    for message in messages {
        let words = message.text().map(significant_words).unwrap_or_default();
        let existing = clusters.iter_mut().find(|(topic_words, _)| !words.is_empty() && !topic_words.is_disjoint(&words));
        match existing {
            Some(cluster) => {
                cluster.1.push(message);
                cluster.0.extend(words);
            }
            None => clusters.push((words, vec![message])),
        }
    }

    clusters
        .into_iter()
        .map(|(words, msgs)| {
            let topic = words.iter().max_by_key(|w| w.len()).cloned().unwrap_or_else(|| "general".to_string());
            (topic, msgs)
        })
        .collect()
}

fn unresolved_questions(messages: &[ConversationMessage]) -> Vec<String> {
    messages
        .iter()
        .enumerate()
        .filter(|(_, m)| m.role == MessageRole::User)
        .filter(|(i, _)| !messages[i + 1..].iter().any(|later| later.role == MessageRole::Assistant))
        .filter_map(|(_, m)| m.text().map(String::from))
        .collect()
}

fn important_decisions(messages: &[ConversationMessage]) -> Vec<String> {
    messages
        .iter()
        .filter(|m| m.role == MessageRole::Assistant)
        .rev()
        .take(3)
        .filter_map(|m| m.text())
        .map(|t| truncate(t, 160))
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect()
}

/// Render the summary body, key topics, important decisions, and
/// unresolved questions for `messages` under `strategy`. `keep_recent`
/// only affects `RecentPlusSummary`'s framing text; the caller decides
/// which messages are actually marked `subsumed`.
pub fn render(messages: &[ConversationMessage], strategy: SummarizationStrategy, keep_recent: usize) -> (String, Vec<String>, Vec<String>, Vec<String>) {
    let decisions = important_decisions(messages);
    let unresolved = unresolved_questions(messages);
    let user_questions: Vec<&str> = messages.iter().filter(|m| m.role == MessageRole::User).filter_map(|m| m.text()).collect();

    match strategy {
        SummarizationStrategy::RecentPlusSummary => {
            let older_count = messages.len().saturating_sub(keep_recent);
            let topics: Vec<String> = user_questions.iter().take(5).map(|s| s.to_string()).collect();
            let text = if older_count == 0 {
                "No prior messages to summarize.".to_string()
            } else {
                format!("Earlier in this conversation, the user asked about: {}.", topics.join("; "))
            };
            (text, topics, decisions, unresolved)
        }
        SummarizationStrategy::KeyPointsOnly => {
            let bullets: Vec<String> = messages.iter().filter_map(|m| m.text()).take(8).map(|t| format!("- {t}")).collect();
            let topics: Vec<String> = user_questions.iter().take(5).map(|s| s.to_string()).collect();
            (bullets.join("\n"), topics, decisions, unresolved)
        }
        SummarizationStrategy::TopicBased => {
            let refs: Vec<&ConversationMessage> = messages.iter().collect();
            let clusters = cluster_by_topic(&refs);
            let topics: Vec<String> = clusters.iter().map(|(topic, _)| topic.clone()).collect();
            let lines: Vec<String> = clusters.iter().map(|(topic, msgs)| format!("- {topic}: {} message(s)", msgs.len())).collect();
            (lines.join("\n"), topics, decisions, unresolved)
        }
        SummarizationStrategy::Hierarchical => {
            let refs: Vec<&ConversationMessage> = messages.iter().collect();
            let clusters = cluster_by_topic(&refs);
            let topics: Vec<String> = clusters.iter().map(|(topic, _)| topic.clone()).collect();
            let abstract_line = format!("Discussed {} topic(s) across {} messages.", clusters.len(), messages.len());
            let expansion: Vec<String> = clusters
                .iter()
                .map(|(topic, msgs)| format!("  {topic}: {}", msgs.first().and_then(|m| m.text()).unwrap_or("")))
                .collect();
            (format!("{abstract_line}\n{}", expansion.join("\n")), topics, decisions, unresolved)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageType;
    use layer0::content::Content;

    fn msg(role: MessageRole, text: &str) -> ConversationMessage {
        ConversationMessage::new("m", SessionId::new("s"), role, MessageType::Question, Content::text(text), 0)
    }

    #[test]
    fn unresolved_questions_excludes_answered_ones() {
        let messages = vec![
            msg(MessageRole::User, "what is rust ownership?"),
            msg(MessageRole::Assistant, "ownership tracks who can free memory."),
            msg(MessageRole::User, "what about lifetimes?"),
        ];
        assert_eq!(unresolved_questions(&messages), vec!["what about lifetimes?"]);
    }

    #[test]
    fn key_points_only_bullets_every_message_up_to_the_cap() {
        let messages = vec![msg(MessageRole::User, "question one"), msg(MessageRole::Assistant, "answer one")];
        let (text, _, _, _) = render(&messages, SummarizationStrategy::KeyPointsOnly, 0);
        assert!(text.contains("- question one"));
        assert!(text.contains("- answer one"));
    }

    #[test]
    fn topic_based_groups_messages_sharing_vocabulary() {
        let messages = vec![
            msg(MessageRole::User, "tell me about rust ownership"),
            msg(MessageRole::Assistant, "rust ownership is tracked at compile time"),
            msg(MessageRole::User, "what about python decorators"),
        ];
        let (_, topics, _, _) = render(&messages, SummarizationStrategy::TopicBased, 0);
        assert_eq!(topics.len(), 2);
    }

    #[test]
    fn hierarchical_includes_an_abstract_and_a_per_topic_line() {
        let messages = vec![msg(MessageRole::User, "tell me about rust ownership")];
        let (text, _, _, _) = render(&messages, SummarizationStrategy::Hierarchical, 0);
        assert!(text.starts_with("Discussed"));
    }

    #[test]
    fn important_decisions_keeps_only_assistant_text_most_recent_first_chronologically() {
        let messages = vec![
            msg(MessageRole::Assistant, "first answer"),
            msg(MessageRole::Assistant, "second answer"),
            msg(MessageRole::User, "a question"),
        ];
        assert_eq!(important_decisions(&messages), vec!["first answer", "second answer"]);
    }
}
