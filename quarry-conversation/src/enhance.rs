//! Question enhancement: turning a context-dependent follow-up into a
//! standalone question, without ever letting assistant text leak back
//! into the prompt.

use crate::message::{ConversationMessage, MessageRole};
use std::collections::HashSet;

/// Phrases that only make sense as a continuation of a prior turn.
const CONTINUATION_PHRASES: &[&str] =
    &["tell me more", "go on", "what about that", "keep going", "continue", "what else", "and more"];

/// Temporal references with no explicit subject of their own.
const TEMPORAL_NO_SUBJECT: &[&str] = &["what happened next", "after that", "and after", "what followed", "and then"];

/// Pronoun-led sentence openers that need an antecedent to resolve.
const AMBIGUOUS_PRONOUN_STARTS: &[&str] = &["it ", "it?", "this ", "this?", "that ", "that?", "they ", "he ", "she "];

/// The distinct user-role messages in `history`, in first-occurrence
/// order. Assistant and system messages are never included — this is
/// the one property `enhance_question` must never violate (spec.md §8
/// invariant 5).
pub fn distinct_user_messages(history: &[ConversationMessage]) -> Vec<&str> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for message in history {
        if message.role != MessageRole::User {
            continue;
        }
        if let Some(text) = message.text() {
            if seen.insert(text) {
                out.push(text);
            }
        }
    }
    out
}

/// Whether `question`, read on its own, needs an antecedent from prior
/// turns to be answerable.
pub fn is_ambiguous(question: &str) -> bool {
    let normalized = question.trim().to_lowercase();
    if normalized.is_empty() {
        return false;
    }
    CONTINUATION_PHRASES.iter().any(|phrase| normalized == *phrase || normalized.starts_with(phrase))
        || TEMPORAL_NO_SUBJECT.iter().any(|phrase| normalized.contains(phrase))
        || AMBIGUOUS_PRONOUN_STARTS.iter().any(|prefix| normalized.starts_with(prefix))
}

/// Produce a standalone version of `question` given the prior user-role
/// history.
///
/// Pure function: filters history to user messages only (step a),
/// dedupes identical ones keeping first occurrence (step b), detects
/// ambiguity (step c), and if ambiguous, folds in the most recent
/// distinct referent (step d). If the question isn't ambiguous, or
/// there's no referent to borrow, it's returned unchanged. Deterministic
/// on identical inputs, so calling it twice on the same history and
/// question is a no-op the second time.
pub fn enhance_question(history: &[ConversationMessage], question: &str) -> String {
    if !is_ambiguous(question) {
        return question.to_string();
    }

    match distinct_user_messages(history).last() {
        Some(referent) => format!("{question} (referring to: {referent})"),
        None => question.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layer0::content::Content;
    use layer0::id::SessionId;
    use crate::message::MessageType;

    fn user_msg(text: &str) -> ConversationMessage {
        ConversationMessage::new("m", SessionId::new("s"), MessageRole::User, MessageType::Question, Content::text(text), 0)
    }

    fn assistant_msg(text: &str) -> ConversationMessage {
        ConversationMessage::new("m", SessionId::new("s"), MessageRole::Assistant, MessageType::Answer, Content::text(text), 0)
    }

    #[test]
    fn unambiguous_question_passes_through_unchanged() {
        let history = vec![user_msg("what was IBM revenue in 2021?")];
        assert_eq!(enhance_question(&history, "what was Apple revenue in 2022?"), "what was Apple revenue in 2022?");
    }

    #[test]
    fn continuation_phrase_pulls_in_the_most_recent_user_referent() {
        let history = vec![user_msg("what was IBM revenue in 2021?"), assistant_msg("IBM revenue in 2021 was $57.4 billion.")];
        let enhanced = enhance_question(&history, "tell me more");
        assert!(enhanced.contains("IBM revenue in 2021"));
        assert!(!enhanced.contains("57.4"));
    }

    #[test]
    fn pronoun_led_question_is_ambiguous() {
        assert!(is_ambiguous("it was released when?"));
        assert!(is_ambiguous("that seems odd, why?"));
        assert!(!is_ambiguous("what is the capital of France?"));
    }

    #[test]
    fn dedup_keeps_first_occurrence_only() {
        let history = vec![user_msg("same question"), assistant_msg("an answer"), user_msg("same question")];
        assert_eq!(distinct_user_messages(&history), vec!["same question"]);
    }

    #[test]
    fn ambiguous_question_with_no_history_is_returned_unchanged() {
        assert_eq!(enhance_question(&[], "tell me more"), "tell me more");
    }

    #[test]
    fn enhancement_is_idempotent_on_unchanged_history() {
        let history = vec![user_msg("what was IBM revenue in 2021?")];
        let first = enhance_question(&history, "tell me more");
        let second = enhance_question(&history, "tell me more");
        assert_eq!(first, second);
    }
}
