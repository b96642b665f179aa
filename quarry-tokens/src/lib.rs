//! Token accounting: per-model-family estimation and budget warnings.
//!
//! Mirrors `quarry-context::SlidingWindow`'s "rough estimate: N chars per
//! token" idiom, but dispatches on a model-family lookup table instead of
//! one fixed ratio — `gpt-*` and `claude-*` models tokenize English text
//! differently than `granite-*` ones do.

#![deny(missing_docs)]

use serde::{Deserialize, Serialize};

/// `(model id prefix, chars per token)`, checked in order; the first
/// prefix match wins. Ratios are rough estimates, not exact tokenizer
/// output — good enough for budget checks, not for billing.
const CHARS_PER_TOKEN_TABLE: &[(&str, f64)] = &[
    ("gpt-", 4.0),
    ("claude-", 3.6),
    ("granite", 3.8),
    ("llama", 4.2),
    ("gemini", 4.0),
];

/// Fallback ratio when no table entry matches the model id.
const DEFAULT_CHARS_PER_TOKEN: f64 = 4.0;

/// Estimate the token count of `text` for the given model id.
///
/// ```
/// use quarry_tokens::estimate_tokens;
///
/// let granite = estimate_tokens("hello there", "ibm/granite-3-8b-instruct");
/// let gpt = estimate_tokens("hello there", "gpt-4o-mini");
/// assert!(granite >= gpt);
/// ```
pub fn estimate_tokens(text: &str, model: &str) -> u64 {
    let ratio = chars_per_token(model);
    ((text.len() as f64) / ratio).ceil() as u64
}

fn chars_per_token(model: &str) -> f64 {
    CHARS_PER_TOKEN_TABLE
        .iter()
        .find(|(prefix, _)| model.starts_with(prefix) || model.contains(prefix))
        .map(|(_, ratio)| *ratio)
        .unwrap_or(DEFAULT_CHARS_PER_TOKEN)
}

/// How urgently a [`TokenWarning`] should be acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningSeverity {
    /// Context window usage is elevated but not yet a problem.
    Info,
    /// Context window usage is high; summarization or truncation is advised soon.
    Warning,
    /// Context window is nearly exhausted; the next call may fail or truncate badly.
    Critical,
}

/// A budget warning: how bad things are, and what to do about it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenWarning {
    /// How urgent this warning is.
    pub severity: WarningSeverity,
    /// Human-readable description of the pressure.
    pub message: String,
    /// A concrete next action (e.g. "summarize", "truncate_oldest").
    pub suggested_action: String,
}

/// Fraction of `limit` at which a [`WarningSeverity::Warning`] is raised.
pub const WARNING_THRESHOLD: f64 = 0.8;
/// Fraction of `limit` at which a [`WarningSeverity::Critical`] is raised.
pub const CRITICAL_THRESHOLD: f64 = 0.95;

/// Check `used` tokens against `limit`, returning a warning if usage has
/// crossed [`WARNING_THRESHOLD`] or [`CRITICAL_THRESHOLD`]. Returns `None`
/// below the warning threshold.
pub fn check_budget(used: u64, limit: u64) -> Option<TokenWarning> {
    if limit == 0 {
        return Some(TokenWarning {
            severity: WarningSeverity::Critical,
            message: "token budget limit is zero".into(),
            suggested_action: "configure a non-zero context_window_size".into(),
        });
    }

    let fraction = used as f64 / limit as f64;

    if fraction >= CRITICAL_THRESHOLD {
        Some(TokenWarning {
            severity: WarningSeverity::Critical,
            message: format!("context window {:.0}% full ({used}/{limit} tokens)", fraction * 100.0),
            suggested_action: "summarize".into(),
        })
    } else if fraction >= WARNING_THRESHOLD {
        Some(TokenWarning {
            severity: WarningSeverity::Warning,
            message: format!("context window {:.0}% full ({used}/{limit} tokens)", fraction * 100.0),
            suggested_action: "truncate_oldest".into(),
        })
    } else {
        None
    }
}
