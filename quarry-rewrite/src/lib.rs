//! Deterministic query rewriting: the first stage of the search pipeline.
//!
//! [`rewrite_query`] is a pure function — whitespace normalization,
//! contraction expansion, and optional lowercasing, with no I/O and no
//! hidden state. It runs before retrieval so the embedded query matches
//! the form the embedder was tuned on.

#![deny(missing_docs)]

/// Options controlling how a query is rewritten.
///
/// # Examples
///
/// ```
/// use quarry_rewrite::{rewrite_query_with, RewriteOptions};
///
/// let opts = RewriteOptions::default();
/// assert_eq!(rewrite_query_with("What's  the   weather?", &opts), "what is the weather?");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RewriteOptions {
    /// Lowercase the result. Most embedders are case-insensitive at
    /// training time, so this is on by default.
    pub lowercase: bool,
    /// Expand common English contractions ("what's" -> "what is").
    pub expand_contractions: bool,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            lowercase: true,
            expand_contractions: true,
        }
    }
}

const CONTRACTIONS: &[(&str, &str)] = &[
    ("won't", "will not"),
    ("can't", "cannot"),
    ("n't", " not"),
    ("'re", " are"),
    ("'s", " is"),
    ("'d", " would"),
    ("'ll", " will"),
    ("'t", " not"),
    ("'ve", " have"),
    ("'m", " am"),
];

/// Rewrite a query using the default options: normalize whitespace,
/// expand contractions, lowercase.
pub fn rewrite_query(query: &str) -> String {
    rewrite_query_with(query, &RewriteOptions::default())
}

/// Rewrite a query with explicit options. Deterministic; no side effects.
pub fn rewrite_query_with(query: &str, options: &RewriteOptions) -> String {
    let mut rewritten = query.to_owned();

    if options.expand_contractions {
        for (contraction, expansion) in CONTRACTIONS {
            rewritten = rewritten.replace(contraction, expansion);
        }
    }

    if options.lowercase {
        rewritten = rewritten.to_lowercase();
    }

    normalize_whitespace(&rewritten)
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
