/// Whether a query warrants chain-of-thought decomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Complexity {
    /// Answerable directly from a single retrieval pass.
    Simple,
    /// Benefits from being split into ordered sub-questions.
    Complex,
}

const CONJUNCTIONS: &[&str] = [" and ", " then ", " but also ", " as well as "].as_slice();

/// Classify a query's complexity using shallow lexical signals: multiple
/// clauses (conjunctions, semicolons), multiple question marks, or length.
///
/// This is a heuristic, not a model call — the chain-of-thought engine
/// can't afford a classification round-trip before every run.
pub fn classify(query: &str) -> Complexity {
    let lower = query.to_lowercase();
    let has_conjunction = CONJUNCTIONS.iter().any(|c| lower.contains(c));
    let has_multiple_clauses = query.matches(';').count() >= 1;
    let has_multiple_questions = query.matches('?').count() >= 2;
    let is_long = query.split_whitespace().count() > 25;

    if has_conjunction || has_multiple_clauses || has_multiple_questions || is_long {
        Complexity::Complex
    } else {
        Complexity::Simple
    }
}
