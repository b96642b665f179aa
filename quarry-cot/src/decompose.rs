const SPLIT_MARKERS: &[&str] = [" and ", " then ", " but also ", " as well as ", ";"].as_slice();

/// Split a query into ordered sub-questions, capped at `max_depth`.
///
/// Splits on coordinating conjunctions and semicolons. Each fragment is
/// trimmed and re-punctuated with a trailing `?` so it reads as a
/// standalone question. If splitting produces nothing usable, the
/// original query is returned as the sole sub-question.
pub fn decompose_query(query: &str, max_depth: u32) -> Vec<String> {
    let mut fragments = vec![query.to_string()];

    for marker in SPLIT_MARKERS {
        fragments = fragments
            .into_iter()
            .flat_map(|fragment| {
                fragment
                    .split(marker.trim_end_matches(' '))
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect();
    }

    let mut sub_questions: Vec<String> = fragments
        .into_iter()
        .map(|f| f.trim().trim_matches(';').trim().to_string())
        .filter(|f| !f.is_empty())
        .map(|f| if f.ends_with('?') { f } else { format!("{f}?") })
        .collect();

    if sub_questions.is_empty() {
        sub_questions.push(query.to_string());
    }

    sub_questions.truncate(max_depth.max(1) as usize);
    sub_questions
}
