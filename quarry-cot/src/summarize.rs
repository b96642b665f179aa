/// Maximum characters kept per prior answer when summarizing under the
/// `key_points_only` strategy.
const KEY_POINT_CHARS: usize = 160;

/// Compress prior sub-answers into one key point each, for when the
/// cumulative reasoning prompt would exceed the context window.
///
/// This stands in for a full summarization model call: chain-of-thought
/// steps already run sequentially and a cross-model round-trip per
/// overflow would add another call to an already multi-call branch, so
/// the local heuristic (first sentence, or a character-bounded prefix)
/// is used instead.
pub fn key_points_only(previous_answers: &[String]) -> Vec<String> {
    previous_answers
        .iter()
        .map(|answer| {
            let first_sentence = answer.split('.').next().unwrap_or(answer).trim();
            if first_sentence.chars().count() <= KEY_POINT_CHARS {
                first_sentence.to_string()
            } else {
                first_sentence.chars().take(KEY_POINT_CHARS).collect()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_sentence() {
        let answers = vec!["Rust has no GC. It uses ownership.".to_string()];
        let result = key_points_only(&answers);
        assert_eq!(result[0], "Rust has no GC");
    }

    #[test]
    fn truncates_long_sentences() {
        let long = "a".repeat(500);
        let result = key_points_only(&[long]);
        assert_eq!(result[0].chars().count(), KEY_POINT_CHARS);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(key_points_only(&[]).is_empty());
    }
}
