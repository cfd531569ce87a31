//! Sentence splitting
//!
//! Used by the magnitude scorer. Sentences end at runs of '.', '!' or '?';
//! whitespace-only fragments are dropped.

use std::sync::OnceLock;

use regex::Regex;

static SENTENCE_BOUNDARY: OnceLock<Regex> = OnceLock::new();

fn boundary() -> &'static Regex {
    SENTENCE_BOUNDARY.get_or_init(|| Regex::new(r"[.!?]+").expect("valid literal pattern"))
}

/// Split text into trimmed, non-empty sentences
pub fn split_sentences(text: &str) -> Vec<&str> {
    boundary()
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_on_terminators() {
        let sentences = split_sentences("Revenue grew. Costs fell! Margins? Stable");
        assert_eq!(
            sentences,
            vec!["Revenue grew", "Costs fell", "Margins", "Stable"]
        );
    }

    #[test]
    fn test_collapses_terminator_runs() {
        let sentences = split_sentences("Strong quarter... Very strong!!!");
        assert_eq!(sentences, vec!["Strong quarter", "Very strong"]);
    }

    #[test]
    fn test_empty_and_punctuation_only() {
        assert!(split_sentences("").is_empty());
        assert!(split_sentences("...!?.").is_empty());
        assert!(split_sentences("   ").is_empty());
    }

    #[test]
    fn test_no_terminator_is_one_sentence() {
        assert_eq!(split_sentences("guidance unchanged"), vec!["guidance unchanged"]);
    }
}
