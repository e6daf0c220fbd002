//! Lexical helpers shared by the hashing provider and keyword retrieval.

use std::collections::BTreeSet;

/// Common English words that carry no retrieval signal.
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "how", "in", "is", "it", "of",
    "on", "or", "that", "the", "this", "to", "was", "what", "when", "where", "which", "with",
];

/// Tokenize text into lowercase alphanumeric terms of length >= 2.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|s| s.len() >= 2)
        .map(|s| s.to_lowercase())
        .filter(|s| !STOPWORDS.contains(&s.as_str()))
        .collect()
}

/// Distinct terms of a text.
pub fn term_set(text: &str) -> BTreeSet<String> {
    tokenize(text).into_iter().collect()
}

/// Fraction of query terms present in the document terms, in [0, 1].
pub fn overlap_score(query_terms: &BTreeSet<String>, doc_terms: &BTreeSet<String>) -> f64 {
    if query_terms.is_empty() {
        return 0.0;
    }
    let hits = query_terms.intersection(doc_terms).count();
    hits as f64 / query_terms.len() as f64
}

/// First sentence of a text, capped at `max_chars` characters.
pub fn first_sentence(text: &str, max_chars: usize) -> String {
    let end = text
        .find(|c: char| matches!(c, '.' | '!' | '?' | '\n'))
        .map(|i| i + 1)
        .unwrap_or(text.len());
    text[..end].trim().chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_drops_stopwords_and_short_tokens() {
        assert_eq!(
            tokenize("The Rust borrow-checker is a tool"),
            vec!["rust", "borrow", "checker", "tool"]
        );
    }

    #[test]
    fn overlap_is_fraction_of_query_terms() {
        let q = term_set("rust ownership lifetimes");
        let d = term_set("ownership rules in rust");
        assert!((overlap_score(&q, &d) - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn empty_query_scores_zero() {
        assert_eq!(overlap_score(&BTreeSet::new(), &term_set("anything")), 0.0);
    }

    #[test]
    fn first_sentence_stops_at_period() {
        assert_eq!(first_sentence("Ownership moves. Borrowing lends.", 100), "Ownership moves.");
        assert_eq!(first_sentence("no terminator", 4), "no t");
    }
}
