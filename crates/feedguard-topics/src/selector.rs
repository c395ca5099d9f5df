//! Selection of existing topics
//!
//! A selector picks zero or more topics from the caller's controlled
//! vocabulary. An empty selection means nothing fits and a new topic should
//! be minted. Keyword overlap is the deterministic strategy used when no
//! remote model is reachable.

use async_trait::async_trait;
use feedguard_core::Result;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::sanitize::normalize_topic;

/// Strategy for choosing existing topics for a post
#[async_trait]
pub trait TopicSelector: Send + Sync {
    /// Pick at most `max_topics` normalized topics from `existing`
    async fn select(&self, text: &str, existing: &[String], max_topics: usize) -> Result<Vec<String>>;

    /// Name used in logs
    fn name(&self) -> &str;
}

/// Normalize the caller's vocabulary, dropping blanks and duplicates
pub fn candidate_topics(existing: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    existing
        .iter()
        .map(|t| normalize_topic(t))
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}

fn word_regex() -> &'static Regex {
    static WORD: OnceLock<Regex> = OnceLock::new();
    WORD.get_or_init(|| Regex::new(r"[a-z0-9]+").expect("word pattern is a valid regex"))
}

/// Lowercase alphanumeric tokens of `text`
pub fn tokenize(text: &str) -> HashSet<String> {
    let lowered = text.to_lowercase();
    word_regex()
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Rank topics by token overlap with `text`, descending, ties alphabetical.
///
/// Topics sharing no token with the text are not returned.
pub fn rank_by_overlap(text: &str, existing: &[String]) -> Vec<(String, usize)> {
    let words = tokenize(text);
    let mut ranked: Vec<(String, usize)> = candidate_topics(existing)
        .into_iter()
        .map(|topic| {
            let overlap = tokenize(&topic).intersection(&words).count();
            (topic, overlap)
        })
        .filter(|(_, overlap)| *overlap > 0)
        .collect();

    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

/// Deterministic selector based on shared words
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordSelector;

#[async_trait]
impl TopicSelector for KeywordSelector {
    async fn select(&self, text: &str, existing: &[String], max_topics: usize) -> Result<Vec<String>> {
        Ok(rank_by_overlap(text, existing)
            .into_iter()
            .take(max_topics)
            .map(|(topic, _)| topic)
            .collect())
    }

    fn name(&self) -> &str {
        "keywords"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topics(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_candidate_topics_normalizes_and_dedups() {
        let existing = topics(&["Soccer", " soccer ", "", "World  Cup", "Sci-Fi", "sci fi", "!!"]);
        assert_eq!(candidate_topics(&existing), topics(&["soccer", "world cup", "sci fi"]));
    }

    #[test]
    fn test_tokenize() {
        let words = tokenize("Messi scored, again! 2-0");
        assert!(words.contains("messi"));
        assert!(words.contains("again"));
        assert!(words.contains("2"));
        assert!(!words.contains("again!"));
    }

    #[test]
    fn test_rank_by_overlap_orders_deterministically() {
        let existing = topics(&["world cup", "cup noodles", "soccer", "finance"]);
        let ranked = rank_by_overlap("world cup soccer final tonight", &existing);
        assert_eq!(
            ranked,
            vec![
                ("world cup".to_string(), 2),
                ("cup noodles".to_string(), 1),
                ("soccer".to_string(), 1),
            ]
        );
    }

    #[tokio::test]
    async fn test_keyword_selector_truncates() {
        let existing = topics(&["b topic", "a topic", "finance"]);
        let selected = KeywordSelector.select("a topic about b", &existing, 1).await.unwrap();
        assert_eq!(selected, topics(&["a topic"]));
    }
}
