//! Topic label normalization and validation

use regex::Regex;
use std::sync::OnceLock;

/// Minimum length of a minted topic, in characters
pub const MIN_TOPIC_LEN: usize = 3;

/// Vague or stopword-like labels that are never minted
pub const TOPIC_DENYLIST: &[&str] = &[
    "amazing",
    "interesting",
    "cool",
    "today",
    "breaking",
    "the",
    "this",
    "that",
    "these",
    "those",
    "news",
    "update",
    "story",
    "post",
    "random",
];

/// Canonical form of a caller-supplied topic: lowercase ASCII letters and
/// digits separated by single spaces. Punctuation splits words, so `Sci-Fi`
/// becomes `sci fi` and still shares tokens with post text.
pub fn normalize_topic(topic: &str) -> String {
    let spaced: String = topic
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_lowercase() || c.is_ascii_digit() { c } else { ' ' })
        .collect();
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Reduce a candidate label to lowercase alphanumerics and single spaces.
///
/// Returns `None` when the result is shorter than [`MIN_TOPIC_LEN`] or is a
/// denylisted word.
pub fn sanitize_new_topic(candidate: &str) -> Option<String> {
    let lowered = candidate.trim().to_lowercase();
    let kept: String = lowered
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == ' ')
        .collect();
    let clean = kept.split_whitespace().collect::<Vec<_>>().join(" ");

    if clean.chars().count() < MIN_TOPIC_LEN || TOPIC_DENYLIST.contains(&clean.as_str()) {
        return None;
    }
    Some(clean)
}

fn subject_regex() -> &'static Regex {
    static SUBJECT: OnceLock<Regex> = OnceLock::new();
    SUBJECT.get_or_init(|| {
        Regex::new(r"\b([a-z0-9]+(?: [a-z0-9]+)?)\b").expect("subject pattern is a valid regex")
    })
}

/// Heuristic topic: the first one or two word run of the lowercased text
pub fn fallback_compact_subject(text: &str) -> Option<String> {
    let lowered = text.to_lowercase();
    let candidate = subject_regex().captures(&lowered)?.get(1)?.as_str();
    sanitize_new_topic(candidate)
}
