//! URL extraction from post text

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn url_regex() -> &'static Regex {
    static URL_RE: OnceLock<Regex> = OnceLock::new();
    URL_RE.get_or_init(|| {
        Regex::new(r"(?i)\bhttps?://[^\s)]+").expect("URL pattern is a valid regex")
    })
}

/// Collect links found in `text`, then `extra` links, dropping blanks and
/// exact duplicates. First occurrence wins.
pub fn extract_links(text: &str, extra: &[String]) -> Vec<String> {
    let found = url_regex().find_iter(text).map(|m| m.as_str());
    let supplied = extra.iter().map(String::as_str).filter(|l| !l.trim().is_empty());

    let mut seen = HashSet::new();
    found
        .chain(supplied)
        .filter(|link| seen.insert(*link))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_preserves_first_occurrence() {
        let links = extract_links("see https://x.com and https://x.com", &[]);
        assert_eq!(links, vec!["https://x.com"]);
    }

    #[test]
    fn test_stops_at_whitespace_and_paren() {
        let links = extract_links("(read http://a.io/p?q=1) then HTTPS://B.io/x", &[]);
        assert_eq!(links, vec!["http://a.io/p?q=1", "HTTPS://B.io/x"]);
    }

    #[test]
    fn test_case_distinct_links_are_kept() {
        let links = extract_links("https://x.com/A https://x.com/a", &[]);
        assert_eq!(links.len(), 2);
    }

    #[test]
    fn test_extra_links_merged_and_blanks_dropped() {
        let extra = vec![String::new(), "https://bit.ly/xyz".to_string()];
        let links = extract_links("no links here", &extra);
        assert_eq!(links, vec!["https://bit.ly/xyz"]);
    }
}
