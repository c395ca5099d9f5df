//! Tolerant extraction of a JSON object from free-form model output
//!
//! Models asked for "JSON only" still wrap answers in prose or code fences.
//! [`extract_json_object`] returns the first balanced `{...}` substring,
//! skipping braces that appear inside string literals.

use crate::{Error, Result};
use serde_json::{Map, Value};

/// Return the first syntactically balanced `{...}` substring of `raw`.
///
/// "First" means the earliest opening brace that has a matching close, so an
/// unclosed brace in leading prose does not hide a later object. Runs in a
/// single pass over the input.
pub fn find_balanced_object(raw: &str) -> Option<&str> {
    // Opening braces still waiting for their close, outermost first
    let mut open: Vec<usize> = Vec::new();
    let mut earliest: Option<(usize, usize)> = None;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, &byte) in raw.as_bytes().iter().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match byte {
            // Quotes in prose outside any object are not string delimiters
            b'"' if !open.is_empty() => in_string = true,
            b'{' => open.push(idx),
            b'}' => {
                let Some(start) = open.pop() else { continue };
                if open.is_empty() {
                    return Some(&raw[start..=idx]);
                }
                if earliest.map_or(true, |(s, _)| start < s) {
                    earliest = Some((start, idx));
                }
            }
            _ => {}
        }
    }

    earliest.map(|(start, end)| &raw[start..=end])
}

/// Extract and parse the first JSON object in `raw`.
pub fn extract_json_object(raw: &str) -> Result<Map<String, Value>> {
    let candidate = find_balanced_object(raw)
        .ok_or_else(|| Error::schema("no JSON object found in model output"))?;

    match serde_json::from_str::<Value>(candidate)? {
        Value::Object(map) => Ok(map),
        _ => Err(Error::schema("model output is not a JSON object")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_object() {
        let map = extract_json_object(r#"{"safe": true}"#).unwrap();
        assert_eq!(map["safe"], Value::Bool(true));
    }

    #[test]
    fn test_code_fence_and_commentary() {
        let raw = "Here is my verdict:\n```json\n{\"safe\": false, \"labels\": [\"hate\"]}\n```\nThanks!";
        let map = extract_json_object(raw).unwrap();
        assert_eq!(map["safe"], Value::Bool(false));
        assert_eq!(map["labels"][0], "hate");
    }

    #[test]
    fn test_braces_inside_strings_are_ignored() {
        let raw = r#"{"message_to_user": "use {curly} and \"quotes\"", "safe": true} trailing }"#;
        let found = find_balanced_object(raw).unwrap();
        assert!(found.ends_with("true}"));
        assert!(extract_json_object(raw).is_ok());
    }

    #[test]
    fn test_first_object_wins() {
        let raw = r#"{"new": "soccer"} {"new": "finance"}"#;
        let map = extract_json_object(raw).unwrap();
        assert_eq!(map["new"], "soccer");
    }

    #[test]
    fn test_unbalanced_opening_falls_through_to_nested_object() {
        let found = find_balanced_object(r#"{ broken {"safe": true}"#).unwrap();
        assert_eq!(found, r#"{"safe": true}"#);
    }

    #[test]
    fn test_earliest_nested_object_wins_over_later_sibling() {
        let found = find_balanced_object(r#"{ a {"x": 1} {"y": 2}"#).unwrap();
        assert_eq!(found, r#"{"x": 1}"#);
    }

    #[test]
    fn test_stray_quote_in_prose_is_ignored() {
        let found = find_balanced_object(r#"My 5" screen says {"safe": true}"#).unwrap();
        assert_eq!(found, r#"{"safe": true}"#);
    }

    #[test]
    fn test_many_unclosed_braces_scan_once() {
        let raw = format!("{}{}", "{".repeat(200_000), r#"{"safe": false}"#);
        assert_eq!(find_balanced_object(&raw), Some(r#"{"safe": false}"#));
        assert_eq!(find_balanced_object(&"{".repeat(200_000)), None);
    }

    #[test]
    fn test_missing_object_is_schema_error() {
        let err = extract_json_object("SAFE").unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn test_balanced_but_invalid_json() {
        let err = extract_json_object("{safe: yes}").unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
