//! Property tests for the rules-only classifier
//!
//! Covers purity, verdict/label consistency, and the minor-safety
//! co-occurrence rule over generated posts.

use feedguard_classifiers::{RulesClassifier, SHORT_TEXT_LEN};
use feedguard_core::LabelTag;
use proptest::prelude::*;

const FRAGMENTS: &[&str] = &[
    "hello",
    "you",
    "you're",
    "@sam",
    "loser",
    "idiot",
    "immigrants",
    "don't belong here",
    "<slur>",
    "i will hurt",
    "kill him",
    "home address is",
    "selling drugs",
    "teen",
    "child",
    "porn",
    "sexual",
    "rape",
    "should be banned",
    "and reported",
    "soccer",
    "finance",
    "check this out",
    "great match today",
];

const LINKS: &[&str] = &[
    "https://bit.ly/xyz",
    "https://example.xxx/",
    "http://10.0.0.1/",
    "https://example.com/post",
    "not a url",
];

const MINOR_TERMS: &[&str] = &["child", "minor", "underage", "teen"];
const SEXUAL_TERMS: &[&str] = &["sex", "porn", "sexual", "explicit"];

fn post_text() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(FRAGMENTS), 0..8).prop_map(|parts| parts.join(" "))
}

fn post_links() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(prop::sample::select(LINKS).prop_map(str::to_string), 0..3)
}

const BLOCKING: [LabelTag; 8] = [
    LabelTag::Sexual,
    LabelTag::SexualMinors,
    LabelTag::Hate,
    LabelTag::Violence,
    LabelTag::Doxxing,
    LabelTag::Illegal,
    LabelTag::Bullying,
    LabelTag::Spam,
];

proptest! {
    #[test]
    fn evaluation_is_pure(text in post_text(), links in post_links()) {
        let classifier = RulesClassifier::new().unwrap();
        let first = classifier.evaluate(&text, &links);
        let second = classifier.evaluate(&text, &links);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn verdict_matches_labels(text in post_text(), links in post_links()) {
        let classifier = RulesClassifier::new().unwrap();
        let labels = classifier.labels_for(&text, &links);
        let short_risky = labels.contains(LabelTag::LinksRisky)
            && text.trim().chars().count() < SHORT_TEXT_LEN;
        let expected_unsafe = BLOCKING.iter().any(|l| labels.contains(*l)) || short_risky;

        prop_assert_eq!(classifier.is_safe(&text, &links), !expected_unsafe);
    }

    #[test]
    fn never_emits_both_sexual_labels(text in post_text()) {
        let classifier = RulesClassifier::new().unwrap();
        let labels = classifier.labels_for(&text, &[]);
        prop_assert!(!(labels.contains(LabelTag::Sexual) && labels.contains(LabelTag::SexualMinors)));
    }

    #[test]
    fn minor_and_sexual_terms_always_flag(
        prefix in post_text(),
        minor in prop::sample::select(MINOR_TERMS),
        sexual in prop::sample::select(SEXUAL_TERMS),
        reversed in any::<bool>(),
    ) {
        let classifier = RulesClassifier::new().unwrap();
        let text = if reversed {
            format!("{} {} {}", prefix, sexual, minor)
        } else {
            format!("{} {} {}", prefix, minor, sexual)
        };
        let labels = classifier.labels_for(&text, &[]);
        prop_assert!(labels.contains(LabelTag::SexualMinors));
        prop_assert!(!classifier.is_safe(&text, &[]));
    }
}

#[test]
fn scenario_short_teaser_with_shortener() {
    let classifier = RulesClassifier::new().unwrap();
    let links = vec!["https://bit.ly/xyz".to_string()];
    let labels = classifier.labels_for("check this out", &links);

    assert!(labels.contains(LabelTag::LinksRisky));
    assert!(labels.contains(LabelTag::Spam));
    assert!(!classifier.is_safe("check this out", &links));
}
