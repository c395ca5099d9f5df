//! Rules-only moderation classifier
//!
//! Composes pattern library hits into labels and a safe/unsafe verdict.
//! Never touches the network and never fails on malformed input, so it is
//! the required behaviour whenever the remote model is unavailable.

use feedguard_core::{LabelTag, Labels, Result};

use crate::patterns::{PatternCategory, PatternLibrary};

/// Posts shorter than this (trimmed, in characters) with a risky link are spam
pub const SHORT_TEXT_LEN: usize = 20;

/// One rule that contributed a label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleHit {
    pub label: LabelTag,
    pub detail: String,
}

/// Labels, verdict and the rules that produced them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleReport {
    pub labels: Labels,
    pub safe: bool,
    pub hits: Vec<RuleHit>,
}

/// Deterministic pattern-based classifier
pub struct RulesClassifier {
    library: PatternLibrary,
    short_text_len: usize,
}

impl RulesClassifier {
    /// Create a classifier with the default short-text threshold
    pub fn new() -> Result<Self> {
        Ok(Self {
            library: PatternLibrary::new()?,
            short_text_len: SHORT_TEXT_LEN,
        })
    }

    /// Override the short-text threshold used for risky-link spam
    pub fn with_short_text_len(mut self, short_text_len: usize) -> Self {
        self.short_text_len = short_text_len;
        self
    }

    /// Run every rule and report which ones fired
    pub fn evaluate(&self, text: &str, links: &[String]) -> RuleReport {
        let lib = &self.library;
        let mut labels = Labels::new();
        let mut hits = Vec::new();
        let mut hit = |label: LabelTag, detail: String| {
            labels.insert(label);
            hits.push(RuleHit { label, detail });
        };

        if let Some(pattern) = lib.find(PatternCategory::HatePlaceholder, text) {
            hit(LabelTag::Hate, pattern.to_string());
        }
        if let Some(group) = lib.group_exclusion(text) {
            hit(LabelTag::Hate, format!("group exclusion: {}", group.to_lowercase()));
        }

        // Insults are allowed unless aimed at someone
        if let Some(pattern) = lib.find(PatternCategory::Insult, text) {
            if lib.is_direct_address(text) {
                hit(LabelTag::Bullying, pattern.to_string());
            }
        }

        if let Some(pattern) = lib.find(PatternCategory::Slur, text) {
            hit(LabelTag::Hate, pattern.to_string());
        }
        if let Some(pattern) = lib.find(PatternCategory::DirectThreat, text) {
            hit(LabelTag::Violence, pattern.to_string());
        }
        if let Some(pattern) = lib.find(PatternCategory::Doxxing, text) {
            hit(LabelTag::Doxxing, pattern.to_string());
        }
        if let Some(pattern) = lib.find(PatternCategory::Illegal, text) {
            hit(LabelTag::Illegal, pattern.to_string());
        }

        // Minor-directed content supersedes the generic sexual label
        if let Some(pattern) = lib.find(PatternCategory::MinorSexual, text) {
            hit(LabelTag::SexualMinors, pattern.to_string());
        } else if let Some(pattern) = lib.find(PatternCategory::HardSexual, text) {
            hit(LabelTag::Sexual, pattern.to_string());
        }

        if let Some(risk) = links.iter().find_map(|link| lib.link_risk(link)) {
            hit(LabelTag::LinksRisky, risk.describe());
            if self.is_short(text) {
                hit(LabelTag::Spam, "risky link with short text".to_string());
            }
        }

        let safe = self.is_safe_labels(&labels, text);
        RuleReport { labels, safe, hits }
    }

    /// Labels the rules assign to this post
    pub fn labels_for(&self, text: &str, links: &[String]) -> Labels {
        self.evaluate(text, links).labels
    }

    /// Rules-only verdict for this post
    pub fn is_safe(&self, text: &str, links: &[String]) -> bool {
        self.evaluate(text, links).safe
    }

    /// Verdict implied by an already computed label set
    pub fn is_safe_labels(&self, labels: &Labels, text: &str) -> bool {
        if labels.any_blocking() {
            return false;
        }
        !(labels.contains(LabelTag::LinksRisky) && self.is_short(text))
    }

    /// Narrow gate for image-generation prompts: hate, threats and sexual content only
    pub fn prompt_is_unsafe(&self, prompt: &str) -> bool {
        let lib = &self.library;
        [
            PatternCategory::Slur,
            PatternCategory::HatePlaceholder,
            PatternCategory::DirectThreat,
            PatternCategory::HardSexual,
            PatternCategory::MinorSexual,
        ]
        .iter()
        .any(|category| lib.matches(*category, prompt))
            || lib.group_exclusion(prompt).is_some()
    }

    /// True if the minor-safety override must force this post unsafe
    pub fn requires_minor_override(&self, rule_labels: &Labels, text: &str) -> bool {
        rule_labels.contains(LabelTag::SexualMinors) && !self.library.is_condemnation(text)
    }

    fn is_short(&self, text: &str) -> bool {
        text.trim().chars().count() < self.short_text_len
    }
}
