//! Core types for FeedGuard

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::links::extract_links;

/// A chat message sent to a remote model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,

    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a new chat message
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }
}

/// Moderation label vocabulary shared by the model prompt and the rules engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelTag {
    Bullying,
    Hate,
    Sexual,
    SexualMinors,
    Violence,
    Doxxing,
    Illegal,
    Spam,
    LinksRisky,
    Other,
}

impl LabelTag {
    /// Every label, in prompt order
    pub const ALL: [LabelTag; 10] = [
        Self::Bullying,
        Self::Hate,
        Self::Sexual,
        Self::SexualMinors,
        Self::Violence,
        Self::Doxxing,
        Self::Illegal,
        Self::Spam,
        Self::LinksRisky,
        Self::Other,
    ];

    /// Wire name of the label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bullying => "bullying",
            Self::Hate => "hate",
            Self::Sexual => "sexual",
            Self::SexualMinors => "sexual_minors",
            Self::Violence => "violence",
            Self::Doxxing => "doxxing",
            Self::Illegal => "illegal",
            Self::Spam => "spam",
            Self::LinksRisky => "links_risky",
            Self::Other => "other",
        }
    }

    /// Labels whose presence alone makes a post unsafe
    pub fn is_blocking(&self) -> bool {
        !matches!(self, Self::LinksRisky | Self::Other)
    }
}

impl fmt::Display for LabelTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LabelTag {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|label| label.as_str() == wanted)
            .ok_or_else(|| crate::Error::schema(format!("unknown label '{}'", s)))
    }
}

/// Insertion-ordered set of labels
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Labels(Vec<LabelTag>);

impl Labels {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Add a label; returns false if it was already present
    pub fn insert(&mut self, label: LabelTag) -> bool {
        if self.0.contains(&label) {
            return false;
        }
        self.0.push(label);
        true
    }

    pub fn contains(&self, label: LabelTag) -> bool {
        self.0.contains(&label)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = LabelTag> + '_ {
        self.0.iter().copied()
    }

    /// True if any label is in the blocking set
    pub fn any_blocking(&self) -> bool {
        self.0.iter().any(LabelTag::is_blocking)
    }
}

impl FromIterator<LabelTag> for Labels {
    fn from_iter<I: IntoIterator<Item = LabelTag>>(iter: I) -> Self {
        let mut labels = Labels::new();
        for label in iter {
            labels.insert(label);
        }
        labels
    }
}

impl<const N: usize> From<[LabelTag; N]> for Labels {
    fn from(labels: [LabelTag; N]) -> Self {
        labels.into_iter().collect()
    }
}

/// A post submitted for moderation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationRequest {
    /// Post body
    pub text: String,

    /// Links found in the text followed by explicitly supplied links, deduplicated
    pub links: Vec<String>,

    /// Reserved policy knob; accepted but does not change decisions
    pub allow_mild_profanity: bool,
}

impl ModerationRequest {
    /// Build a request, merging links found in `text` with `source_links`
    pub fn new(text: impl Into<String>, source_links: &[String], allow_mild_profanity: bool) -> Self {
        let text = text.into();
        let links = extract_links(&text, source_links);
        Self {
            text,
            links,
            allow_mild_profanity,
        }
    }

    /// True if the post has no visible content
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Outcome of moderating one post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationVerdict {
    pub safe: bool,
    pub labels: Labels,
    pub allow_reason: String,
    pub block_reason: String,
    pub message_to_user: String,
    pub links: Vec<String>,
    /// Set when the rules engine produced all or part of the verdict
    pub fallback_used: bool,
    pub error: Option<String>,
}

impl ModerationVerdict {
    /// Verdict for a post with no content
    pub fn empty_post() -> Self {
        Self {
            safe: false,
            labels: Labels::from([LabelTag::Other]),
            allow_reason: String::new(),
            block_reason: "Empty post".to_string(),
            message_to_user: "Your post appears empty. Please add content.".to_string(),
            links: Vec::new(),
            fallback_used: false,
            error: None,
        }
    }
}

/// Two-valued classification used by the prompt gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PromptClass {
    Safe,
    Unsafe,
}

impl PromptClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "SAFE",
            Self::Unsafe => "UNSAFE",
        }
    }

    /// Parse a model answer; accepts only SAFE or UNSAFE after trimming
    pub fn parse_answer(raw: &str) -> Option<Self> {
        match raw.trim().trim_matches('`').trim().to_ascii_uppercase().as_str() {
            "SAFE" => Some(Self::Safe),
            "UNSAFE" => Some(Self::Unsafe),
            _ => None,
        }
    }
}

impl fmt::Display for PromptClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of gating an image-generation prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptVerdict {
    pub safe: bool,
    pub classification: PromptClass,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub fallback_used: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PromptVerdict {
    pub fn from_class(classification: PromptClass) -> Self {
        Self {
            safe: classification == PromptClass::Safe,
            classification,
            reason: None,
            fallback_used: false,
            error: None,
        }
    }
}

/// Topics chosen for a post
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicTagResult {
    /// Existing topics, lowercase
    pub selected: Vec<String>,

    /// Newly minted topics
    pub new: Vec<String>,
}

impl TopicTagResult {
    pub fn existing(selected: Vec<String>) -> Self {
        Self {
            selected,
            new: Vec::new(),
        }
    }

    pub fn minted(topic: String) -> Self {
        Self {
            selected: Vec::new(),
            new: vec![topic],
        }
    }

    pub fn total(&self) -> usize {
        self.selected.len() + self.new.len()
    }
}

/// Per-image label probabilities keyed by image path
pub type ImageScores = BTreeMap<String, BTreeMap<String, f32>>;

/// Result of scoring uploaded images
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageModerationReport {
    pub enabled: bool,
    #[serde(rename = "unsafe")]
    pub unsafe_paths: Vec<String>,
    pub details: ImageScores,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
