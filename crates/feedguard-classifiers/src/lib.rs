//! FeedGuard Classifiers
//!
//! Deterministic, network-free classifiers used as the moderation safety net:
//! - Pattern library: categorised regex and phrase matchers, link risk heuristics
//! - Rules-only classifier: label aggregation and the safe/unsafe verdict
//! - Image moderation: thresholding of an external NSFW scorer
//!
//! Everything here is a pure function of its input and safe to share across tasks.

pub mod images;
pub mod patterns;
pub mod rules;

pub use images::{moderate_images, sexual_score, DEFAULT_IMAGE_THRESHOLD};
pub use patterns::{LinkRisk, PatternCategory, PatternLibrary};
pub use rules::{RuleHit, RuleReport, RulesClassifier, SHORT_TEXT_LEN};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::patterns::{PatternCategory, PatternLibrary};
    pub use crate::rules::{RuleReport, RulesClassifier};
}
