//! FeedGuard Topic Tagging
//!
//! Assigns topics from a caller-supplied vocabulary to a post, and mints a
//! single new topic when nothing in the vocabulary is close enough.
//!
//! Selection strategies:
//! - Embeddings: enriched topic phrases scored by cosine similarity
//! - Listing: a chat model picks from the vocabulary
//! - Keywords: deterministic word overlap, used offline and on failure

pub mod listing;
pub mod matcher;
pub mod minter;
pub mod sanitize;
pub mod selector;
pub mod tagger;

pub use listing::ListingSelector;
pub use matcher::{cosine_similarity, enrich_topic_phrases, EmbeddingMatcher, TopicMatch};
pub use minter::NewTopicMinter;
pub use sanitize::{fallback_compact_subject, normalize_topic, sanitize_new_topic};
pub use selector::{KeywordSelector, TopicSelector};
pub use tagger::{TopicTagger, DEFAULT_MAX_TOPICS};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::selector::TopicSelector;
    pub use crate::tagger::TopicTagger;
}
