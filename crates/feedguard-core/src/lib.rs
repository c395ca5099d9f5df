//! FeedGuard Core
//!
//! Core types, traits, and utilities shared across FeedGuard components.
//!
//! This crate provides:
//! - The moderation and topic-tagging data model
//! - Error types and result handling
//! - Environment-style configuration
//! - Remote model traits and an OpenAI-compatible HTTP client
//! - A tolerant extractor for JSON objects embedded in model output

pub mod config;
pub mod error;
pub mod json;
pub mod links;
pub mod remote;
pub mod types;

pub use config::{ModerationConfig, RemoteConfig, Settings, TaggerConfig};
pub use error::{Error, Result};
pub use remote::{ChatModel, ClientProvider, Embedder, ImageScorer, ModelFactory, OpenAiCompatClient};
pub use types::{
    ChatMessage, ImageModerationReport, ImageScores, LabelTag, Labels, ModerationRequest,
    ModerationVerdict, PromptClass, PromptVerdict, TopicTagResult,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::remote::{ChatModel, Embedder, ImageScorer};
    pub use crate::types::{
        ChatMessage, LabelTag, Labels, ModerationRequest, ModerationVerdict, PromptClass,
        PromptVerdict, TopicTagResult,
    };
}
