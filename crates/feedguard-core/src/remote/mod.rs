//! Remote model contracts
//!
//! The moderation and tagging engines talk to hosted models only through
//! these traits, so tests and alternative providers can stand in for the
//! HTTP client.

pub mod openai;
pub mod provider;

use async_trait::async_trait;

use crate::types::{ChatMessage, ImageScores};
use crate::Result;

pub use openai::OpenAiCompatClient;
pub use provider::{ClientProvider, ModelFactory};

/// A chat-completion model returning free-form text
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send the conversation and return the assistant's reply
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Model identifier used for requests
    fn model(&self) -> &str;
}

/// A text embedding model
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed each input; output order matches input order
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Per-image NSFW scorer keyed by path
#[async_trait]
pub trait ImageScorer: Send + Sync {
    async fn score(&self, paths: &[String]) -> Result<ImageScores>;
}
