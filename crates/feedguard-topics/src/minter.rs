//! New-topic minting
//!
//! Asks a chat model for one short topic when nothing in the vocabulary
//! fits. The answer is sanitized; if it is unusable, or the model cannot be
//! reached, a heuristic subject is taken from the post itself. Only when
//! both fail is an error returned, since callers always need a tag.

use feedguard_core::json::extract_json_object;
use feedguard_core::{ChatMessage, ClientProvider, Error, Result};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::sanitize::{fallback_compact_subject, sanitize_new_topic};

const NEW_TOPIC_PROMPT: &str = "You are creating ONE short, human-meaningful topic for this post because none of the existing topics fit.

Rules:
- Output JSON ONLY: {\"new\": \"short_topic\"}
- 1-3 words, lowercase, no punctuation, no hashtags/emojis.
- Avoid generic adjectives like \"amazing\", \"interesting\", \"today\".
- It must be a real subject/category a user would follow, not a random adjective.";

fn new_topic_messages(text: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(NEW_TOPIC_PROMPT),
        ChatMessage::user(format!("Post:\n\"\"\"{}\"\"\"", text)),
    ]
}

/// Read the `new` field from a model answer and sanitize it
pub fn parse_new_topic(raw: &str) -> Result<Option<String>> {
    let object = extract_json_object(raw)?;
    let candidate = match object.get("new") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    Ok(sanitize_new_topic(&candidate))
}

/// Proposes a single new topic for a post
pub struct NewTopicMinter {
    provider: Arc<ClientProvider>,
}

impl NewTopicMinter {
    pub fn new(provider: Arc<ClientProvider>) -> Self {
        Self { provider }
    }

    /// Mint one topic for `text`
    pub async fn mint(&self, text: &str) -> Result<String> {
        let model_error = match self.ask_model(text).await {
            Ok(Some(topic)) => {
                debug!(topic = %topic, "Minted topic from model");
                return Ok(topic);
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "New-topic model call failed, using heuristic");
                Some(e)
            }
        };

        match fallback_compact_subject(text) {
            Some(topic) => {
                debug!(topic = %topic, "Minted topic from heuristic");
                Ok(topic)
            }
            None => Err(Error::topic_minting(match model_error {
                Some(e) => format!("new-topic model failed: {}", e),
                None => "no usable topic in model answer or post text".to_string(),
            })),
        }
    }

    async fn ask_model(&self, text: &str) -> Result<Option<String>> {
        let model = self
            .provider
            .get()
            .ok_or_else(|| Error::config(self.provider.unavailable_reason().to_string()))?;
        let raw = model.complete(&new_topic_messages(text)).await?;
        parse_new_topic(&raw)
    }
}
