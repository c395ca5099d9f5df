//! Topic selection by asking a chat model to pick from the vocabulary
//!
//! Used when no embedding model is configured. Any model failure degrades
//! to keyword overlap so selection stays deterministic offline.

use async_trait::async_trait;
use feedguard_core::json::extract_json_object;
use feedguard_core::{ChatMessage, ClientProvider, Error, Result};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use crate::sanitize::normalize_topic;
use crate::selector::{candidate_topics, KeywordSelector, TopicSelector};

const LISTING_PROMPT: &str = "You are tagging a social post with topics from a fixed list.

Rules:
- Output JSON ONLY: {\"selected\": [\"topic\", ...]}
- Choose only topics that appear exactly in the list below.
- Choose at most {max} topics, most relevant first.
- If no topic clearly fits, output {\"selected\": []}.";

fn listing_messages(text: &str, topics: &[String], max_topics: usize) -> Vec<ChatMessage> {
    let rules = LISTING_PROMPT.replace("{max}", &max_topics.to_string());
    let list = topics
        .iter()
        .map(|t| format!("- {}", t))
        .collect::<Vec<_>>()
        .join("\n");
    vec![
        ChatMessage::system(rules),
        ChatMessage::user(format!("Topics:\n{}\n\nPost:\n\"\"\"{}\"\"\"", list, text)),
    ]
}

/// Keep model picks that name a known topic, in order, without repeats
pub fn parse_listing(raw: &str, topics: &[String], max_topics: usize) -> Result<Vec<String>> {
    let object = extract_json_object(raw)?;
    let picks = match object.get("selected") {
        Some(Value::Array(items)) => items,
        _ => return Err(Error::schema("missing array 'selected'")),
    };

    let mut selected: Vec<String> = Vec::new();
    for name in picks.iter().filter_map(Value::as_str).map(normalize_topic) {
        if topics.contains(&name) && !selected.contains(&name) {
            selected.push(name);
        }
    }
    selected.truncate(max_topics);
    Ok(selected)
}

/// Chat-model selector with keyword-overlap fallback
pub struct ListingSelector {
    provider: Arc<ClientProvider>,
    fallback: KeywordSelector,
}

impl ListingSelector {
    pub fn new(provider: Arc<ClientProvider>) -> Self {
        Self {
            provider,
            fallback: KeywordSelector,
        }
    }

    async fn ask_model(&self, text: &str, topics: &[String], max_topics: usize) -> Result<Vec<String>> {
        let model = self
            .provider
            .get()
            .ok_or_else(|| Error::config(self.provider.unavailable_reason().to_string()))?;
        let raw = model.complete(&listing_messages(text, topics, max_topics)).await?;
        parse_listing(&raw, topics, max_topics)
    }
}

#[async_trait]
impl TopicSelector for ListingSelector {
    async fn select(&self, text: &str, existing: &[String], max_topics: usize) -> Result<Vec<String>> {
        let topics = candidate_topics(existing);
        if topics.is_empty() || max_topics == 0 {
            return Ok(Vec::new());
        }

        match self.ask_model(text, &topics, max_topics).await {
            Ok(selected) => Ok(selected),
            Err(e) => {
                warn!(error = %e, "Topic listing failed, using keyword overlap");
                if e.is_retryable() {
                    self.provider.recreate();
                }
                self.fallback.select(text, &topics, max_topics).await
            }
        }
    }

    fn name(&self) -> &str {
        "listing"
    }
}
