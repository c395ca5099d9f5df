//! OpenAI-compatible HTTP client
//!
//! Speaks the `/chat/completions` and `/embeddings` endpoints exposed by
//! OpenAI, Together and most hosted inference providers:
//! ```text
//! POST {base}/chat/completions  {"model": "...", "temperature": 0.0, "messages": [...]}
//! -> {"choices": [{"index": 0, "message": {"role": "assistant", "content": "..."}}]}
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ChatModel, Embedder};
use crate::config::RemoteConfig;
use crate::types::ChatMessage;
use crate::{Error, Result};

/// Client for one model on an OpenAI-compatible endpoint
#[derive(Debug, Clone)]
pub struct OpenAiCompatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiCompatClient {
    /// Create a client; the remote timeout applies to every request
    pub fn new(remote: &RemoteConfig, model: impl Into<String>, temperature: f32) -> Result<Self> {
        if remote.api_key.trim().is_empty() {
            return Err(Error::config("remote API key is empty"));
        }

        let http = reqwest::Client::builder()
            .timeout(remote.timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: remote.base_url.trim_end_matches('/').to_string(),
            api_key: remote.api_key.clone(),
            model: model.into(),
            temperature,
        })
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<String> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(model = %self.model, %url, "Calling remote model");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(Error::transport(format!(
                "{} returned {}: {}",
                path,
                status,
                truncate(&text, 200)
            )));
        }
        Ok(text)
    }
}

#[async_trait]
impl ChatModel for OpenAiCompatClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages,
        };
        let body = self.post("chat/completions", &request).await?;
        parse_chat_response(&body)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Embedder for OpenAiCompatClient {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        let request = EmbeddingRequest {
            model: &self.model,
            input: inputs,
        };
        let body = self.post("embeddings", &request).await?;
        parse_embedding_response(&body, inputs.len())
    }
}

/// Extract the assistant text from a chat completion body
pub fn parse_chat_response(body: &str) -> Result<String> {
    let response: ChatResponse = serde_json::from_str(body)?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| Error::schema("chat completion has no message content"))
}

/// Extract embeddings, restoring input order from the `index` field
pub fn parse_embedding_response(body: &str, expected: usize) -> Result<Vec<Vec<f32>>> {
    let mut response: EmbeddingResponse = serde_json::from_str(body)?;
    if response.data.len() != expected {
        return Err(Error::schema(format!(
            "expected {} embeddings, got {}",
            expected,
            response.data.len()
        )));
    }
    response.data.sort_by_key(|item| item.index);
    Ok(response.data.into_iter().map(|item| item.embedding).collect())
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// =============================================================================
// Wire structures
// =============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}
