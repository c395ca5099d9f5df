//! Environment-style configuration
//!
//! Keys are read from an optional YAML file and then from the process
//! environment (`MODERATION_MAX_RETRIES=5` sets `moderation_max_retries`).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::{Error, Result};

/// Flat settings as they appear in the environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_model")]
    pub moderation_model: String,

    #[serde(default)]
    pub moderation_temp: f32,

    #[serde(default = "default_max_retries")]
    pub moderation_max_retries: u32,

    /// Seconds
    #[serde(default = "default_backoff_base")]
    pub moderation_backoff_base: f64,

    #[serde(default = "default_backoff_factor")]
    pub moderation_backoff_factor: f64,

    #[serde(default = "default_timeout_secs")]
    pub moderation_timeout_secs: u64,

    #[serde(default)]
    pub moderation_force_rules_only: bool,

    #[serde(default = "default_embedding_model")]
    pub tagger_emb_model: String,

    #[serde(default = "default_model")]
    pub tagger_llm_model: String,

    #[serde(default = "default_high_threshold")]
    pub tagger_high_threshold: f32,

    #[serde(default = "default_low_threshold")]
    pub tagger_low_threshold: f32,

    #[serde(default = "default_max_enriched")]
    pub tagger_max_enriched: usize,

    #[serde(default = "default_true")]
    pub tagger_use_embeddings: bool,

    #[serde(default)]
    pub together_api_key: Option<String>,

    #[serde(default)]
    pub openai_api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub remote_base_url: String,

    #[serde(default = "default_image_threshold")]
    pub image_threshold: f32,

    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_requests: usize,
}

impl Settings {
    /// Load from an optional YAML file, overridden by the process environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        Self::build(config_path, None)
    }

    /// Load from an explicit key/value map instead of the process environment
    pub fn from_env_map(vars: HashMap<String, String>) -> Result<Self> {
        Self::build(None, Some(vars))
    }

    fn build(config_path: Option<&Path>, vars: Option<HashMap<String, String>>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        builder = builder.add_source(config::Environment::default().source(vars));

        let settings: Settings = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| Error::config(format!("Failed to load settings: {}", e)))?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.tagger_low_threshold > self.tagger_high_threshold {
            return Err(Error::config(format!(
                "tagger_low_threshold ({}) exceeds tagger_high_threshold ({})",
                self.tagger_low_threshold, self.tagger_high_threshold
            )));
        }
        if self.moderation_backoff_base < 0.0 || self.moderation_backoff_factor < 0.0 {
            return Err(Error::config("backoff base and factor must be non-negative"));
        }
        Ok(())
    }

    /// First non-empty credential, Together preferred
    pub fn api_key(&self) -> Option<&str> {
        [&self.together_api_key, &self.openai_api_key]
            .into_iter()
            .flatten()
            .map(|k| k.trim())
            .find(|k| !k.is_empty())
    }

    pub fn remote(&self) -> Option<RemoteConfig> {
        self.api_key().map(|key| RemoteConfig {
            base_url: self.remote_base_url.clone(),
            api_key: key.to_string(),
            timeout: Duration::from_secs(self.moderation_timeout_secs),
        })
    }

    pub fn moderation(&self) -> ModerationConfig {
        ModerationConfig {
            model: self.moderation_model.clone(),
            temperature: self.moderation_temp,
            max_retries: self.moderation_max_retries,
            backoff_base: Duration::try_from_secs_f64(self.moderation_backoff_base).unwrap_or_default(),
            backoff_factor: self.moderation_backoff_factor,
            force_rules_only: self.moderation_force_rules_only,
        }
    }

    pub fn tagger(&self) -> TaggerConfig {
        TaggerConfig {
            embedding_model: self.tagger_emb_model.clone(),
            llm_model: self.tagger_llm_model.clone(),
            high_threshold: self.tagger_high_threshold,
            low_threshold: self.tagger_low_threshold,
            max_enriched: self.tagger_max_enriched,
            use_embeddings: self.tagger_use_embeddings,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            moderation_model: default_model(),
            moderation_temp: 0.0,
            moderation_max_retries: default_max_retries(),
            moderation_backoff_base: default_backoff_base(),
            moderation_backoff_factor: default_backoff_factor(),
            moderation_timeout_secs: default_timeout_secs(),
            moderation_force_rules_only: false,
            tagger_emb_model: default_embedding_model(),
            tagger_llm_model: default_model(),
            tagger_high_threshold: default_high_threshold(),
            tagger_low_threshold: default_low_threshold(),
            tagger_max_enriched: default_max_enriched(),
            tagger_use_embeddings: true,
            together_api_key: None,
            openai_api_key: None,
            remote_base_url: default_base_url(),
            image_threshold: default_image_threshold(),
            max_concurrent_requests: default_max_concurrent(),
        }
    }
}

/// Connection details for an OpenAI-compatible endpoint
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

/// Moderation orchestrator settings
#[derive(Debug, Clone)]
pub struct ModerationConfig {
    pub model: String,
    pub temperature: f32,
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub backoff_factor: f64,
    pub force_rules_only: bool,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Settings::default().moderation()
    }
}

/// Topic tagger settings
#[derive(Debug, Clone)]
pub struct TaggerConfig {
    pub embedding_model: String,
    pub llm_model: String,
    pub high_threshold: f32,
    pub low_threshold: f32,
    pub max_enriched: usize,
    pub use_embeddings: bool,
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Settings::default().tagger()
    }
}

fn default_model() -> String {
    "meta-llama/Llama-3.3-70B-Instruct-Turbo-Free".to_string()
}

fn default_embedding_model() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}

fn default_base_url() -> String {
    "https://api.together.xyz/v1".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_base() -> f64 {
    0.8
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_timeout_secs() -> u64 {
    45
}

fn default_high_threshold() -> f32 {
    0.45
}

fn default_low_threshold() -> f32 {
    0.22
}

fn default_max_enriched() -> usize {
    4
}

fn default_image_threshold() -> f32 {
    0.85
}

fn default_max_concurrent() -> usize {
    8
}

fn default_true() -> bool {
    true
}
