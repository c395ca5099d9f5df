//! Shared application state

use anyhow::Result;
use feedguard_core::{ClientProvider, Embedder, ImageScorer, OpenAiCompatClient, Settings};
use feedguard_moderation::Moderator;
use feedguard_topics::TopicTagger;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{info, warn};

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    /// Loaded settings
    pub settings: Arc<Settings>,

    /// Post and prompt moderation
    pub moderator: Arc<Moderator>,

    /// Topic selection and minting
    pub tagger: Arc<TopicTagger>,

    /// External NSFW scorer, when one is wired in
    pub image_scorer: Option<Arc<dyn ImageScorer>>,

    /// Bounds concurrent requests into the engines
    pub limiter: Arc<Semaphore>,

    /// Prometheus metrics handle for rendering
    pub metrics_handle: PrometheusHandle,
}

impl AppState {
    /// Build the engines from settings
    pub fn new(settings: Settings, metrics_handle: PrometheusHandle) -> Result<Self> {
        let remote = settings.remote();
        if remote.is_none() {
            warn!("No API key configured; moderation runs rules-only and topics use keyword overlap");
        }

        let moderation = settings.moderation();
        let moderation_provider = Arc::new(ClientProvider::from_remote(
            remote.clone(),
            &moderation.model,
            moderation.temperature,
        ));
        let moderator = Moderator::new(moderation_provider, &moderation)?;

        let tagging = settings.tagger();
        let tagging_provider = Arc::new(ClientProvider::from_remote(remote.clone(), &tagging.llm_model, 0.0));
        let embedder: Option<Arc<dyn Embedder>> = match &remote {
            Some(remote) if tagging.use_embeddings => {
                let client = OpenAiCompatClient::new(remote, tagging.embedding_model.clone(), 0.0)?;
                Some(Arc::new(client))
            }
            _ => None,
        };
        let tagger = TopicTagger::from_config(&tagging, embedder, tagging_provider);

        info!(
            moderation_model = %moderation.model,
            force_rules_only = moderation.force_rules_only,
            topic_strategy = tagger.strategy(),
            max_concurrent = settings.max_concurrent_requests,
            "Engines initialized"
        );

        Ok(Self {
            limiter: Arc::new(Semaphore::new(settings.max_concurrent_requests.max(1))),
            settings: Arc::new(settings),
            moderator: Arc::new(moderator),
            tagger: Arc::new(tagger),
            image_scorer: None,
            metrics_handle,
        })
    }

    /// Attach an external image scorer
    #[cfg(test)]
    pub fn with_image_scorer(mut self, scorer: Arc<dyn ImageScorer>) -> Self {
        self.image_scorer = Some(scorer);
        self
    }
}
