//! Topic tagging entry point

use feedguard_core::{ClientProvider, Embedder, Result, TaggerConfig, TopicTagResult};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::listing::ListingSelector;
use crate::matcher::EmbeddingMatcher;
use crate::minter::NewTopicMinter;
use crate::selector::{KeywordSelector, TopicSelector};

/// Default cap on topics per post
pub const DEFAULT_MAX_TOPICS: usize = 3;

/// Chooses existing topics for a post, minting a new one when none fit
pub struct TopicTagger {
    selector: Box<dyn TopicSelector>,
    fallback: KeywordSelector,
    minter: NewTopicMinter,
}

impl TopicTagger {
    /// Tagger with an explicit selection strategy
    pub fn new(selector: Box<dyn TopicSelector>, provider: Arc<ClientProvider>) -> Self {
        Self {
            selector,
            fallback: KeywordSelector,
            minter: NewTopicMinter::new(provider),
        }
    }

    /// Pick a strategy from configuration: embeddings when enabled and an
    /// embedder exists, else model listing when a model is configured, else
    /// keyword overlap.
    pub fn from_config(
        config: &TaggerConfig,
        embedder: Option<Arc<dyn Embedder>>,
        provider: Arc<ClientProvider>,
    ) -> Self {
        let selector: Box<dyn TopicSelector> = match embedder {
            Some(embedder) if config.use_embeddings => Box::new(EmbeddingMatcher::new(embedder, config)),
            _ if provider.is_configured() => Box::new(ListingSelector::new(provider.clone())),
            _ => Box::new(KeywordSelector),
        };
        debug!(strategy = selector.name(), "Topic tagger ready");
        Self::new(selector, provider)
    }

    pub fn strategy(&self) -> &str {
        self.selector.name()
    }

    /// Tag `text` against `existing` topics.
    ///
    /// Returns at most `max_topics` topics in total. Fails only when a new
    /// topic is needed and none could be produced.
    pub async fn tag_topics(&self, text: &str, existing: &[String], max_topics: usize) -> Result<TopicTagResult> {
        if text.trim().is_empty() || max_topics == 0 {
            metrics::counter!("feedguard_topic_tagging_total", "outcome" => "empty").increment(1);
            return Ok(TopicTagResult::default());
        }

        let selected = match self.selector.select(text, existing, max_topics).await {
            Ok(selected) => selected,
            Err(e) => {
                warn!(strategy = self.selector.name(), error = %e, "Topic selection failed, using keyword overlap");
                self.fallback.select(text, existing, max_topics).await?
            }
        };

        if !selected.is_empty() {
            metrics::counter!("feedguard_topic_tagging_total", "outcome" => "existing").increment(1);
            let mut selected = selected;
            selected.truncate(max_topics);
            return Ok(TopicTagResult::existing(selected));
        }

        match self.minter.mint(text).await {
            Ok(topic) => {
                metrics::counter!("feedguard_topic_tagging_total", "outcome" => "minted").increment(1);
                Ok(TopicTagResult::minted(topic))
            }
            Err(e) => {
                metrics::counter!("feedguard_topic_tagging_total", "outcome" => "failed").increment(1);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline() -> TopicTagger {
        let provider = Arc::new(ClientProvider::unavailable("no key"));
        TopicTagger::from_config(&TaggerConfig::default(), None, provider)
    }

    fn topics(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_strategy_selection() {
        assert_eq!(offline().strategy(), "keywords");

        let provider = Arc::new(ClientProvider::new(|| -> Result<Arc<dyn feedguard_core::ChatModel>> {
            Err(feedguard_core::Error::config("unused"))
        }));
        let tagger = TopicTagger::from_config(&TaggerConfig::default(), None, provider);
        assert_eq!(tagger.strategy(), "listing");
    }

    #[tokio::test]
    async fn test_blank_text_and_zero_budget() {
        let tagger = offline();
        assert_eq!(tagger.tag_topics("  ", &topics(&["soccer"]), 3).await.unwrap(), TopicTagResult::default());
        assert_eq!(tagger.tag_topics("soccer", &topics(&["soccer"]), 0).await.unwrap(), TopicTagResult::default());
    }

    #[tokio::test]
    async fn test_offline_tagging() {
        let tagger = offline();
        let result = tagger
            .tag_topics("Soccer fans celebrate", &topics(&["Soccer", "finance"]), 3)
            .await
            .unwrap();
        assert_eq!(result.selected, topics(&["soccer"]));
        assert!(result.new.is_empty());

        let result = tagger
            .tag_topics("Knitting patterns for winter", &topics(&["Soccer", "finance"]), 3)
            .await
            .unwrap();
        assert!(result.selected.is_empty());
        assert_eq!(result.new, topics(&["knitting patterns"]));
    }
}
