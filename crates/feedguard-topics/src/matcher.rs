//! Embedding-based topic matching
//!
//! Each candidate topic is expanded into a few paraphrases. A topic's score
//! is the best cosine similarity between the post and any of its phrases.
//! All topics at or above the high threshold are selected; failing that the
//! single best topic is kept if it clears the low threshold.

use async_trait::async_trait;
use feedguard_core::{Embedder, Error, Result, TaggerConfig};
use std::sync::Arc;
use tracing::debug;

use crate::selector::{candidate_topics, TopicSelector};

/// Default number of paraphrases per topic
pub const DEFAULT_MAX_ENRICHED: usize = 4;

/// Paraphrases of `topic` used to widen embedding recall
pub fn enrich_topic_phrases(topic: &str, max_phrases: usize) -> Vec<String> {
    let topic = topic.trim();
    [
        topic.to_string(),
        format!("this post is about {}", topic),
        format!("{} discussion", topic),
        format!("{} topic", topic),
    ]
    .into_iter()
    .take(max_phrases.max(1))
    .collect()
}

/// Cosine similarity; 0 for mismatched lengths or zero vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}

/// Two-tier threshold policy over topics ranked by descending score
pub fn select_by_thresholds(
    ranked: &[(String, f32)],
    max_topics: usize,
    high_threshold: f32,
    low_threshold: f32,
) -> Vec<String> {
    let strong: Vec<String> = ranked
        .iter()
        .filter(|(_, score)| *score >= high_threshold)
        .take(max_topics)
        .map(|(topic, _)| topic.clone())
        .collect();
    if !strong.is_empty() {
        return strong;
    }

    match ranked.first() {
        Some((topic, score)) if *score >= low_threshold && max_topics > 0 => vec![topic.clone()],
        _ => Vec::new(),
    }
}

/// Result of scoring a post against the vocabulary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopicMatch {
    /// Chosen topics, normalized
    pub selected: Vec<String>,
    /// Every candidate with its score, best first
    pub ranked: Vec<(String, f32)>,
}

/// Topic selector backed by an embedding model
pub struct EmbeddingMatcher {
    embedder: Arc<dyn Embedder>,
    high_threshold: f32,
    low_threshold: f32,
    max_enriched: usize,
}

impl EmbeddingMatcher {
    pub fn new(embedder: Arc<dyn Embedder>, config: &TaggerConfig) -> Self {
        Self {
            embedder,
            high_threshold: config.high_threshold,
            low_threshold: config.low_threshold,
            max_enriched: config.max_enriched,
        }
    }

    /// Score every topic and apply the threshold policy
    pub async fn pick_existing(&self, text: &str, existing: &[String], max_topics: usize) -> Result<TopicMatch> {
        let topics = candidate_topics(existing);
        if topics.is_empty() {
            return Ok(TopicMatch::default());
        }

        // One batch: the post first, then each topic's phrases in order
        let phrase_sets: Vec<Vec<String>> = topics
            .iter()
            .map(|t| enrich_topic_phrases(t, self.max_enriched))
            .collect();
        let mut inputs = Vec::with_capacity(1 + phrase_sets.iter().map(Vec::len).sum::<usize>());
        inputs.push(text.to_string());
        inputs.extend(phrase_sets.iter().flatten().cloned());

        let vectors = self.embedder.embed(&inputs).await?;
        if vectors.len() != inputs.len() {
            return Err(Error::schema(format!(
                "expected {} embeddings, got {}",
                inputs.len(),
                vectors.len()
            )));
        }

        let (post, mut rest) = (&vectors[0], &vectors[1..]);
        let mut ranked = Vec::with_capacity(topics.len());
        for (topic, phrases) in topics.into_iter().zip(&phrase_sets) {
            let (own, tail) = rest.split_at(phrases.len());
            rest = tail;
            let score = own
                .iter()
                .map(|v| cosine_similarity(post, v))
                .fold(f32::NEG_INFINITY, f32::max);
            ranked.push((topic, score));
        }
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        let selected = select_by_thresholds(&ranked, max_topics, self.high_threshold, self.low_threshold);
        debug!(
            candidates = ranked.len(),
            selected = selected.len(),
            best = ranked.first().map(|(_, s)| *s).unwrap_or_default(),
            "Scored topics by embedding"
        );
        Ok(TopicMatch { selected, ranked })
    }
}

#[async_trait]
impl TopicSelector for EmbeddingMatcher {
    async fn select(&self, text: &str, existing: &[String], max_topics: usize) -> Result<Vec<String>> {
        Ok(self.pick_existing(text, existing, max_topics).await?.selected)
    }

    fn name(&self) -> &str {
        "embeddings"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(items: &[(&str, f32)]) -> Vec<(String, f32)> {
        items.iter().map(|(t, s)| (t.to_string(), *s)).collect()
    }

    #[test]
    fn test_enrich_topic_phrases() {
        let phrases = enrich_topic_phrases(" soccer ", DEFAULT_MAX_ENRICHED);
        assert_eq!(
            phrases,
            vec!["soccer", "this post is about soccer", "soccer discussion", "soccer topic"]
        );
        assert_eq!(enrich_topic_phrases("soccer", 2).len(), 2);
        assert_eq!(enrich_topic_phrases("soccer", 0), vec!["soccer"]);
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_all_strong_matches_are_kept() {
        let r = ranked(&[("soccer", 0.8), ("football", 0.6), ("sports", 0.5), ("finance", 0.1)]);
        assert_eq!(select_by_thresholds(&r, 5, 0.45, 0.22), vec!["soccer", "football", "sports"]);
        assert_eq!(select_by_thresholds(&r, 2, 0.45, 0.22), vec!["soccer", "football"]);
    }

    #[test]
    fn test_nearest_neighbor_fallback() {
        let r = ranked(&[("cooking", 0.3), ("travel", 0.25)]);
        assert_eq!(select_by_thresholds(&r, 3, 0.45, 0.22), vec!["cooking"]);
    }

    #[test]
    fn test_nothing_close_enough() {
        let r = ranked(&[("cooking", 0.2), ("travel", 0.1)]);
        assert!(select_by_thresholds(&r, 3, 0.45, 0.22).is_empty());
        assert!(select_by_thresholds(&[], 3, 0.45, 0.22).is_empty());
        assert!(select_by_thresholds(&ranked(&[("cooking", 0.3)]), 0, 0.45, 0.22).is_empty());
    }
}
