//! Image moderation on top of an external NSFW scorer
//!
//! The scorer is a black box returning per-label probabilities for each
//! image path. An image is unsafe when the summed sexual-content labels
//! reach the threshold.

use feedguard_core::{ImageModerationReport, ImageScorer};
use std::collections::BTreeMap;
use tracing::warn;

/// Default combined probability at which an image is blocked
pub const DEFAULT_IMAGE_THRESHOLD: f32 = 0.85;

/// Scorer labels that count towards the sexual-content score
pub const SEXUAL_IMAGE_LABELS: [&str; 3] = ["porn", "sexy", "hentai"];

/// Sum of the sexual-content label probabilities
pub fn sexual_score(scores: &BTreeMap<String, f32>) -> f32 {
    SEXUAL_IMAGE_LABELS
        .iter()
        .filter_map(|label| scores.get(*label))
        .sum()
}

/// Score `paths` and flag images at or above `threshold`
pub async fn moderate_images(
    scorer: Option<&dyn ImageScorer>,
    paths: &[String],
    threshold: f32,
) -> ImageModerationReport {
    if paths.is_empty() {
        return ImageModerationReport {
            enabled: scorer.is_some(),
            ..Default::default()
        };
    }

    let Some(scorer) = scorer else {
        return ImageModerationReport {
            enabled: false,
            note: Some("No image scorer configured; image moderation is disabled.".to_string()),
            ..Default::default()
        };
    };

    match scorer.score(paths).await {
        Ok(details) => {
            let unsafe_paths = details
                .iter()
                .filter(|(_, scores)| sexual_score(scores) >= threshold)
                .map(|(path, _)| path.clone())
                .collect();
            ImageModerationReport {
                enabled: true,
                unsafe_paths,
                details,
                note: None,
                error: None,
            }
        }
        Err(e) => {
            warn!("Image scorer failed: {}", e);
            ImageModerationReport {
                enabled: false,
                error: Some(format!("image moderation failed: {}", e)),
                ..Default::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use feedguard_core::{Error, ImageScores, Result};

    struct FixedScorer(ImageScores);

    #[async_trait]
    impl ImageScorer for FixedScorer {
        async fn score(&self, paths: &[String]) -> Result<ImageScores> {
            Ok(self
                .0
                .iter()
                .filter(|(path, _)| paths.contains(path))
                .map(|(p, s)| (p.clone(), s.clone()))
                .collect())
        }
    }

    struct BrokenScorer;

    #[async_trait]
    impl ImageScorer for BrokenScorer {
        async fn score(&self, _paths: &[String]) -> Result<ImageScores> {
            Err(Error::internal("model file missing"))
        }
    }

    fn scores(pairs: &[(&str, f32)]) -> BTreeMap<String, f32> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn paths(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sexual_score_sums_adjacent_labels() {
        let s = scores(&[("porn", 0.5), ("sexy", 0.25), ("hentai", 0.1), ("neutral", 0.15)]);
        assert!((sexual_score(&s) - 0.85).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_flags_images_over_threshold() {
        let mut all = ImageScores::new();
        all.insert("beach.jpg".to_string(), scores(&[("neutral", 0.9), ("sexy", 0.1)]));
        all.insert("nsfw.jpg".to_string(), scores(&[("porn", 0.7), ("sexy", 0.2)]));
        let scorer = FixedScorer(all);

        let report = moderate_images(
            Some(&scorer),
            &paths(&["beach.jpg", "nsfw.jpg"]),
            DEFAULT_IMAGE_THRESHOLD,
        )
        .await;

        assert!(report.enabled);
        assert_eq!(report.unsafe_paths, vec!["nsfw.jpg"]);
        assert_eq!(report.details.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_paths() {
        let scorer = BrokenScorer;
        let report = moderate_images(Some(&scorer), &[], 0.5).await;
        assert!(report.enabled);
        assert!(report.unsafe_paths.is_empty());

        let report = moderate_images(None, &[], 0.5).await;
        assert!(!report.enabled);
    }

    #[tokio::test]
    async fn test_missing_scorer_adds_note() {
        let report = moderate_images(None, &paths(&["a.png"]), 0.5).await;
        assert!(!report.enabled);
        assert!(report.note.is_some());
    }

    #[tokio::test]
    async fn test_scorer_failure_is_reported() {
        let report = moderate_images(Some(&BrokenScorer), &paths(&["a.png"]), 0.5).await;
        assert!(!report.enabled);
        assert!(report.error.unwrap().contains("model file missing"));
    }
}
