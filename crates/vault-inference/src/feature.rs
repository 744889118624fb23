//! Feature scorer seam.
//!
//! [`FeatureScorer`] is where a trained model plugs in. The shipped
//! [`HeuristicFeatureScorer`] approximates one: per category it takes the
//! fraction of a fixed term list present in the text, adds bounded noise to
//! model uncertainty, and picks the argmax. Its generator is injectable so
//! tests can seed it.

use std::sync::Mutex;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use vault_core::{DocumentCategory, Error, Result};

use crate::vocabulary::category_features;

/// Argmax of a feature scorer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureScore {
    pub category: DocumentCategory,
    /// Within `[0, 1]`.
    pub confidence: f64,
}

impl FeatureScore {
    pub fn none() -> Self {
        Self {
            category: DocumentCategory::Other,
            confidence: 0.0,
        }
    }
}

/// Second-opinion scorer blended with the keyword scorer.
#[async_trait]
pub trait FeatureScorer: Send + Sync {
    /// Score lowercased `haystack` (name and extracted text).
    async fn score(&self, haystack: &str) -> Result<FeatureScore>;

    /// Scorer name for logs.
    fn name(&self) -> &str;
}

/// Term-fraction scorer with uniform jitter.
pub struct HeuristicFeatureScorer {
    rng: Mutex<StdRng>,
    jitter: f64,
}

impl HeuristicFeatureScorer {
    /// Scorer seeded from OS entropy.
    pub fn new(jitter: f64) -> Self {
        Self::with_rng(StdRng::from_entropy(), jitter)
    }

    /// Deterministic scorer for tests and reproducible runs.
    pub fn seeded(seed: u64, jitter: f64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), jitter)
    }

    pub fn with_rng(rng: StdRng, jitter: f64) -> Self {
        Self {
            rng: Mutex::new(rng),
            jitter: jitter.abs(),
        }
    }

    fn noise(&self) -> Result<f64> {
        if self.jitter == 0.0 {
            return Ok(0.0);
        }
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| Error::Classification("feature scorer rng poisoned".into()))?;
        Ok(rng.gen_range(-self.jitter..=self.jitter))
    }
}

/// Fraction of `category`'s feature terms present in `haystack`.
pub fn term_fraction(category: DocumentCategory, haystack: &str) -> f64 {
    let terms = category_features(category);
    if terms.is_empty() {
        return 0.0;
    }
    let present = terms.iter().filter(|t| haystack.contains(*t)).count();
    present as f64 / terms.len() as f64
}

#[async_trait]
impl FeatureScorer for HeuristicFeatureScorer {
    async fn score(&self, haystack: &str) -> Result<FeatureScore> {
        let mut best = FeatureScore::none();

        for category in DocumentCategory::CLASSIFIED {
            let fraction = term_fraction(category, haystack);
            if fraction == 0.0 {
                continue;
            }
            let confidence = (fraction + self.noise()?).clamp(0.0, 1.0);
            trace!(
                subsystem = "inference",
                component = "feature_scorer",
                category = %category,
                fraction,
                confidence,
                "Category scored"
            );
            if confidence > best.confidence {
                best = FeatureScore {
                    category,
                    confidence,
                };
            }
        }

        Ok(best)
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn zero_jitter_is_plain_fraction() {
        let scorer = HeuristicFeatureScorer::seeded(1, 0.0);
        let score = scorer
            .score("patient diagnosis dosage symptoms blood pressure prescribed lab results")
            .await
            .unwrap();
        assert_eq!(score.category, DocumentCategory::Medical);
        assert_eq!(score.confidence, 1.0);
    }

    #[tokio::test]
    async fn empty_text_scores_nothing() {
        let scorer = HeuristicFeatureScorer::seeded(7, 0.05);
        assert_eq!(scorer.score("").await.unwrap(), FeatureScore::none());
    }

    #[tokio::test]
    async fn jitter_stays_bounded() {
        let scorer = HeuristicFeatureScorer::seeded(42, 0.05);
        let base = term_fraction(DocumentCategory::Financial, "bank balance");
        for _ in 0..200 {
            let score = scorer.score("bank balance").await.unwrap();
            assert!((0.0..=1.0).contains(&score.confidence));
            if score.category == DocumentCategory::Financial {
                assert!((score.confidence - base).abs() <= 0.05 + 1e-12);
            }
        }
    }

    #[tokio::test]
    async fn same_seed_same_scores() {
        let a = HeuristicFeatureScorer::seeded(9, 0.05);
        let b = HeuristicFeatureScorer::seeded(9, 0.05);
        for _ in 0..10 {
            assert_eq!(
                a.score("tax year refund").await.unwrap(),
                b.score("tax year refund").await.unwrap()
            );
        }
    }
}
