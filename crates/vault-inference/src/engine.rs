//! Classification engine: keyword scorer blended with a feature scorer.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use vault_core::{ClassificationResult, DocumentCategory};

use crate::config::ClassifierConfig;
use crate::feature::{FeatureScore, FeatureScorer, HeuristicFeatureScorer};
use crate::keyword::{keyword_hits, score_keywords};
use crate::kind::{detect_kind, merge_keywords};
use crate::language::detect_language;

/// Produces a [`ClassificationResult`] for a document. Never fails: a scorer
/// error degrades to the keyword-only result.
pub struct ClassificationEngine {
    config: ClassifierConfig,
    scorer: Arc<dyn FeatureScorer>,
}

impl ClassificationEngine {
    pub fn new(config: ClassifierConfig, scorer: Arc<dyn FeatureScorer>) -> Self {
        Self { config, scorer }
    }

    /// Engine backed by the entropy-seeded heuristic scorer.
    pub fn heuristic(config: ClassifierConfig) -> Self {
        let scorer = Arc::new(HeuristicFeatureScorer::new(config.feature_jitter));
        Self::new(config, scorer)
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify a document from its name, media type and extracted text.
    ///
    /// Empty text yields `Other` with confidence 0 and language `en`; the
    /// document kind still falls back to the media family.
    pub async fn classify(
        &self,
        name: &str,
        media_type: &str,
        extracted_text: &str,
    ) -> ClassificationResult {
        let start = Instant::now();
        let haystack = format!("{} {}", name, extracted_text).to_lowercase();
        let document_type = detect_kind(&haystack, media_type);

        if extracted_text.trim().is_empty() {
            debug!(
                subsystem = "inference",
                component = "classifier",
                media_type,
                "No extracted text, document left unclassified"
            );
            return ClassificationResult {
                document_type,
                ..ClassificationResult::unclassified()
            };
        }

        let keyword = score_keywords(&haystack);
        let feature = match self.scorer.score(&haystack).await {
            Ok(score) => Some(score),
            Err(e) => {
                warn!(
                    subsystem = "inference",
                    component = "classifier",
                    scorer = self.scorer.name(),
                    error = %e,
                    "Feature scorer failed, using keyword score only"
                );
                None
            }
        };

        let (category, confidence) = match feature {
            Some(feature) => self.blend(keyword.category, keyword.confidence, feature),
            None => (keyword.category, keyword.confidence),
        };

        let hits = if category == keyword.category {
            keyword.hits
        } else {
            keyword_hits(category, &haystack)
        };

        let result = ClassificationResult {
            category,
            confidence: confidence.clamp(0.0, 1.0),
            keywords: merge_keywords(&hits, extracted_text),
            document_type,
            language: detect_language(extracted_text).to_string(),
        };

        debug!(
            subsystem = "inference",
            component = "classifier",
            category = %result.category,
            confidence = result.confidence,
            document_type = %result.document_type,
            language = %result.language,
            duration_ms = start.elapsed().as_millis() as u64,
            "Document classified"
        );
        result
    }

    /// `finalConfidence = kw * kc + fw * fc`; the feature category wins only
    /// above the threshold.
    fn blend(
        &self,
        keyword_category: DocumentCategory,
        keyword_confidence: f64,
        feature: FeatureScore,
    ) -> (DocumentCategory, f64) {
        let confidence = self.config.keyword_weight * keyword_confidence
            + self.config.feature_weight * feature.confidence;
        let category = if feature.confidence > self.config.feature_threshold {
            feature.category
        } else {
            keyword_category
        };
        (category, confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ClassificationEngine {
        ClassificationEngine::new(
            ClassifierConfig::default(),
            Arc::new(HeuristicFeatureScorer::seeded(3, 0.0)),
        )
    }

    #[test]
    fn blend_prefers_keyword_below_threshold() {
        let e = engine();
        let (category, confidence) = e.blend(
            DocumentCategory::Financial,
            1.0,
            FeatureScore {
                category: DocumentCategory::Legal,
                confidence: 0.7,
            },
        );
        assert_eq!(category, DocumentCategory::Financial);
        assert!((confidence - (0.4 + 0.42)).abs() < 1e-9);
    }

    #[test]
    fn blend_prefers_feature_above_threshold() {
        let e = engine();
        let (category, _) = e.blend(
            DocumentCategory::Financial,
            0.33,
            FeatureScore {
                category: DocumentCategory::Medical,
                confidence: 0.71,
            },
        );
        assert_eq!(category, DocumentCategory::Medical);
    }

    #[tokio::test]
    async fn empty_text_is_unclassified() {
        let result = engine().classify("scan.png", "image/png", "   ").await;
        assert_eq!(result.category, DocumentCategory::Other);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.language, "en");
        assert!(result.keywords.is_empty());
        assert_eq!(result.document_type, vault_core::DocumentKind::Image);
    }
}
