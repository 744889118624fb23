//! Keyword scorer: distinct keyword hits per category.

use vault_core::defaults::KEYWORD_SATURATION_HITS;
use vault_core::DocumentCategory;

use crate::vocabulary::category_keywords;

/// Winning category of the keyword scorer.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordScore {
    pub category: DocumentCategory,
    /// `min(hits / 3, 1)`; zero when nothing matched.
    pub confidence: f64,
    /// Keywords of the winning category found in the input, in table order.
    pub hits: Vec<&'static str>,
}

impl KeywordScore {
    fn none() -> Self {
        Self {
            category: DocumentCategory::Other,
            confidence: 0.0,
            hits: Vec::new(),
        }
    }
}

/// Keywords of `category` that occur in `haystack` (already lowercased).
pub fn keyword_hits(category: DocumentCategory, haystack: &str) -> Vec<&'static str> {
    category_keywords(category)
        .iter()
        .copied()
        .filter(|kw| haystack.contains(kw))
        .collect()
}

/// Score `haystack` against every category's keyword list.
///
/// The highest hit count wins; ties go to the category declared first.
pub fn score_keywords(haystack: &str) -> KeywordScore {
    let haystack = haystack.to_lowercase();
    let mut best = KeywordScore::none();

    for category in DocumentCategory::CLASSIFIED {
        let hits = keyword_hits(category, &haystack);
        if hits.len() > best.hits.len() {
            best = KeywordScore {
                category,
                confidence: 0.0,
                hits,
            };
        }
    }

    if !best.hits.is_empty() {
        best.confidence = (best.hits.len() as f64 / KEYWORD_SATURATION_HITS as f64).min(1.0);
    }
    best
}
