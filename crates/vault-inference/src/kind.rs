//! Document kind detection and keyword extraction.

use std::collections::HashMap;

use vault_core::defaults::MAX_DOCUMENT_KEYWORDS;
use vault_core::{DocumentKind, MediaFamily};

use crate::vocabulary::{KIND_TERMS, STOP_WORDS};

/// First kind in the term table whose terms occur in `haystack` (lowercased),
/// otherwise the fallback kind for the media family.
pub fn detect_kind(haystack: &str, media_type: &str) -> DocumentKind {
    KIND_TERMS
        .iter()
        .find(|(_, terms)| terms.iter().any(|t| haystack.contains(t)))
        .map(|(kind, _)| *kind)
        .unwrap_or_else(|| DocumentKind::for_family(MediaFamily::of(media_type)))
}

/// Most frequent content terms in `text`: alphabetic, at least four
/// characters, not a stop word. Ordered by frequency, then first appearance.
pub fn frequent_terms(text: &str, limit: usize) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();

    for (position, token) in lowered
        .split(|c: char| !c.is_alphabetic())
        .filter(|t| t.chars().count() >= 4 && !STOP_WORDS.contains(t))
        .enumerate()
    {
        counts.entry(token).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(&str, usize, usize)> = counts
        .into_iter()
        .map(|(term, (count, first))| (term, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked
        .into_iter()
        .take(limit)
        .map(|(term, _, _)| term.to_string())
        .collect()
}

/// Category hits first, then frequent terms, deduplicated and capped.
pub fn merge_keywords(hits: &[&str], text: &str) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::with_capacity(MAX_DOCUMENT_KEYWORDS);
    let candidates = hits
        .iter()
        .map(|h| h.to_string())
        .chain(frequent_terms(text, MAX_DOCUMENT_KEYWORDS));
    for candidate in candidates {
        if keywords.len() == MAX_DOCUMENT_KEYWORDS {
            break;
        }
        if !keywords.contains(&candidate) {
            keywords.push(candidate);
        }
    }
    keywords
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_matching_kind_wins() {
        assert_eq!(
            detect_kind("invoice and receipt", "application/pdf"),
            DocumentKind::Invoice
        );
        assert_eq!(
            detect_kind("monthly statement", "application/pdf"),
            DocumentKind::Statement
        );
    }

    #[test]
    fn falls_back_to_media_family() {
        assert_eq!(detect_kind("zzz", "application/pdf"), DocumentKind::Pdf);
        assert_eq!(detect_kind("zzz", "image/png"), DocumentKind::Image);
        assert_eq!(detect_kind("zzz", "text/plain"), DocumentKind::Text);
        assert_eq!(detect_kind("zzz", "application/zip"), DocumentKind::Other);
    }

    #[test]
    fn frequent_terms_rank_by_count_then_position() {
        let terms = frequent_terms("Alpha beta gamma delta gamma, DELTA delta; with this", 3);
        assert_eq!(terms, vec!["delta", "gamma", "alpha"]);
    }

    #[test]
    fn merged_keywords_are_unique_and_capped() {
        let text = "bank bank ledger ledger ledger one two three four five six seven eight nine \
                    tenth eleventh twelfth";
        let merged = merge_keywords(&["bank", "account"], text);
        assert_eq!(merged[0], "bank");
        assert_eq!(merged[1], "account");
        assert_eq!(merged[2], "ledger");
        assert_eq!(merged.len(), MAX_DOCUMENT_KEYWORDS);
        let mut unique = merged.clone();
        unique.dedup();
        assert_eq!(unique.len(), merged.len());
    }
}
