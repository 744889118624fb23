//! Marker-word language detection.

use vault_core::defaults::DEFAULT_LANGUAGE;

use crate::vocabulary::LANGUAGE_MARKERS;

/// Detect the language of `text` by counting whole-word marker hits.
///
/// Returns the language with strictly the most hits; a tie for first place or
/// no hits at all yields `"en"`.
pub fn detect_language(text: &str) -> &'static str {
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = lowered.split_whitespace().collect();
    if tokens.is_empty() {
        return DEFAULT_LANGUAGE;
    }

    let mut best: Option<(&'static str, usize)> = None;
    let mut tied = false;
    for &(lang, markers) in LANGUAGE_MARKERS {
        let count = tokens.iter().filter(|t| markers.contains(*t)).count();
        match best {
            Some((_, top)) if count == top => tied = true,
            Some((_, top)) if count < top => {}
            _ => {
                best = Some((lang, count));
                tied = false;
            }
        }
    }

    match best {
        Some((lang, count)) if count > 0 && !tied => lang,
        _ => DEFAULT_LANGUAGE,
    }
}
