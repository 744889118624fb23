//! TextNative extraction adapter - handles plain text files.

use async_trait::async_trait;

use vault_core::{ExtractionAdapter, ExtractionResult, ExtractionStrategy, Result};

/// Reads bytes as UTF-8, replacing invalid sequences.
pub struct TextNativeAdapter;

#[async_trait]
impl ExtractionAdapter for TextNativeAdapter {
    fn strategy(&self) -> ExtractionStrategy {
        ExtractionStrategy::TextNative
    }

    async fn extract(
        &self,
        data: &[u8],
        _filename: &str,
        _media_type: &str,
    ) -> Result<ExtractionResult> {
        let text = String::from_utf8_lossy(data).into_owned();
        let line_count = text.lines().count();

        Ok(ExtractionResult {
            metadata: serde_json::json!({
                "char_count": text.len(),
                "line_count": line_count,
            }),
            text,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "text_native"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_text_native_extraction() {
        let result = TextNativeAdapter
            .extract(b"Hello, world!\nLine two.", "test.txt", "text/plain")
            .await
            .unwrap();
        assert_eq!(result.text, "Hello, world!\nLine two.");
        assert_eq!(result.metadata["char_count"], 23);
        assert_eq!(result.metadata["line_count"], 2);
    }

    #[tokio::test]
    async fn test_text_native_invalid_utf8_is_lossy() {
        let result = TextNativeAdapter
            .extract(&[0x61, 0xFF, 0x62], "a.txt", "text/plain")
            .await
            .unwrap();
        assert_eq!(result.text, "a\u{FFFD}b");
    }
}
