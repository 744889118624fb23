//! PdfText extraction adapter - extracts text from PDFs using `pdftotext` (poppler-utils).

use std::io::Write;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::warn;

use vault_core::defaults::EXTRACTION_CMD_TIMEOUT_SECS;
use vault_core::{Error, ExtractionAdapter, ExtractionResult, ExtractionStrategy, Result};

/// Delegates to the local `pdftotext` binary. Each invocation is guarded by a
/// per-command timeout.
pub struct PdfTextAdapter;

/// Parse `pdfinfo` output into a JSON metadata object.
fn parse_pdfinfo(output: &str) -> JsonValue {
    let mut metadata = serde_json::Map::new();

    for line in output.lines() {
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim().to_lowercase().replace(' ', "_");
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            if key == "pages" {
                if let Ok(pages) = value.parse::<u64>() {
                    metadata.insert(key, JsonValue::Number(pages.into()));
                    continue;
                }
            }
            metadata.insert(key, JsonValue::String(value.to_string()));
        }
    }

    JsonValue::Object(metadata)
}

/// Run a command with a timeout, returning stdout as a string.
pub(crate) async fn run_cmd_with_timeout(cmd: &mut Command, timeout_secs: u64) -> Result<String> {
    let output = tokio::time::timeout(std::time::Duration::from_secs(timeout_secs), cmd.output())
        .await
        .map_err(|_| {
            Error::Extraction(format!(
                "External command timed out after {}s",
                timeout_secs
            ))
        })?
        .map_err(|e| Error::Extraction(format!("Failed to execute command: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Extraction(format!(
            "Command failed (exit {}): {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[async_trait]
impl ExtractionAdapter for PdfTextAdapter {
    fn strategy(&self) -> ExtractionStrategy {
        ExtractionStrategy::PdfText
    }

    async fn extract(
        &self,
        data: &[u8],
        filename: &str,
        _media_type: &str,
    ) -> Result<ExtractionResult> {
        if data.len() < 4 || &data[0..4] != b"%PDF" {
            return Err(Error::InvalidInput(format!(
                "File '{}' is not a valid PDF (missing %PDF header)",
                filename
            )));
        }

        // pdftotext reads from a path
        let mut tmpfile = NamedTempFile::new()
            .map_err(|e| Error::Extraction(format!("Failed to create temp file: {}", e)))?;
        tmpfile
            .write_all(data)
            .map_err(|e| Error::Extraction(format!("Failed to write temp file: {}", e)))?;
        let tmp_path = tmpfile.path().to_string_lossy().to_string();

        let mut metadata = match run_cmd_with_timeout(
            Command::new("pdfinfo").arg(&tmp_path),
            EXTRACTION_CMD_TIMEOUT_SECS,
        )
        .await
        {
            Ok(output) => parse_pdfinfo(&output),
            Err(e) => {
                warn!(filename, error = %e, "pdfinfo failed, continuing without metadata");
                serde_json::json!({})
            }
        };

        let text = run_cmd_with_timeout(
            Command::new("pdftotext").arg(&tmp_path).arg("-"),
            EXTRACTION_CMD_TIMEOUT_SECS,
        )
        .await?;

        if let Some(obj) = metadata.as_object_mut() {
            obj.insert("char_count".to_string(), text.len().into());
            obj.insert("line_count".to_string(), text.lines().count().into());
        }

        Ok(ExtractionResult { text, metadata })
    }

    async fn health_check(&self) -> Result<bool> {
        match Command::new("pdftotext").arg("-v").output().await {
            // pdftotext -v exits with 0 or 99 depending on the poppler version
            Ok(output) => Ok(output.status.success() || output.status.code() == Some(99)),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "pdf_text"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pdfinfo() {
        let output = "Title:          Statement\nPages:          3\nEncrypted:      no\nEmpty:\n";
        let meta = parse_pdfinfo(output);
        assert_eq!(meta["title"], "Statement");
        assert_eq!(meta["pages"], 3);
        assert_eq!(meta["encrypted"], "no");
        assert!(meta.get("empty").is_none());
    }

    #[tokio::test]
    async fn test_rejects_non_pdf_bytes() {
        let err = PdfTextAdapter
            .extract(b"hello", "fake.pdf", "application/pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_run_cmd_reports_missing_binary() {
        let err = run_cmd_with_timeout(&mut Command::new("definitely-not-a-real-binary-xyz"), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }
}
