//! OCR extraction adapter - posts image bytes to an external OCR service.
//!
//! The service contract is `POST {base}/v1/ocr` with a multipart `file` part,
//! answering `{"text": "...", "confidence": 0.93}`. `GET {base}/health`
//! reports liveness.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use vault_core::defaults::{ENV_OCR_SERVICE_URL, EXTRACTION_TIMEOUT_SECS};
use vault_core::{Error, ExtractionAdapter, ExtractionResult, ExtractionStrategy, Result};

pub struct OcrServiceAdapter {
    base_url: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

#[derive(Deserialize)]
struct OcrResponse {
    text: String,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    language: Option<String>,
}

impl OcrServiceAdapter {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            timeout_secs: EXTRACTION_TIMEOUT_SECS,
        }
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Returns `None` if `OCR_SERVICE_URL` is unset or empty.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var(ENV_OCR_SERVICE_URL).ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        Some(Self::new(base_url))
    }
}

#[async_trait]
impl ExtractionAdapter for OcrServiceAdapter {
    fn strategy(&self) -> ExtractionStrategy {
        ExtractionStrategy::Ocr
    }

    async fn extract(
        &self,
        data: &[u8],
        filename: &str,
        media_type: &str,
    ) -> Result<ExtractionResult> {
        if data.is_empty() {
            return Err(Error::InvalidInput(
                "Cannot OCR empty image data".to_string(),
            ));
        }

        let url = format!("{}/v1/ocr", self.base_url);
        let part = reqwest::multipart::Part::bytes(data.to_vec())
            .file_name(filename.to_string())
            .mime_str(media_type)
            .map_err(|e| Error::Extraction(format!("Failed to create multipart: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .timeout(Duration::from_secs(self.timeout_secs))
            .send()
            .await
            .map_err(|e| Error::Request(format!("OCR request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Extraction(format!(
                "OCR service returned {}: {}",
                status, body
            )));
        }

        let result: OcrResponse = response
            .json()
            .await
            .map_err(|e| Error::Extraction(format!("Failed to parse OCR response: {}", e)))?;

        debug!(
            subsystem = "jobs",
            component = "ocr",
            filename,
            chars = result.text.len(),
            "OCR complete"
        );

        Ok(ExtractionResult {
            metadata: serde_json::json!({
                "ocr_confidence": result.confidence,
                "ocr_language": result.language,
                "char_count": result.text.len(),
            }),
            text: result.text,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/health", self.base_url);
        match self
            .client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "ocr_service"
    }
}
