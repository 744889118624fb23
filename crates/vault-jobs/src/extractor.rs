//! TextExtractor: media-type dispatch with a bounded wait.
//!
//! Extraction failure is never fatal. A missing adapter, a collaborator
//! error or a timeout all produce an empty string, logged once at WARN, so
//! classification still runs at reduced confidence.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use vault_core::defaults::EXTRACTION_TIMEOUT_SECS;
use vault_core::{env_parse, ExtractionStrategy, FileUpload};

use crate::adapters::{OcrServiceAdapter, PdfTextAdapter, TextNativeAdapter};
use crate::extraction::ExtractionRegistry;

pub struct TextExtractor {
    registry: Arc<ExtractionRegistry>,
    timeout: Duration,
}

impl TextExtractor {
    pub fn new(registry: Arc<ExtractionRegistry>, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    /// Registry with the text and PDF adapters, plus OCR when
    /// `OCR_SERVICE_URL` is set. Timeout from `EXTRACTION_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let mut registry = ExtractionRegistry::new();
        registry.register(Arc::new(TextNativeAdapter));
        registry.register(Arc::new(PdfTextAdapter));
        match OcrServiceAdapter::from_env() {
            Some(ocr) => registry.register(Arc::new(ocr)),
            None => debug!(
                subsystem = "jobs",
                component = "extractor",
                "OCR_SERVICE_URL not set, images will not be extracted"
            ),
        }
        let timeout_secs = env_parse("EXTRACTION_TIMEOUT_SECS").unwrap_or(EXTRACTION_TIMEOUT_SECS);
        Self::new(Arc::new(registry), Duration::from_secs(timeout_secs))
    }

    pub fn registry(&self) -> &ExtractionRegistry {
        &self.registry
    }

    /// Extract text from an upload. Always returns a string.
    pub async fn extract(&self, upload: &FileUpload) -> String {
        let Some(strategy) = ExtractionStrategy::for_media_type(&upload.media_type) else {
            debug!(
                subsystem = "jobs",
                component = "extractor",
                media_type = %upload.media_type,
                "No extraction strategy for media type"
            );
            return String::new();
        };

        let start = Instant::now();
        let attempt = tokio::time::timeout(
            self.timeout,
            self.registry
                .extract(strategy, &upload.bytes, &upload.name, &upload.media_type),
        )
        .await;

        match attempt {
            Ok(Ok(result)) => {
                debug!(
                    subsystem = "jobs",
                    component = "extractor",
                    strategy = ?strategy,
                    chars = result.text.len(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Text extracted"
                );
                result.text
            }
            Ok(Err(e)) => {
                warn!(
                    subsystem = "jobs",
                    component = "extractor",
                    strategy = ?strategy,
                    file_name = %upload.name,
                    error = %e,
                    "Extraction failed, continuing with empty text"
                );
                String::new()
            }
            Err(_) => {
                warn!(
                    subsystem = "jobs",
                    component = "extractor",
                    strategy = ?strategy,
                    file_name = %upload.name,
                    timeout_secs = self.timeout.as_secs(),
                    "Extraction timed out, continuing with empty text"
                );
                String::new()
            }
        }
    }
}
