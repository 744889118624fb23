//! Upload intake: rate limit -> validate -> extract -> classify -> persist.
//!
//! Policy rejections come back as [`UploadOutcome`] / [`DeleteOutcome`]
//! values. Only store failures surface as errors.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use vault_core::{
    actions, BlobStore, ClassificationResult, Document, DocumentRepository, Error, EventBus,
    FileUpload, Result, ServerEvent,
};
use vault_db::{compute_content_hash, generate_storage_path};
use vault_guard::{RateLimiter, SecurityValidator};
use vault_inference::ClassificationEngine;
use vault_search::SearchEngine;

use crate::extractor::TextExtractor;

/// Violation message returned when the upload or delete rate limit trips.
pub const RATE_LIMIT_EXCEEDED: &str = "rate limit exceeded";

/// Result of one upload attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadOutcome {
    pub accepted: bool,
    pub violations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<ClassificationResult>,
}

impl UploadOutcome {
    fn rejected(violations: Vec<String>, reset_at: Option<DateTime<Utc>>) -> Self {
        Self {
            accepted: false,
            violations,
            reset_at,
            document_id: None,
            classification: None,
        }
    }
}

/// Result of one delete attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_at: Option<DateTime<Utc>>,
}

/// Services the pipeline drives.
pub struct IntakeDeps {
    pub limiter: Arc<RateLimiter>,
    pub validator: Arc<SecurityValidator>,
    pub extractor: Arc<TextExtractor>,
    pub classifier: Arc<ClassificationEngine>,
    pub documents: Arc<dyn DocumentRepository>,
    pub blobs: Arc<dyn BlobStore>,
    pub search: Arc<SearchEngine>,
    pub events: EventBus,
}

pub struct IntakePipeline {
    deps: IntakeDeps,
}

impl IntakePipeline {
    pub fn new(deps: IntakeDeps) -> Self {
        Self { deps }
    }

    #[instrument(
        skip(self, upload),
        fields(subsystem = "jobs", component = "intake", op = "upload", media_type = %upload.media_type)
    )]
    pub async fn upload(&self, upload: FileUpload, actor_id: &str) -> Result<UploadOutcome> {
        let d = &self.deps;

        let decision = d.limiter.check(actor_id, actions::UPLOAD).await?;
        if !decision.allowed {
            return Ok(UploadOutcome::rejected(
                vec![RATE_LIMIT_EXCEEDED.to_string()],
                Some(decision.reset_at),
            ));
        }

        let screening = d.validator.validate(&upload, actor_id).await;
        if !screening.accepted {
            return Ok(UploadOutcome::rejected(screening.violations, None));
        }

        let text = d.extractor.extract(&upload).await;
        let classification = d
            .classifier
            .classify(&upload.name, &upload.media_type, &text)
            .await;

        let id = Uuid::now_v7();
        let storage_path = generate_storage_path(&id);
        let content_hash = compute_content_hash(&upload.bytes);
        d.blobs.write(&storage_path, &upload.bytes).await?;

        let document = Document::from_upload(
            id,
            &upload,
            classification.clone(),
            text,
            content_hash,
            storage_path.clone(),
            Utc::now(),
        );
        if let Err(e) = d.documents.insert(&document).await {
            if let Err(cleanup) = d.blobs.delete(&storage_path).await {
                warn!(
                    document_id = %id,
                    error = %cleanup,
                    "Failed to remove orphaned blob after insert failure"
                );
            }
            return Err(e);
        }

        d.search.invalidate_owner(&document.owner_id).await;
        d.events.emit(ServerEvent::DocumentIngested {
            document_id: id,
            owner_id: document.owner_id.clone(),
            category: document.category,
            confidence: document.confidence,
        });
        info!(
            document_id = %id,
            actor_id,
            category = %document.category,
            confidence = document.confidence,
            size_bytes = document.size_bytes,
            "Document ingested"
        );

        Ok(UploadOutcome {
            accepted: true,
            violations: Vec::new(),
            reset_at: None,
            document_id: Some(id),
            classification: Some(classification),
        })
    }

    /// Remove a document and its blob. Rate-limited under `delete`.
    #[instrument(skip(self), fields(subsystem = "jobs", component = "intake", op = "delete"))]
    pub async fn delete(&self, owner_id: &str, id: Uuid, actor_id: &str) -> Result<DeleteOutcome> {
        let d = &self.deps;

        let decision = d.limiter.check(actor_id, actions::DELETE).await?;
        if !decision.allowed {
            return Ok(DeleteOutcome {
                deleted: false,
                reset_at: Some(decision.reset_at),
            });
        }

        let document = d
            .documents
            .delete(owner_id, id)
            .await?
            .ok_or(Error::DocumentNotFound(id))?;

        // The row is gone; a leftover blob is unreachable but harmless.
        if let Err(e) = d.blobs.delete(&document.storage_path).await {
            warn!(document_id = %id, error = %e, "Failed to delete blob");
        }

        d.search.invalidate_owner(owner_id).await;
        d.events.emit(ServerEvent::DocumentDeleted {
            document_id: id,
            owner_id: owner_id.to_string(),
        });
        info!(document_id = %id, actor_id, "Document deleted");

        Ok(DeleteOutcome {
            deleted: true,
            reset_at: None,
        })
    }

    /// Owner-scoped fetch.
    pub async fn get(&self, owner_id: &str, id: Uuid) -> Result<Document> {
        self.deps
            .documents
            .fetch(owner_id, id)
            .await?
            .ok_or(Error::DocumentNotFound(id))
    }

    /// Owner-scoped fetch of the document together with its stored bytes.
    pub async fn content(&self, owner_id: &str, id: Uuid) -> Result<(Document, Vec<u8>)> {
        let document = self.get(owner_id, id).await?;
        let bytes = self.deps.blobs.read(&document.storage_path).await?;
        Ok((document, bytes))
    }
}
