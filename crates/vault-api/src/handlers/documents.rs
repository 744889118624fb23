//! Upload, search and document lifecycle handlers.

use axum::body::Body;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use vault_core::{
    actions, defaults, sanitize_filename, Document, DocumentCategory, FileUpload, SearchFilters,
    SearchQuery, SearchResults, SortDirection, SortField,
};
use vault_jobs::UploadOutcome;

use crate::error::ApiError;
use crate::extract::ActorId;
use crate::AppState;

const DEFAULT_MEDIA_TYPE: &str = "application/octet-stream";

/// `POST /api/v1/documents`
///
/// Multipart form with a `file` part and an optional `size_bytes` field for
/// the client-declared size. Returns 201 when stored, 422 when screening
/// rejected the file and 429 when the upload rate limit tripped; the body
/// is the [`UploadOutcome`] in every case.
pub async fn upload_document(
    State(state): State<AppState>,
    ActorId(actor): ActorId,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadOutcome>), ApiError> {
    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut declared_size: Option<u64> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("file") => {
                let name = field.file_name().unwrap_or("upload").to_string();
                let media_type = field
                    .content_type()
                    .unwrap_or(DEFAULT_MEDIA_TYPE)
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;
                file = Some((name, media_type, bytes.to_vec()));
            }
            Some("size_bytes") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                let size = raw.trim().parse::<u64>().map_err(|_| {
                    ApiError::BadRequest("size_bytes must be a non-negative integer".into())
                })?;
                declared_size = Some(size);
            }
            _ => {}
        }
    }

    let (name, media_type, bytes) =
        file.ok_or_else(|| ApiError::BadRequest("Missing 'file' part".into()))?;
    let mut upload = FileUpload::new(name, media_type, bytes, actor.clone());
    if let Some(size) = declared_size {
        upload.size_bytes = size;
    }

    let outcome = state.intake.upload(upload, &actor).await?;
    let status = if outcome.accepted {
        StatusCode::CREATED
    } else if outcome.reset_at.is_some() {
        StatusCode::TOO_MANY_REQUESTS
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    Ok((status, Json(outcome)))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub category: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub media_type: Option<String>,
    pub min_size: Option<i64>,
    pub max_size: Option<i64>,
    pub language: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl SearchParams {
    fn into_query(self, owner_id: String) -> Result<SearchQuery, ApiError> {
        let category = self
            .category
            .as_deref()
            .map(str::parse::<DocumentCategory>)
            .transpose()
            .map_err(ApiError::BadRequest)?;
        let sort_field = self
            .sort
            .as_deref()
            .map(str::parse::<SortField>)
            .transpose()
            .map_err(ApiError::BadRequest)?
            .unwrap_or_default();
        let sort_direction = self
            .order
            .as_deref()
            .map(str::parse::<SortDirection>)
            .transpose()
            .map_err(ApiError::BadRequest)?
            .unwrap_or_default();

        Ok(SearchQuery::new(self.q, owner_id)
            .with_filters(SearchFilters {
                category,
                date_from: self.date_from,
                date_to: self.date_to,
                media_type: self.media_type,
                min_size: self.min_size,
                max_size: self.max_size,
                language: self.language,
            })
            .with_sort(sort_field, sort_direction)
            .with_page(
                self.limit.unwrap_or(defaults::PAGE_LIMIT_SEARCH),
                self.offset.unwrap_or(defaults::PAGE_OFFSET),
            ))
    }
}

/// `GET /api/v1/search`. Rate-limited under `search`.
pub async fn search_documents(
    State(state): State<AppState>,
    ActorId(actor): ActorId,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResults>, ApiError> {
    let decision = state.limiter.check(&actor, actions::SEARCH).await?;
    if !decision.allowed {
        return Err(ApiError::TooManyRequests {
            reset_at: decision.reset_at,
        });
    }

    let query = params.into_query(actor)?;
    let results = state.search.search(query).await?;
    debug!(
        subsystem = "api",
        op = "search",
        result_count = results.documents.len(),
        total_count = results.total_count,
        "Search served"
    );
    Ok(Json(results))
}

/// `GET /api/v1/documents/:id`
pub async fn get_document(
    State(state): State<AppState>,
    ActorId(actor): ActorId,
    Path(id): Path<Uuid>,
) -> Result<Json<Document>, ApiError> {
    Ok(Json(state.intake.get(&actor, id).await?))
}

/// `DELETE /api/v1/documents/:id`. Rate-limited under `delete`.
pub async fn delete_document(
    State(state): State<AppState>,
    ActorId(actor): ActorId,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let outcome = state.intake.delete(&actor, id, &actor).await?;
    match outcome.reset_at {
        Some(reset_at) if !outcome.deleted => Err(ApiError::TooManyRequests { reset_at }),
        _ => Ok(StatusCode::NO_CONTENT),
    }
}

/// `GET /api/v1/documents/:id/content`: the stored bytes as an attachment.
pub async fn document_content(
    State(state): State<AppState>,
    ActorId(actor): ActorId,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let (document, bytes) = state.intake.content(&actor, id).await?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        sanitize_filename(&document.name)
    );
    Ok((
        [
            (header::CONTENT_TYPE, document.media_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from(bytes),
    )
        .into_response())
}
