// =============================================================================
// ERROR HANDLING
// =============================================================================

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use tracing::error;

#[derive(Debug)]
pub enum ApiError {
    Internal(vault_core::Error),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    TooManyRequests { reset_at: DateTime<Utc> },
}

impl From<vault_core::Error> for ApiError {
    fn from(err: vault_core::Error) -> Self {
        use vault_core::Error;
        match &err {
            Error::NotFound(msg) => ApiError::NotFound(msg.clone()),
            Error::DocumentNotFound(id) => ApiError::NotFound(format!("Document {} not found", id)),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg.clone()),
            Error::Database(sqlx_err) => {
                let msg = sqlx_err.to_string();
                if msg.contains("duplicate key") || msg.contains("unique constraint") {
                    return ApiError::Conflict(msg);
                }
                ApiError::Internal(err)
            }
            _ => ApiError::Internal(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, reset_at) = match self {
            ApiError::Internal(err) => {
                error!(subsystem = "api", error = %err, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string(), None)
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg, None),
            ApiError::TooManyRequests { reset_at } => (
                StatusCode::TOO_MANY_REQUESTS,
                vault_jobs::RATE_LIMIT_EXCEEDED.to_string(),
                Some(reset_at),
            ),
        };

        let body = match reset_at {
            Some(reset_at) => Json(serde_json::json!({
                "error": message,
                "reset_at": reset_at,
            })),
            None => Json(serde_json::json!({
                "error": message,
            })),
        };

        let mut response = (status, body).into_response();
        if let Some(reset_at) = reset_at {
            let secs = (reset_at - Utc::now()).num_seconds().max(1);
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}
