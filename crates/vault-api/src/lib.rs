//! # vault-api
//!
//! HTTP surface for docvault. The router is built from an [`AppState`] so the
//! binary and the integration tests wire the same handlers against different
//! stores.

pub mod error;
pub mod extract;
pub mod handlers;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method, Request};
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use vault_guard::{LoginGuard, PolicyHandle, RateLimiter, ViolationRecorder};
use vault_jobs::{IntakePipeline, TextExtractor};
use vault_search::SearchEngine;

pub use error::ApiError;

/// Multipart framing overhead allowed on top of the policy's file size limit.
const BODY_LIMIT_SLACK_BYTES: usize = 1024 * 1024;

/// Shared services handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub intake: Arc<IntakePipeline>,
    pub search: Arc<SearchEngine>,
    pub extractor: Arc<TextExtractor>,
    pub limiter: Arc<RateLimiter>,
    pub login_guard: Arc<LoginGuard>,
    pub recorder: Arc<ViolationRecorder>,
    pub policy: Arc<PolicyHandle>,
    /// Bearer token for the admin and violation-feed routes. `None` disables them.
    pub admin_token: Option<String>,
}

#[derive(Clone, Copy)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Parse `ALLOWED_ORIGINS` (comma separated), falling back to localhost.
pub fn parse_allowed_origins(raw: Option<&str>) -> Vec<HeaderValue> {
    let origins: Vec<HeaderValue> = raw
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect();

    if origins.is_empty() {
        vec![HeaderValue::from_static("http://localhost:3000")]
    } else {
        origins
    }
}

/// Build the application router.
///
/// The request body limit is fixed from the policy in force when the router
/// is built. Later policy replacements still apply inside the validator.
pub fn build_router(state: AppState, allowed_origins: Vec<HeaderValue>) -> Router {
    let max_file = state.policy.snapshot().max_file_size_bytes;
    let body_limit = usize::try_from(max_file)
        .unwrap_or(usize::MAX)
        .saturating_add(BODY_LIMIT_SLACK_BYTES);

    Router::new()
        .route("/health", get(handlers::health))
        // Documents
        .route("/api/v1/documents", post(handlers::documents::upload_document))
        .route(
            "/api/v1/documents/:id",
            get(handlers::documents::get_document).delete(handlers::documents::delete_document),
        )
        .route(
            "/api/v1/documents/:id/content",
            get(handlers::documents::document_content),
        )
        .route("/api/v1/search", get(handlers::documents::search_documents))
        // Security
        .route(
            "/api/v1/auth/login-attempt",
            post(handlers::security::login_attempt),
        )
        .route("/api/v1/violations", get(handlers::security::list_violations))
        .route(
            "/api/v1/violations/metrics",
            get(handlers::security::violation_metrics),
        )
        .route(
            "/api/v1/admin/policy",
            put(handlers::security::replace_policy).get(handlers::security::get_policy),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed_origins))
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
                .allow_headers([
                    header::AUTHORIZATION,
                    header::CONTENT_TYPE,
                    header::ACCEPT,
                    header::HeaderName::from_static(extract::ACTOR_HEADER),
                ])
                .max_age(std::time::Duration::from_secs(3600)),
        )
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .with_state(state)
}
