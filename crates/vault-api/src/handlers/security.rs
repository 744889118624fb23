//! Login attempts, the violation feed and policy administration.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use vault_core::{
    actions, defaults, SecurityPolicy, Violation, ViolationMetrics, ViolationType,
};
use vault_guard::LoginDecision;

use crate::error::ApiError;
use crate::extract::AdminAuth;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginAttemptRequest {
    pub identifier: String,
    pub success: bool,
    #[serde(default)]
    pub ip: Option<String>,
}

/// `POST /api/v1/auth/login-attempt`
///
/// Reported by the authenticator after each credential check. Rate-limited
/// per identifier under `login`; answers 423 while the identifier is locked.
pub async fn login_attempt(
    State(state): State<AppState>,
    Json(req): Json<LoginAttemptRequest>,
) -> Result<(StatusCode, Json<LoginDecision>), ApiError> {
    let identifier = req.identifier.trim();
    if identifier.is_empty() {
        return Err(ApiError::BadRequest("identifier must not be empty".into()));
    }

    let rate = state.limiter.check(identifier, actions::LOGIN).await?;
    if !rate.allowed {
        return Err(ApiError::TooManyRequests {
            reset_at: rate.reset_at,
        });
    }

    let decision = state
        .login_guard
        .record_attempt(identifier, req.success, req.ip.as_deref())
        .await?;
    let status = if decision.allowed {
        StatusCode::OK
    } else {
        StatusCode::LOCKED
    };
    Ok((status, Json(decision)))
}

#[derive(Debug, Default, Deserialize)]
pub struct ViolationFeedParams {
    pub actor_id: Option<String>,
    #[serde(rename = "type")]
    pub violation_type: Option<String>,
    pub hours_back: Option<i64>,
}

/// `GET /api/v1/violations?actor_id&type&hours_back`, newest first.
pub async fn list_violations(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Query(params): Query<ViolationFeedParams>,
) -> Result<Json<Vec<Violation>>, ApiError> {
    let violation_type = params
        .violation_type
        .as_deref()
        .map(str::parse::<ViolationType>)
        .transpose()
        .map_err(ApiError::BadRequest)?;
    let hours_back = params.hours_back.unwrap_or(defaults::VIOLATION_FEED_HOURS);
    if hours_back < 0 {
        return Err(ApiError::BadRequest("hours_back must not be negative".into()));
    }

    let violations = state
        .recorder
        .query(params.actor_id.as_deref(), violation_type, hours_back)
        .await?;
    Ok(Json(violations))
}

/// `GET /api/v1/violations/metrics`
pub async fn violation_metrics(
    State(state): State<AppState>,
    _admin: AdminAuth,
) -> Result<Json<ViolationMetrics>, ApiError> {
    Ok(Json(state.recorder.metrics().await?))
}

/// `GET /api/v1/admin/policy`
pub async fn get_policy(State(state): State<AppState>, _admin: AdminAuth) -> Json<SecurityPolicy> {
    Json(state.policy.snapshot().as_ref().clone())
}

/// `PUT /api/v1/admin/policy`: validate and swap the policy atomically.
pub async fn replace_policy(
    State(state): State<AppState>,
    _admin: AdminAuth,
    Json(policy): Json<SecurityPolicy>,
) -> Result<Json<SecurityPolicy>, ApiError> {
    state.policy.replace(policy)?;
    let current = state.policy.snapshot();
    info!(
        subsystem = "api",
        op = "replace_policy",
        max_file_size_bytes = current.max_file_size_bytes,
        max_login_attempts = current.max_login_attempts,
        "Security policy replaced"
    );
    Ok(Json(current.as_ref().clone()))
}
