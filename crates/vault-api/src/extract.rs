//! Request extractors for caller identity.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::warn;

use vault_core::{Severity, ViolationType};

use crate::error::ApiError;
use crate::AppState;

/// Header carrying the authenticated caller. Set by the fronting gateway.
pub const ACTOR_HEADER: &str = "x-actor-id";

/// The caller every document operation is attributed to and scoped by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorId(pub String);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ActorId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| ActorId(v.to_string()))
            .ok_or_else(|| ApiError::Unauthorized(format!("Missing {} header", ACTOR_HEADER)))
    }
}

/// Compare bearer tokens without an early exit on the first differing byte.
/// Both sides are hashed first, so the comparison also runs over equal lengths.
fn token_matches(presented: &str, expected: &str) -> bool {
    let presented = Sha256::digest(presented.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    presented
        .iter()
        .zip(expected.iter())
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

/// Proof that the request carried the admin bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AdminAuth;

#[async_trait]
impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.admin_token.as_deref() else {
            return Err(ApiError::Forbidden("Admin API is disabled".into()));
        };

        let presented = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim);

        if presented.is_some_and(|token| token_matches(token, expected)) {
            return Ok(AdminAuth);
        }

        let actor = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        warn!(
            subsystem = "api",
            component = "admin_auth",
            path = %parts.uri.path(),
            actor_id = actor.as_deref().unwrap_or("-"),
            "Rejected admin request"
        );
        // The audit record is best effort; the rejection stands either way.
        if let Err(e) = state
            .recorder
            .record(
                ViolationType::UnauthorizedAccess,
                Severity::Medium,
                actor.as_deref(),
                json!({ "path": parts.uri.path(), "token_present": presented.is_some() }),
            )
            .await
        {
            warn!(subsystem = "api", component = "admin_auth", error = %e, "Failed to record violation");
        }

        Err(ApiError::Unauthorized("Invalid admin token".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_matches_exact_token_only() {
        assert!(token_matches("s3cret-admin", "s3cret-admin"));
        assert!(!token_matches("s3cret-admin", "s3cret-admiN"));
        assert!(!token_matches("s3cret", "s3cret-admin"));
        assert!(!token_matches("", "s3cret-admin"));
    }
}
