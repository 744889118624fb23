pub mod documents;
pub mod security;

use std::collections::BTreeMap;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Reachability of each registered extraction adapter.
    pub extraction: BTreeMap<String, bool>,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let extraction = state
        .extractor
        .registry()
        .health_check_all()
        .await
        .into_iter()
        .map(|(strategy, healthy)| (format!("{:?}", strategy), healthy))
        .collect::<BTreeMap<_, _>>();

    // Extraction collaborators degrade gracefully, so they never fail the health check.
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        extraction,
    })
}
