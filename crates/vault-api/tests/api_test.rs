//! Router-level tests against in-memory stores.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use vault_api::{build_router, AppState};
use vault_core::{EventBus, SecurityPolicy};
use vault_db::{
    MemoryBlobStore, MemoryDocumentRepository, MemoryLoginAttemptStore, MemoryRateCounterStore,
    MemoryViolationRepository,
};
use vault_guard::{LoginGuard, PolicyHandle, RateLimiter, SecurityValidator, ViolationRecorder};
use vault_inference::{ClassificationEngine, ClassifierConfig, HeuristicFeatureScorer};
use vault_jobs::adapters::TextNativeAdapter;
use vault_jobs::{ExtractionRegistry, IntakeDeps, IntakePipeline, TextExtractor};
use vault_search::{SearchCache, SearchEngine};

const ADMIN_TOKEN: &str = "s3cret";
const BOUNDARY: &str = "vaultboundary";

fn app() -> Router {
    let events = EventBus::new(64);
    let policy = Arc::new(PolicyHandle::new(SecurityPolicy::default()));
    let logins = Arc::new(MemoryLoginAttemptStore::new());
    let recorder = Arc::new(ViolationRecorder::new(
        Arc::new(MemoryViolationRepository::new()),
        logins.clone(),
        events.clone(),
    ));
    let limiter = Arc::new(RateLimiter::new(
        policy.clone(),
        Arc::new(MemoryRateCounterStore::new()),
        recorder.clone(),
    ));
    let login_guard = Arc::new(LoginGuard::new(
        policy.clone(),
        logins,
        recorder.clone(),
        events.clone(),
    ));
    let validator = Arc::new(SecurityValidator::new(policy.clone(), recorder.clone()));

    let mut registry = ExtractionRegistry::new();
    registry.register(Arc::new(TextNativeAdapter));
    let extractor = Arc::new(TextExtractor::new(Arc::new(registry), Duration::from_secs(5)));

    let documents = Arc::new(MemoryDocumentRepository::new());
    let search = Arc::new(SearchEngine::new(
        documents.clone(),
        SearchCache::new(64, Duration::from_secs(60)),
    ));
    let classifier = Arc::new(ClassificationEngine::new(
        ClassifierConfig::default(),
        Arc::new(HeuristicFeatureScorer::seeded(7, 0.0)),
    ));

    let intake = Arc::new(IntakePipeline::new(IntakeDeps {
        limiter: limiter.clone(),
        validator,
        extractor: extractor.clone(),
        classifier,
        documents,
        blobs: Arc::new(MemoryBlobStore::new()),
        search: search.clone(),
        events,
    }));

    build_router(
        AppState {
            intake,
            search,
            extractor,
            limiter,
            login_guard,
            recorder,
            policy,
            admin_token: Some(ADMIN_TOKEN.to_string()),
        },
        vec![],
    )
}

fn multipart_upload(actor: &str, name: &str, media_type: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\nContent-Type: {media_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/v1/documents")
        .header("x-actor-id", actor)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str, actor: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-actor-id", actor)
        .body(Body::empty())
        .unwrap()
}

fn admin_get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"))
        .body(Body::empty())
        .unwrap()
}

fn login(identifier: &str, success: bool) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/auth/login-attempt")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "identifier": identifier, "success": success, "ip": "203.0.113.9" })
                .to_string(),
        ))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_extraction_adapters() {
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["extraction"]["TextNative"], true);
}

#[tokio::test]
async fn upload_then_search_and_download() {
    let app = app();
    let text = b"Invoice 2026-114. Payment due to the bank account in 30 days.";

    let response = app
        .clone()
        .oneshot(multipart_upload("alice", "march.txt", "text/plain", text))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let outcome = json_body(response).await;
    assert_eq!(outcome["accepted"], true);
    assert_eq!(outcome["classification"]["category"], "financial");
    let id = outcome["document_id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(get("/api/v1/search?q=invoice", "alice"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let results = json_body(response).await;
    assert_eq!(results["total_count"], 1);
    assert_eq!(results["documents"][0]["id"], id.as_str());

    // other owners see nothing
    let response = app
        .clone()
        .oneshot(get("/api/v1/search?q=invoice", "bob"))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["total_count"], 0);

    let response = app
        .clone()
        .oneshot(get(&format!("/api/v1/documents/{id}/content"), "alice"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"march.txt\""
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], text);
}

#[tokio::test]
async fn rejected_upload_returns_violations() {
    let response = app()
        .oneshot(multipart_upload(
            "mallory",
            "invoice.pdf.exe",
            "application/x-msdownload",
            &[0x4D, 0x5A, 0x90, 0x00],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let outcome = json_body(response).await;
    assert_eq!(outcome["accepted"], false);
    assert_eq!(outcome["violations"].as_array().unwrap().len(), 3);
    assert!(outcome.get("document_id").is_none());
}

#[tokio::test]
async fn missing_actor_header_is_unauthorized() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/v1/search")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_document_is_not_found() {
    let app = app();
    let uri = format!("/api/v1/documents/{}", uuid::Uuid::new_v4());
    let response = app.clone().oneshot(get(&uri, "alice")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(json_body(response).await["error"].is_string());

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(&uri)
                .header("x-actor-id", "alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_document() {
    let app = app();
    let response = app
        .clone()
        .oneshot(multipart_upload("alice", "lease.txt", "text/plain", b"tenant lease"))
        .await
        .unwrap();
    let id = json_body(response).await["document_id"]
        .as_str()
        .unwrap()
        .to_string();

    let uri = format!("/api/v1/documents/{id}");
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(&uri)
                .header("x-actor-id", "alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.oneshot(get(&uri, "alice")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn search_rate_limit_returns_429() {
    let app = app();
    for _ in 0..100 {
        let response = app.clone().oneshot(get("/api/v1/search", "alice")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    let response = app.oneshot(get("/api/v1/search", "alice")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
    let body = json_body(response).await;
    assert_eq!(body["error"], "rate limit exceeded");
    assert!(body["reset_at"].is_string());
}

#[tokio::test]
async fn fifth_login_failure_locks_identifier() {
    let app = app();
    for _ in 0..4 {
        let response = app.clone().oneshot(login("carol", false)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    let response = app.clone().oneshot(login("carol", false)).await.unwrap();
    assert_eq!(response.status(), StatusCode::LOCKED);
    let locked = json_body(response).await;
    assert_eq!(locked["allowed"], false);
    assert!(locked["lockout_until"].is_string());

    // the login rate limit (5 per window) trips before the guard is consulted
    let response = app.clone().oneshot(login("carol", true)).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let response = app
        .oneshot(admin_get("/api/v1/violations/metrics"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let metrics = json_body(response).await;
    assert_eq!(metrics["locked_out_count"], 1);
    assert_eq!(metrics["suspicious_ip_count"], 1);
}

#[tokio::test]
async fn violation_feed_requires_admin_token() {
    let app = app();
    let response = app
        .clone()
        .oneshot(get("/api/v1/violations", "mallory"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // the rejected attempt itself is on the feed
    let response = app
        .oneshot(admin_get("/api/v1/violations?type=unauthorized_access"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let feed = json_body(response).await;
    let feed = feed.as_array().unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0]["actor_id"], "mallory");
}

#[tokio::test]
async fn admin_token_prefix_is_rejected() {
    for token in ["s3cre", "s3cret0", "S3CRET"] {
        let request = Request::builder()
            .uri("/api/v1/violations/metrics")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "token {token}");
    }
}

#[tokio::test]
async fn violation_feed_rejects_unknown_type() {
    let response = app()
        .oneshot(admin_get("/api/v1/violations?type=gossip"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_policy_replacement_takes_effect() {
    let app = app();
    let mut policy = SecurityPolicy::default();
    policy.max_file_size_bytes = 8;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/v1/admin/policy")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&policy).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/v1/admin/policy")
                .header(header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&policy).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["max_file_size_bytes"], 8);

    let response = app
        .oneshot(multipart_upload("alice", "big.txt", "text/plain", b"more than eight bytes"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn invalid_policy_is_rejected() {
    let mut policy = SecurityPolicy::default();
    policy.max_login_attempts = 0;
    let response = app()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/v1/admin/policy")
                .header(header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&policy).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
