use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use vault_api::{build_router, parse_allowed_origins, AppState};
use vault_core::{
    defaults, env_parse, BlobStore, DocumentRepository, EventBus, LoginAttemptStore,
    RateCounterStore, SecurityPolicy, ViolationRepository,
};
use vault_db::{
    redis_store, Database, FilesystemBackend, MemoryDocumentRepository, MemoryLoginAttemptStore,
    MemoryRateCounterStore, MemoryViolationRepository, RedisLoginAttemptStore,
    RedisRateCounterStore,
};
use vault_guard::{LoginGuard, PolicyHandle, RateLimiter, SecurityValidator, Sweeper, ViolationRecorder};
use vault_inference::{ClassificationEngine, ClassifierConfig};
use vault_jobs::{IntakeDeps, IntakePipeline, TextExtractor};
use vault_search::{SearchCache, SearchEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: "vault_api=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "vault_api=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("vault-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    // Configuration
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env_parse("PORT").unwrap_or(defaults::SERVER_PORT);
    let admin_token = std::env::var("ADMIN_TOKEN")
        .ok()
        .filter(|t| !t.trim().is_empty());
    if admin_token.is_none() {
        warn!("ADMIN_TOKEN not set, admin and violation feed routes are disabled");
    }

    let policy = SecurityPolicy::from_env();
    let policy = Arc::new(PolicyHandle::new(policy));
    let classifier_config = ClassifierConfig::from_env()?;
    let events = EventBus::new(defaults::EVENT_BUS_CAPACITY);

    // Relational store
    let (documents, violations): (Arc<dyn DocumentRepository>, Arc<dyn ViolationRepository>) =
        match std::env::var("DATABASE_URL") {
            Ok(url) => {
                let db = Database::connect(&url).await?;
                db.migrate().await?;
                db.health_check().await?;
                info!("Database connected and migrations applied");
                (Arc::new(db.documents()), Arc::new(db.violations()))
            }
            Err(_) => {
                warn!("DATABASE_URL not set, using in-memory document and violation stores");
                (
                    Arc::new(MemoryDocumentRepository::new()),
                    Arc::new(MemoryViolationRepository::new()),
                )
            }
        };

    // Counter stores
    let (counters, logins): (Arc<dyn RateCounterStore>, Arc<dyn LoginAttemptStore>) =
        match std::env::var("REDIS_URL") {
            Ok(url) => {
                let conn = redis_store::connect(&url).await?;
                info!("Redis connected for rate and login counters");
                (
                    Arc::new(RedisRateCounterStore::new(conn.clone())),
                    Arc::new(RedisLoginAttemptStore::new(conn)),
                )
            }
            Err(_) => {
                info!("REDIS_URL not set, using process-local rate and login counters");
                (
                    Arc::new(MemoryRateCounterStore::new()),
                    Arc::new(MemoryLoginAttemptStore::new()),
                )
            }
        };

    // Blob store
    let blob_path = std::env::var("BLOB_STORAGE_PATH")
        .unwrap_or_else(|_| defaults::BLOB_STORAGE_PATH.to_string());
    let backend = FilesystemBackend::new(&blob_path);
    backend
        .validate()
        .await
        .map_err(|e| anyhow::anyhow!("Blob storage unusable at {}: {}", blob_path, e))?;
    let blobs: Arc<dyn BlobStore> = Arc::new(backend);
    info!(path = %blob_path, "Blob storage ready");

    // Guard services
    let recorder = Arc::new(ViolationRecorder::new(violations, logins.clone(), events.clone()));
    let limiter = Arc::new(RateLimiter::new(policy.clone(), counters, recorder.clone()));
    let login_guard = Arc::new(LoginGuard::new(
        policy.clone(),
        logins,
        recorder.clone(),
        events.clone(),
    ));
    let validator = Arc::new(SecurityValidator::new(policy.clone(), recorder.clone()));

    // Pipeline
    let extractor = Arc::new(TextExtractor::from_env());
    let classifier = Arc::new(ClassificationEngine::heuristic(classifier_config));
    let search = Arc::new(SearchEngine::new(documents.clone(), SearchCache::from_env()));
    let intake = Arc::new(IntakePipeline::new(IntakeDeps {
        limiter: limiter.clone(),
        validator,
        extractor: extractor.clone(),
        classifier,
        documents,
        blobs,
        search: search.clone(),
        events,
    }));

    // Background retention sweep
    let sweep_secs = env_parse("SWEEP_INTERVAL_SECS").unwrap_or(defaults::SWEEP_INTERVAL_SECS);
    let sweeper = Sweeper::new(
        recorder.clone(),
        limiter.clone(),
        login_guard.clone(),
        Duration::from_secs(sweep_secs.max(1)),
    )
    .start();

    let state = AppState {
        intake,
        search,
        extractor,
        limiter,
        login_guard,
        recorder,
        policy,
        admin_token,
    };
    let origins = std::env::var("ALLOWED_ORIGINS").ok();
    let app = build_router(state, parse_allowed_origins(origins.as_deref()));

    // Start server
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped, shutting down sweeper");
    sweeper.shutdown().await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
