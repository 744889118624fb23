//! Background sweeper lifecycle.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use vault_core::{EventBus, Severity, ViolationType};
use vault_db::{MemoryLoginAttemptStore, MemoryRateCounterStore, MemoryViolationRepository};
use vault_guard::{LoginGuard, PolicyHandle, RateLimiter, Sweeper, ViolationRecorder};

fn services() -> (Arc<ViolationRecorder>, Arc<RateLimiter>, Arc<LoginGuard>) {
    let events = EventBus::new(8);
    let policy = Arc::new(PolicyHandle::default());
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
    let guard = Arc::new(LoginGuard::new(policy, logins, recorder.clone(), events));
    (recorder, limiter, guard)
}

#[tokio::test]
async fn run_once_purges_old_violations() {
    let (recorder, limiter, guard) = services();
    recorder
        .record_at(
            ViolationType::RateLimit,
            Severity::Medium,
            Some("alice"),
            serde_json::json!({}),
            Utc::now() - chrono::Duration::days(10),
        )
        .await
        .unwrap();

    let sweeper = Sweeper::new(recorder.clone(), limiter, guard, Duration::from_secs(300));
    let report = sweeper.run_once().await;
    assert_eq!(report.violations, 1);
    assert_eq!(recorder.metrics().await.unwrap().total, 0);
}

#[tokio::test(start_paused = true)]
async fn periodic_task_runs_and_shuts_down() {
    let (recorder, limiter, guard) = services();
    recorder
        .record_at(
            ViolationType::FileSize,
            Severity::Medium,
            None,
            serde_json::json!({}),
            Utc::now() - chrono::Duration::days(8),
        )
        .await
        .unwrap();

    let handle = Sweeper::new(recorder.clone(), limiter, guard, Duration::from_secs(300)).start();
    tokio::time::sleep(Duration::from_secs(301)).await;
    assert_eq!(recorder.metrics().await.unwrap().total, 0);

    handle.shutdown().await.unwrap();
}
