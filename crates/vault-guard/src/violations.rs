//! Violation recording, feed queries, metrics and retention sweep.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};
use uuid::Uuid;

use vault_core::{
    defaults, EventBus, LoginAttemptStore, Result, ServerEvent, Severity, Violation,
    ViolationMetrics, ViolationQuery, ViolationRepository, ViolationType,
};

/// Append-only violation log with aggregate views.
pub struct ViolationRecorder {
    repo: Arc<dyn ViolationRepository>,
    logins: Arc<dyn LoginAttemptStore>,
    events: EventBus,
    retention: Duration,
}

impl ViolationRecorder {
    pub fn new(
        repo: Arc<dyn ViolationRepository>,
        logins: Arc<dyn LoginAttemptStore>,
        events: EventBus,
    ) -> Self {
        Self {
            repo,
            logins,
            events,
            retention: Duration::days(defaults::VIOLATION_RETENTION_DAYS),
        }
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub async fn record(
        &self,
        violation_type: ViolationType,
        severity: Severity,
        actor_id: Option<&str>,
        details: JsonValue,
    ) -> Result<Violation> {
        self.record_at(violation_type, severity, actor_id, details, Utc::now())
            .await
    }

    /// Append a violation stamped at `now` and publish `violation.recorded`.
    pub async fn record_at(
        &self,
        violation_type: ViolationType,
        severity: Severity,
        actor_id: Option<&str>,
        details: JsonValue,
        now: DateTime<Utc>,
    ) -> Result<Violation> {
        let violation = Violation {
            id: Uuid::now_v7(),
            violation_type,
            severity,
            actor_id: actor_id.map(String::from),
            details,
            timestamp: now,
        };
        self.repo.append(&violation).await?;

        warn!(
            subsystem = "guard",
            component = "violations",
            violation_type = %violation_type,
            severity = %severity,
            actor_id = actor_id.unwrap_or("-"),
            "Violation recorded"
        );
        self.events.emit(ServerEvent::ViolationRecorded {
            violation_id: violation.id,
            violation_type,
            severity,
            actor_id: violation.actor_id.clone(),
        });
        Ok(violation)
    }

    /// Violations from the last `hours_back` hours, newest first.
    pub async fn query(
        &self,
        actor_id: Option<&str>,
        violation_type: Option<ViolationType>,
        hours_back: i64,
    ) -> Result<Vec<Violation>> {
        self.query_at(actor_id, violation_type, hours_back, Utc::now())
            .await
    }

    pub async fn query_at(
        &self,
        actor_id: Option<&str>,
        violation_type: Option<ViolationType>,
        hours_back: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Violation>> {
        let query = ViolationQuery {
            actor_id: actor_id.map(String::from),
            violation_type,
            since: now - Duration::hours(hours_back.max(0)),
        };
        let hits = self.repo.query(&query).await?;
        debug!(
            subsystem = "guard",
            component = "violations",
            op = "query",
            hours_back,
            result_count = hits.len(),
            "Violation feed query"
        );
        Ok(hits)
    }

    pub async fn metrics(&self) -> Result<ViolationMetrics> {
        self.metrics_at(Utc::now()).await
    }

    /// Counts by type and severity plus login-guard state at `now`.
    pub async fn metrics_at(&self, now: DateTime<Utc>) -> Result<ViolationMetrics> {
        let mut metrics = ViolationMetrics::default();
        for tally in self.repo.tally().await? {
            metrics.total += tally.count;
            *metrics
                .by_type
                .entry(tally.violation_type.as_str().to_string())
                .or_insert(0) += tally.count;
            *metrics
                .by_severity
                .entry(tally.severity.as_str().to_string())
                .or_insert(0) += tally.count;
        }
        metrics.suspicious_ip_count = self.logins.suspicious_ip_count().await?;
        metrics.locked_out_count = self.logins.locked_count(now).await?;
        Ok(metrics)
    }

    pub async fn sweep(&self) -> Result<u64> {
        self.sweep_at(Utc::now()).await
    }

    /// Purge violations older than the retention window.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Result<u64> {
        let purged = self.repo.purge_before(now - self.retention).await?;
        if purged > 0 {
            info!(
                subsystem = "guard",
                component = "violations",
                op = "sweep",
                purged,
                "Expired violations purged"
            );
        }
        Ok(purged)
    }
}
