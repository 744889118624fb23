//! Consecutive login failure tracking and temporary lockout.
//!
//! Per identifier: Clear -> Accumulating -> Locked -> (expiry) Clear. A
//! success clears the record from any state except Locked. Attempts during a
//! lockout are rejected with the original `lockout_until`; the lockout is
//! never extended. A failure count left idle for longer than the policy's
//! failure memory starts over and is eventually swept.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error, info, warn};

use vault_core::{EventBus, LoginAttemptStore, Result, ServerEvent, Severity, ViolationType};

use crate::policy::PolicyHandle;
use crate::violations::ViolationRecorder;

/// Outcome of one login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoginDecision {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lockout_until: Option<DateTime<Utc>>,
}

impl LoginDecision {
    fn allowed() -> Self {
        Self {
            allowed: true,
            lockout_until: None,
        }
    }

    fn locked(until: DateTime<Utc>) -> Self {
        Self {
            allowed: false,
            lockout_until: Some(until),
        }
    }
}

pub struct LoginGuard {
    policy: Arc<PolicyHandle>,
    store: Arc<dyn LoginAttemptStore>,
    recorder: Arc<ViolationRecorder>,
    events: EventBus,
}

impl LoginGuard {
    pub fn new(
        policy: Arc<PolicyHandle>,
        store: Arc<dyn LoginAttemptStore>,
        recorder: Arc<ViolationRecorder>,
        events: EventBus,
    ) -> Self {
        Self {
            policy,
            store,
            recorder,
            events,
        }
    }

    pub async fn record_attempt(
        &self,
        identifier: &str,
        success: bool,
        ip: Option<&str>,
    ) -> Result<LoginDecision> {
        self.record_attempt_at(identifier, success, ip, Utc::now())
            .await
    }

    pub async fn record_attempt_at(
        &self,
        identifier: &str,
        success: bool,
        ip: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<LoginDecision> {
        if let Some(record) = self.store.get(identifier).await? {
            if let Some(until) = record.lockout_until {
                if now <= until {
                    debug!(
                        subsystem = "guard",
                        component = "login_guard",
                        identifier,
                        lockout_until = %until,
                        "Attempt during lockout rejected"
                    );
                    return Ok(LoginDecision::locked(until));
                }
                // Lockout expired: start over from Clear.
                self.store.clear(identifier).await?;
            }
        }

        if success {
            self.store.clear(identifier).await?;
            return Ok(LoginDecision::allowed());
        }

        let policy = self.policy.snapshot();
        let count = self
            .store
            .record_failure(identifier, now, policy.failure_memory())
            .await?;
        if count < policy.max_login_attempts {
            debug!(
                subsystem = "guard",
                component = "login_guard",
                identifier,
                count,
                max = policy.max_login_attempts,
                "Login failure counted"
            );
            return Ok(LoginDecision::allowed());
        }

        let until = self
            .store
            .lock(
                identifier,
                now + Duration::milliseconds(policy.lockout_duration_ms),
            )
            .await?;
        warn!(
            subsystem = "guard",
            component = "login_guard",
            identifier,
            count,
            lockout_until = %until,
            "Identifier locked out"
        );

        if let Some(ip) = ip {
            self.store.flag_ip(ip).await?;
        }
        if let Err(e) = self
            .recorder
            .record_at(
                ViolationType::SuspiciousActivity,
                Severity::High,
                Some(identifier),
                json!({
                    "reason": "login lockout",
                    "failed_attempts": count,
                    "lockout_until": until,
                    "ip": ip,
                }),
                now,
            )
            .await
        {
            error!(
                subsystem = "guard",
                component = "login_guard",
                error = %e,
                "Failed to record lockout violation"
            );
        }
        self.events.emit(ServerEvent::LoginLocked {
            identifier: identifier.to_string(),
            lockout_until: until,
        });

        Ok(LoginDecision::locked(until))
    }

    /// Whether `identifier` is locked out at `now`.
    pub async fn is_locked_at(&self, identifier: &str, now: DateTime<Utc>) -> Result<bool> {
        Ok(self
            .store
            .get(identifier)
            .await?
            .and_then(|r| r.lockout_until)
            .is_some_and(|until| now <= until))
    }

    pub async fn sweep(&self) -> Result<usize> {
        self.sweep_at(Utc::now()).await
    }

    /// Drop records whose lockout has expired, and failure counts that have
    /// sat idle past the policy's failure memory.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Result<usize> {
        let memory = self.policy.snapshot().failure_memory();
        let purged = self.store.purge_expired(now, memory).await?;
        if purged > 0 {
            info!(
                subsystem = "guard",
                component = "login_guard",
                op = "sweep",
                purged,
                "Expired login records purged"
            );
        }
        Ok(purged)
    }
}
