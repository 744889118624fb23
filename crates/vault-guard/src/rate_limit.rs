//! Per-actor, per-action fixed-window rate limiting.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error, warn};

use vault_core::{defaults, RateCounterStore, Result, Severity, ViolationType};

use crate::policy::PolicyHandle;
use crate::violations::ViolationRecorder;

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateDecision {
    pub allowed: bool,
    /// Hits counted in the current window, including this one.
    pub count: u32,
    pub limit: u32,
    /// End of the current window.
    pub reset_at: DateTime<Utc>,
}

impl RateDecision {
    /// True once the window's count exceeds the action's limit.
    pub fn blocked(&self) -> bool {
        !self.allowed
    }

    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.count)
    }
}

pub struct RateLimiter {
    policy: Arc<PolicyHandle>,
    store: Arc<dyn RateCounterStore>,
    recorder: Arc<ViolationRecorder>,
    window: Duration,
}

impl RateLimiter {
    pub fn new(
        policy: Arc<PolicyHandle>,
        store: Arc<dyn RateCounterStore>,
        recorder: Arc<ViolationRecorder>,
    ) -> Self {
        Self {
            policy,
            store,
            recorder,
            window: Duration::seconds(defaults::RATE_LIMIT_WINDOW_SECS),
        }
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub async fn check(&self, actor_id: &str, action: &str) -> Result<RateDecision> {
        self.check_at(actor_id, action, Utc::now()).await
    }

    /// Count one use of `action` by `actor_id` at `now`.
    ///
    /// Counter store failures propagate; a blocked call records a
    /// `rate_limit` violation and keeps the window's `reset_at`.
    pub async fn check_at(
        &self,
        actor_id: &str,
        action: &str,
        now: DateTime<Utc>,
    ) -> Result<RateDecision> {
        let limit = self.policy.snapshot().rate_limit_for(action);
        let key = format!("{}:{}", actor_id, action);
        let window = self.store.hit(&key, self.window, now).await?;

        let decision = RateDecision {
            allowed: window.count <= limit,
            count: window.count,
            limit,
            reset_at: window.reset_at,
        };

        if decision.allowed {
            debug!(
                subsystem = "guard",
                component = "rate_limiter",
                actor_id,
                action,
                count = decision.count,
                limit,
                "Rate check passed"
            );
            return Ok(decision);
        }

        warn!(
            subsystem = "guard",
            component = "rate_limiter",
            actor_id,
            action,
            count = decision.count,
            limit,
            reset_at = %decision.reset_at,
            "Rate limit exceeded"
        );
        if let Err(e) = self
            .recorder
            .record_at(
                ViolationType::RateLimit,
                Severity::Medium,
                Some(actor_id),
                json!({
                    "action": action,
                    "count": decision.count,
                    "limit": limit,
                    "reset_at": decision.reset_at,
                }),
                now,
            )
            .await
        {
            error!(
                subsystem = "guard",
                component = "rate_limiter",
                error = %e,
                "Failed to record rate limit violation"
            );
        }
        Ok(decision)
    }

    pub async fn sweep(&self) -> Result<usize> {
        self.sweep_at(Utc::now()).await
    }

    /// Drop expired windows.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Result<usize> {
        let purged = self.store.purge_expired(now).await?;
        if purged > 0 {
            debug!(
                subsystem = "guard",
                component = "rate_limiter",
                op = "sweep",
                purged,
                "Expired rate windows purged"
            );
        }
        Ok(purged)
    }
}
