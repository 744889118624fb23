//! Periodic retention sweep, off the request path.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use vault_core::{Error, Result};

use crate::login_guard::LoginGuard;
use crate::rate_limit::RateLimiter;
use crate::violations::ViolationRecorder;

/// Totals from one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub violations: u64,
    pub rate_windows: usize,
    pub lockouts: usize,
}

/// Runs the three sweeps on a fixed interval.
pub struct Sweeper {
    recorder: Arc<ViolationRecorder>,
    limiter: Arc<RateLimiter>,
    guard: Arc<LoginGuard>,
    interval: Duration,
}

/// Handle for a running sweeper task.
pub struct SweeperHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stop the sweeper and wait for the task to exit.
    pub async fn shutdown(self) -> Result<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| Error::Internal("Failed to send shutdown signal".into()))?;
        self.task
            .await
            .map_err(|e| Error::Internal(format!("Sweeper task failed: {}", e)))
    }
}

impl Sweeper {
    pub fn new(
        recorder: Arc<ViolationRecorder>,
        limiter: Arc<RateLimiter>,
        guard: Arc<LoginGuard>,
        interval: Duration,
    ) -> Self {
        Self {
            recorder,
            limiter,
            guard,
            interval,
        }
    }

    /// Run one pass. Each sweep is independent; a failing store does not
    /// prevent the others from running.
    pub async fn run_once(&self) -> SweepReport {
        let now = Utc::now();
        let mut report = SweepReport::default();

        match self.recorder.sweep_at(now).await {
            Ok(n) => report.violations = n,
            Err(e) => error!(subsystem = "guard", component = "sweeper", error = %e, "Violation sweep failed"),
        }
        match self.limiter.sweep_at(now).await {
            Ok(n) => report.rate_windows = n,
            Err(e) => error!(subsystem = "guard", component = "sweeper", error = %e, "Rate window sweep failed"),
        }
        match self.guard.sweep_at(now).await {
            Ok(n) => report.lockouts = n,
            Err(e) => error!(subsystem = "guard", component = "sweeper", error = %e, "Lockout sweep failed"),
        }

        debug!(
            subsystem = "guard",
            component = "sweeper",
            violations = report.violations,
            rate_windows = report.rate_windows,
            lockouts = report.lockouts,
            "Sweep pass complete"
        );
        report
    }

    /// Spawn the periodic task. The first pass runs after one full interval.
    pub fn start(self) -> SweeperHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let task = tokio::spawn(async move {
            info!(
                subsystem = "guard",
                component = "sweeper",
                interval_secs = self.interval.as_secs(),
                "Sweeper started"
            );
            let mut ticker = tokio::time::interval_at(
                tokio::time::Instant::now() + self.interval,
                self.interval,
            );
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!(subsystem = "guard", component = "sweeper", "Sweeper received shutdown signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        self.run_once().await;
                    }
                }
            }
        });
        SweeperHandle { shutdown_tx, task }
    }
}
