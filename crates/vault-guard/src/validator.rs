//! Upload screening.
//!
//! Every check runs regardless of earlier failures so the caller (and the
//! violation log) sees all reasons a file was rejected, not just the first.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tracing::{debug, error, warn};

use vault_core::{
    detect_executable_signature, suspicious_filename_patterns, FileUpload, Severity,
    ViolationType,
};

use crate::policy::PolicyHandle;
use crate::violations::ViolationRecorder;

pub const FILE_TOO_LARGE: &str = "file too large";
pub const TYPE_NOT_ALLOWED: &str = "type not allowed";
pub const SUSPICIOUS_FILENAME: &str = "suspicious filename";
pub const EXECUTABLE_SIGNATURE: &str = "executable signature detected";

/// One failed check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub message: &'static str,
    pub violation_type: ViolationType,
    pub severity: Severity,
    pub details: serde_json::Value,
}

/// Result of screening one upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationOutcome {
    pub accepted: bool,
    pub violations: Vec<String>,
}

pub struct SecurityValidator {
    policy: Arc<PolicyHandle>,
    recorder: Arc<ViolationRecorder>,
}

impl SecurityValidator {
    pub fn new(policy: Arc<PolicyHandle>, recorder: Arc<ViolationRecorder>) -> Self {
        Self { policy, recorder }
    }

    /// Screen an upload and record every finding. Never fails: a violation
    /// store outage is logged and the rejection still stands.
    pub async fn validate(&self, upload: &FileUpload, actor_id: &str) -> ValidationOutcome {
        let findings = self.inspect(upload);

        for finding in &findings {
            if let Err(e) = self
                .recorder
                .record(
                    finding.violation_type,
                    finding.severity,
                    Some(actor_id),
                    finding.details.clone(),
                )
                .await
            {
                error!(
                    subsystem = "guard",
                    component = "validator",
                    actor_id,
                    error = %e,
                    "Failed to record upload violation"
                );
            }
        }

        if findings.is_empty() {
            debug!(
                subsystem = "guard",
                component = "validator",
                actor_id,
                media_type = %upload.media_type,
                "Upload accepted"
            );
        } else {
            warn!(
                subsystem = "guard",
                component = "validator",
                actor_id,
                media_type = %upload.media_type,
                findings = findings.len(),
                "Upload rejected"
            );
        }

        ValidationOutcome {
            accepted: findings.is_empty(),
            violations: findings.iter().map(|f| f.message.to_string()).collect(),
        }
    }

    /// Run all checks against the current policy without recording anything.
    pub fn inspect(&self, upload: &FileUpload) -> Vec<Finding> {
        let policy = self.policy.snapshot();
        let mut findings = Vec::new();

        let size = upload.effective_size();
        if size > policy.max_file_size_bytes {
            findings.push(Finding {
                message: FILE_TOO_LARGE,
                violation_type: ViolationType::FileSize,
                severity: Severity::Medium,
                details: json!({
                    "file_name": upload.name,
                    "size_bytes": size,
                    "max_file_size_bytes": policy.max_file_size_bytes,
                }),
            });
        }

        if !policy.is_media_type_allowed(&upload.media_type) {
            findings.push(Finding {
                message: TYPE_NOT_ALLOWED,
                violation_type: ViolationType::FileType,
                severity: Severity::High,
                details: json!({
                    "file_name": upload.name,
                    "media_type": upload.media_type,
                }),
            });
        }

        let patterns = suspicious_filename_patterns(&upload.name);
        if !patterns.is_empty() {
            findings.push(Finding {
                message: SUSPICIOUS_FILENAME,
                violation_type: ViolationType::SuspiciousActivity,
                severity: Severity::High,
                details: json!({
                    "file_name": upload.name,
                    "patterns": patterns.iter().map(|p| p.as_str()).collect::<Vec<_>>(),
                }),
            });
        }

        if let Some(signature) = detect_executable_signature(&upload.bytes) {
            findings.push(Finding {
                message: EXECUTABLE_SIGNATURE,
                violation_type: ViolationType::SuspiciousActivity,
                severity: Severity::Critical,
                details: json!({
                    "file_name": upload.name,
                    "signature": signature,
                }),
            });
        }

        findings
    }
}
