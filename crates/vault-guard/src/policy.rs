//! Atomically replaceable security policy.

use std::sync::{Arc, RwLock};

use tracing::info;
use vault_core::{Error, Result, SecurityPolicy};

/// Shared holder of the current [`SecurityPolicy`].
///
/// Readers take an `Arc` snapshot per call, so a concurrent
/// [`replace`](Self::replace) never exposes a half-updated policy.
#[derive(Debug)]
pub struct PolicyHandle {
    current: RwLock<Arc<SecurityPolicy>>,
}

impl Default for PolicyHandle {
    fn default() -> Self {
        Self::new(SecurityPolicy::default())
    }
}

impl PolicyHandle {
    pub fn new(policy: SecurityPolicy) -> Self {
        Self {
            current: RwLock::new(Arc::new(policy.normalized())),
        }
    }

    pub fn snapshot(&self) -> Arc<SecurityPolicy> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// Validate and install a new policy, returning the previous one. The
    /// media type allow list is stored lowercased.
    pub fn replace(&self, policy: SecurityPolicy) -> Result<Arc<SecurityPolicy>> {
        let policy = policy.normalized();
        validate_policy(&policy)?;
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        let previous = std::mem::replace(&mut *guard, Arc::new(policy));
        info!(
            subsystem = "guard",
            component = "policy",
            op = "replace",
            max_file_size_bytes = guard.max_file_size_bytes,
            max_login_attempts = guard.max_login_attempts,
            lockout_duration_ms = guard.lockout_duration_ms,
            "Security policy replaced"
        );
        Ok(previous)
    }
}

/// Reject policies that would make the guards misbehave.
pub fn validate_policy(policy: &SecurityPolicy) -> Result<()> {
    if policy.max_login_attempts == 0 {
        return Err(Error::InvalidInput(
            "max_login_attempts must be at least 1".into(),
        ));
    }
    if policy.lockout_duration_ms < 0 {
        return Err(Error::InvalidInput(
            "lockout_duration_ms must not be negative".into(),
        ));
    }
    if policy.allowed_media_types.is_empty() {
        return Err(Error::InvalidInput(
            "allowed_media_types must not be empty".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_survives_replace() {
        let handle = PolicyHandle::default();
        let before = handle.snapshot();

        let mut next = SecurityPolicy::default();
        next.max_file_size_bytes = 1;
        let previous = handle.replace(next).unwrap();

        assert_eq!(previous.max_file_size_bytes, before.max_file_size_bytes);
        assert_eq!(before.max_file_size_bytes, SecurityPolicy::default().max_file_size_bytes);
        assert_eq!(handle.snapshot().max_file_size_bytes, 1);
    }

    #[test]
    fn invalid_policy_is_rejected_and_not_installed() {
        let handle = PolicyHandle::default();
        let mut bad = SecurityPolicy::default();
        bad.max_login_attempts = 0;
        assert!(matches!(handle.replace(bad), Err(Error::InvalidInput(_))));
        assert_eq!(handle.snapshot().max_login_attempts, 5);

        let mut empty = SecurityPolicy::default();
        empty.allowed_media_types.clear();
        assert!(validate_policy(&empty).is_err());

        let mut blank = SecurityPolicy::default();
        blank.allowed_media_types = ["  ".to_string()].into_iter().collect();
        assert!(handle.replace(blank).is_err());
    }

    #[test]
    fn replaced_allow_list_is_lowercased() {
        let handle = PolicyHandle::default();
        let mut next = SecurityPolicy::default();
        next.allowed_media_types = [" Application/PDF ".to_string(), "TEXT/plain".to_string()]
            .into_iter()
            .collect();
        handle.replace(next).unwrap();

        let current = handle.snapshot();
        assert!(current.allowed_media_types.contains("application/pdf"));
        assert!(current.allowed_media_types.contains("text/plain"));
        assert!(current.is_media_type_allowed("application/pdf"));
    }
}
