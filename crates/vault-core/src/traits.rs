//! Core traits for docvault store and collaborator abstractions.
//!
//! Services depend on these traits only, so single-instance (in-memory) and
//! multi-instance (Postgres/Redis) backends are interchangeable at call sites.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;
use crate::search::{DocumentFilter, DocumentPage, PageRequest};

// =============================================================================
// DOCUMENT STORE
// =============================================================================

/// Relational store for classified documents.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Insert a new document row.
    async fn insert(&self, doc: &Document) -> Result<()>;

    /// Fetch a document, scoped to its owner.
    async fn fetch(&self, owner_id: &str, id: Uuid) -> Result<Option<Document>>;

    /// Delete a document, returning the removed row.
    async fn delete(&self, owner_id: &str, id: Uuid) -> Result<Option<Document>>;

    /// Return one sorted page of matching documents plus the total match count.
    async fn search(&self, filter: &DocumentFilter, page: PageRequest) -> Result<DocumentPage>;
}

// =============================================================================
// VIOLATION LOG
// =============================================================================

/// Per (type, severity) count used by the metrics view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationTally {
    pub violation_type: ViolationType,
    pub severity: Severity,
    pub count: u64,
}

/// Append-only violation log.
#[async_trait]
pub trait ViolationRepository: Send + Sync {
    async fn append(&self, violation: &Violation) -> Result<()>;

    /// Matching violations, newest first.
    async fn query(&self, query: &ViolationQuery) -> Result<Vec<Violation>>;

    /// Counts grouped by type and severity over all retained rows.
    async fn tally(&self) -> Result<Vec<ViolationTally>>;

    /// Remove violations recorded before `cutoff`. Returns the number removed.
    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}

// =============================================================================
// BLOB STORE
// =============================================================================

/// Byte storage for uploaded originals, addressed by relative path.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn write(&self, path: &str, data: &[u8]) -> Result<()>;

    async fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Delete the blob; missing blobs are not an error.
    async fn delete(&self, path: &str) -> Result<()>;

    async fn exists(&self, path: &str) -> Result<bool>;
}

// =============================================================================
// COUNTER STORES
// =============================================================================

/// Authoritative fixed-window counters keyed by `(actor, action)`.
///
/// Implementations must make [`hit`](Self::hit) atomic per key: concurrent
/// callers for the same key observe distinct counts.
#[async_trait]
pub trait RateCounterStore: Send + Sync {
    /// Count one hit. Opens a new window (`count = 1`, `reset_at = now + window`)
    /// when no window exists or `now > reset_at`.
    async fn hit(&self, key: &str, window: Duration, now: DateTime<Utc>) -> Result<RateWindow>;

    /// Drop windows that have expired at `now`. Returns the number removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize>;
}

/// Consecutive login failure records and the suspicious-IP set.
#[async_trait]
pub trait LoginAttemptStore: Send + Sync {
    async fn get(&self, identifier: &str) -> Result<Option<LoginAttemptRecord>>;

    /// Atomically increment the failure count, returning the new count.
    /// A count idle for longer than `memory` starts over from zero.
    async fn record_failure(
        &self,
        identifier: &str,
        now: DateTime<Utc>,
        memory: Duration,
    ) -> Result<u32>;

    /// Set `lockout_until` unless a lockout is already present.
    /// Returns the lockout that is in effect after the call.
    async fn lock(&self, identifier: &str, until: DateTime<Utc>) -> Result<DateTime<Utc>>;

    /// Remove the record entirely.
    async fn clear(&self, identifier: &str) -> Result<()>;

    /// Drop records whose lockout expired before `now`, and unlocked records
    /// whose last failure is older than `memory`. Returns the number removed.
    async fn purge_expired(&self, now: DateTime<Utc>, memory: Duration) -> Result<usize>;

    /// Identifiers locked out at `now`.
    async fn locked_count(&self, now: DateTime<Utc>) -> Result<u64>;

    async fn flag_ip(&self, ip: &str) -> Result<()>;

    async fn suspicious_ip_count(&self) -> Result<u64>;
}

// =============================================================================
// EXTRACTION ADAPTERS
// =============================================================================

/// Result of extracting text from a file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub text: String,
    /// Adapter-specific metadata (page count, OCR confidence, ...).
    pub metadata: JsonValue,
}

/// Adapter for one extraction strategy.
///
/// Adapters are registered in an `ExtractionRegistry` and dispatched by the
/// file's [`ExtractionStrategy`].
#[async_trait]
pub trait ExtractionAdapter: Send + Sync {
    fn strategy(&self) -> ExtractionStrategy;

    async fn extract(&self, data: &[u8], filename: &str, media_type: &str)
        -> Result<ExtractionResult>;

    /// Whether the adapter's external dependency is reachable.
    async fn health_check(&self) -> Result<bool>;

    fn name(&self) -> &str;
}
