//! Process-local store backends.
//!
//! Suitable for a single-instance deployment and for tests. Each store keeps
//! its state behind one tokio lock, so per-key updates are atomic within the
//! process. Multi-instance deployments use the Postgres and Redis backends.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use vault_core::{
    compare_documents, Document, DocumentFilter, DocumentPage, DocumentRepository,
    LoginAttemptRecord, LoginAttemptStore, PageRequest, RateCounterStore, RateWindow, Result,
    Violation, ViolationQuery, ViolationRepository, ViolationTally,
};

// =============================================================================
// DOCUMENTS
// =============================================================================

#[derive(Default)]
pub struct MemoryDocumentRepository {
    docs: RwLock<HashMap<Uuid, Document>>,
}

impl MemoryDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentRepository for MemoryDocumentRepository {
    async fn insert(&self, doc: &Document) -> Result<()> {
        self.docs.write().await.insert(doc.id, doc.clone());
        Ok(())
    }

    async fn fetch(&self, owner_id: &str, id: Uuid) -> Result<Option<Document>> {
        Ok(self
            .docs
            .read()
            .await
            .get(&id)
            .filter(|d| d.owner_id == owner_id)
            .cloned())
    }

    async fn delete(&self, owner_id: &str, id: Uuid) -> Result<Option<Document>> {
        let mut docs = self.docs.write().await;
        match docs.get(&id) {
            Some(d) if d.owner_id == owner_id => Ok(docs.remove(&id)),
            _ => Ok(None),
        }
    }

    async fn search(&self, filter: &DocumentFilter, page: PageRequest) -> Result<DocumentPage> {
        let docs = self.docs.read().await;
        let mut matching: Vec<&Document> = docs.values().filter(|d| filter.matches(d)).collect();
        matching.sort_by(|a, b| compare_documents(a, b, page.sort_field, page.sort_direction));

        let total_count = matching.len() as i64;
        let documents = matching
            .into_iter()
            .skip(page.offset.max(0) as usize)
            .take(page.limit.max(0) as usize)
            .cloned()
            .collect();
        Ok(DocumentPage {
            documents,
            total_count,
        })
    }
}

// =============================================================================
// VIOLATIONS
// =============================================================================

#[derive(Default)]
pub struct MemoryViolationRepository {
    log: RwLock<Vec<Violation>>,
}

impl MemoryViolationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ViolationRepository for MemoryViolationRepository {
    async fn append(&self, violation: &Violation) -> Result<()> {
        self.log.write().await.push(violation.clone());
        Ok(())
    }

    async fn query(&self, query: &ViolationQuery) -> Result<Vec<Violation>> {
        let log = self.log.read().await;
        let mut hits: Vec<Violation> = log.iter().filter(|v| query.matches(v)).cloned().collect();
        hits.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(hits)
    }

    async fn tally(&self) -> Result<Vec<ViolationTally>> {
        let log = self.log.read().await;
        let mut counts = BTreeMap::new();
        for v in log.iter() {
            *counts.entry((v.violation_type, v.severity)).or_insert(0u64) += 1;
        }
        Ok(counts
            .into_iter()
            .map(|((violation_type, severity), count)| ViolationTally {
                violation_type,
                severity,
                count,
            })
            .collect())
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut log = self.log.write().await;
        let before = log.len();
        log.retain(|v| v.timestamp >= cutoff);
        Ok((before - log.len()) as u64)
    }
}

// =============================================================================
// RATE COUNTERS
// =============================================================================

#[derive(Default)]
pub struct MemoryRateCounterStore {
    windows: Mutex<HashMap<String, RateWindow>>,
}

impl MemoryRateCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.windows.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.windows.lock().await.is_empty()
    }
}

#[async_trait]
impl RateCounterStore for MemoryRateCounterStore {
    async fn hit(&self, key: &str, window: Duration, now: DateTime<Utc>) -> Result<RateWindow> {
        let mut windows = self.windows.lock().await;
        let entry = windows.entry(key.to_string()).or_insert(RateWindow {
            count: 0,
            reset_at: now + window,
        });
        if now > entry.reset_at {
            *entry = RateWindow {
                count: 0,
                reset_at: now + window,
            };
        }
        entry.count = entry.count.saturating_add(1);
        Ok(*entry)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut windows = self.windows.lock().await;
        let before = windows.len();
        windows.retain(|_, w| now <= w.reset_at);
        Ok(before - windows.len())
    }
}

// =============================================================================
// LOGIN ATTEMPTS
// =============================================================================

#[derive(Default)]
struct LoginState {
    records: HashMap<String, LoginAttemptRecord>,
    suspicious_ips: HashSet<String>,
}

fn empty_record(identifier: &str) -> LoginAttemptRecord {
    LoginAttemptRecord {
        identifier: identifier.to_string(),
        count: 0,
        lockout_until: None,
        last_failure_at: None,
    }
}

#[derive(Default)]
pub struct MemoryLoginAttemptStore {
    state: Mutex<LoginState>,
}

impl MemoryLoginAttemptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LoginAttemptStore for MemoryLoginAttemptStore {
    async fn get(&self, identifier: &str) -> Result<Option<LoginAttemptRecord>> {
        Ok(self.state.lock().await.records.get(identifier).cloned())
    }

    async fn record_failure(
        &self,
        identifier: &str,
        now: DateTime<Utc>,
        memory: Duration,
    ) -> Result<u32> {
        let mut state = self.state.lock().await;
        let record = state
            .records
            .entry(identifier.to_string())
            .or_insert_with(|| empty_record(identifier));
        if record.lockout_until.is_none()
            && record.last_failure_at.is_some_and(|at| now - at > memory)
        {
            record.count = 0;
        }
        record.count = record.count.saturating_add(1);
        record.last_failure_at = Some(now);
        Ok(record.count)
    }

    async fn lock(&self, identifier: &str, until: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let mut state = self.state.lock().await;
        let record = state
            .records
            .entry(identifier.to_string())
            .or_insert_with(|| empty_record(identifier));
        Ok(*record.lockout_until.get_or_insert(until))
    }

    async fn clear(&self, identifier: &str) -> Result<()> {
        self.state.lock().await.records.remove(identifier);
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>, memory: Duration) -> Result<usize> {
        let mut state = self.state.lock().await;
        let before = state.records.len();
        state.records.retain(|_, r| match r.lockout_until {
            Some(until) => now <= until,
            None => r.last_failure_at.is_some_and(|at| now - at <= memory),
        });
        Ok(before - state.records.len())
    }

    async fn locked_count(&self, now: DateTime<Utc>) -> Result<u64> {
        let state = self.state.lock().await;
        Ok(state
            .records
            .values()
            .filter(|r| r.lockout_until.is_some_and(|until| now <= until))
            .count() as u64)
    }

    async fn flag_ip(&self, ip: &str) -> Result<()> {
        self.state.lock().await.suspicious_ips.insert(ip.to_string());
        Ok(())
    }

    async fn suspicious_ip_count(&self) -> Result<u64> {
        Ok(self.state.lock().await.suspicious_ips.len() as u64)
    }
}
