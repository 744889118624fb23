//! In-process search result cache.
//!
//! Entries are keyed by a hash of the owner, normalised free text, filters,
//! ordering and page window. Each entry remembers its owner so uploads and
//! deletes can drop exactly that owner's results, and a read only returns
//! an entry to the owner that stored it.
//!
//! Invalidation bumps a generation counter. A search that started before an
//! invalidation carries the older generation and its results are not stored.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use lru::LruCache;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use vault_core::defaults::{SEARCH_CACHE_CAPACITY, SEARCH_CACHE_TTL_SECS};
use vault_core::{env_parse, normalize_query, SearchQuery, SearchResults};

const KEY_PREFIX: &str = "dv:search:";

struct CacheEntry {
    owner_id: String,
    results: SearchResults,
    inserted_at: Instant,
}

struct CacheState {
    entries: LruCache<String, CacheEntry>,
    generation: u64,
}

/// LRU + TTL cache for [`SearchResults`]. Cloning shares the same storage.
#[derive(Clone)]
pub struct SearchCache {
    state: Option<Arc<Mutex<CacheState>>>,
    ttl: Duration,
}

impl SearchCache {
    /// A capacity of zero disables caching.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let state = NonZeroUsize::new(capacity).map(|cap| {
            Arc::new(Mutex::new(CacheState {
                entries: LruCache::new(cap),
                generation: 0,
            }))
        });
        Self { state, ttl }
    }

    /// Reads `SEARCH_CACHE_CAPACITY` and `SEARCH_CACHE_TTL_SECS`.
    pub fn from_env() -> Self {
        let capacity = env_parse("SEARCH_CACHE_CAPACITY").unwrap_or(SEARCH_CACHE_CAPACITY);
        let ttl_secs = env_parse("SEARCH_CACHE_TTL_SECS").unwrap_or(SEARCH_CACHE_TTL_SECS);
        info!(
            subsystem = "search",
            component = "cache",
            capacity,
            ttl_secs,
            "Search cache configured"
        );
        Self::new(capacity, Duration::from_secs(ttl_secs))
    }

    pub fn disabled() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn is_enabled(&self) -> bool {
        self.state.is_some()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cache key for a query. Free text is normalised first, so queries that
    /// differ only in case or surrounding whitespace share an entry.
    pub fn cache_key(query: &SearchQuery) -> String {
        let mut hasher = Sha256::new();
        hasher.update(query.owner_id.as_bytes());
        hasher.update([0]);
        hasher.update(normalize_query(&query.free_text).as_bytes());
        hasher.update([0]);
        // Field order of the derived Serialize impls is fixed, so this is stable.
        if let Ok(shape) = serde_json::to_vec(&(
            &query.filters,
            query.sort_field,
            query.sort_direction,
            query.limit,
            query.offset,
        )) {
            hasher.update(shape);
        }
        let hash = hex::encode(hasher.finalize());
        format!("{}{}", KEY_PREFIX, &hash[..16])
    }

    /// Cached results for `key`, only if they were stored for `owner_id`
    /// and are still within the TTL.
    pub async fn get(&self, key: &str, owner_id: &str) -> Option<SearchResults> {
        let state = self.state.as_ref()?;
        let mut state = state.lock().await;
        let stale = match state.entries.get(key) {
            Some(entry) if entry.owner_id != owner_id => {
                warn!(
                    subsystem = "search",
                    component = "cache",
                    key,
                    "Cache entry owner mismatch, dropping entry"
                );
                true
            }
            Some(entry) if entry.inserted_at.elapsed() <= self.ttl => {
                debug!(subsystem = "search", component = "cache", key, "Cache hit");
                return Some(entry.results.clone());
            }
            Some(_) => true,
            None => false,
        };
        if stale {
            state.entries.pop(key);
        }
        debug!(subsystem = "search", component = "cache", key, "Cache miss");
        None
    }

    /// Current invalidation generation. Read it before querying the
    /// repository and hand it back to [`put`](Self::put).
    pub async fn generation(&self) -> u64 {
        match self.state.as_ref() {
            Some(state) => state.lock().await.generation,
            None => 0,
        }
    }

    /// Store results computed under `generation`. Skipped when an
    /// invalidation happened since, so no pre-invalidation result survives.
    pub async fn put(&self, key: String, owner_id: &str, results: SearchResults, generation: u64) {
        let Some(state) = self.state.as_ref() else {
            return;
        };
        let mut state = state.lock().await;
        if state.generation != generation {
            debug!(
                subsystem = "search",
                component = "cache",
                key = %key,
                "Results predate an invalidation, not cached"
            );
            return;
        }
        state.entries.put(
            key,
            CacheEntry {
                owner_id: owner_id.to_string(),
                results,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drop every entry belonging to `owner_id`. Returns how many were removed.
    pub async fn invalidate_owner(&self, owner_id: &str) -> usize {
        let Some(state) = self.state.as_ref() else {
            return 0;
        };
        let mut state = state.lock().await;
        state.generation = state.generation.wrapping_add(1);
        let stale: Vec<String> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.owner_id == owner_id)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &stale {
            state.entries.pop(key);
        }
        if !stale.is_empty() {
            debug!(
                subsystem = "search",
                component = "cache",
                owner_id,
                removed = stale.len(),
                "Owner entries invalidated"
            );
        }
        stale.len()
    }

    pub async fn len(&self) -> usize {
        match self.state.as_ref() {
            Some(state) => state.lock().await.entries.len(),
            None => 0,
        }
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vault_core::{SearchFilters, SortDirection, SortField};

    #[test]
    fn test_cache_key_generation() {
        let base = SearchQuery::new("Invoice", "alice");
        let key1 = SearchCache::cache_key(&base);
        assert_eq!(key1, SearchCache::cache_key(&SearchQuery::new("  invoice ", "alice")));
        assert!(key1.starts_with(KEY_PREFIX));
        assert_eq!(key1.len(), KEY_PREFIX.len() + 16);

        assert_ne!(key1, SearchCache::cache_key(&SearchQuery::new("invoice", "bob")));
        assert_ne!(
            key1,
            SearchCache::cache_key(&base.clone().with_page(20, 20))
        );
        assert_ne!(
            key1,
            SearchCache::cache_key(&base.clone().with_sort(SortField::Name, SortDirection::Asc))
        );
        let filtered = base.with_filters(SearchFilters {
            language: Some("en".into()),
            ..Default::default()
        });
        assert_ne!(key1, SearchCache::cache_key(&filtered));
    }

    #[tokio::test]
    async fn disabled_cache_stores_nothing() {
        let cache = SearchCache::disabled();
        cache.put("k".into(), "alice", SearchResults::default(), 0).await;
        assert!(cache.get("k", "alice").await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = SearchCache::new(8, Duration::from_secs(60));
        cache.put("k".into(), "alice", SearchResults::default(), 0).await;
        assert!(cache.get("k", "alice").await.is_some());

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(cache.get("k", "alice").await.is_none());
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn invalidation_is_per_owner() {
        let cache = SearchCache::new(8, Duration::from_secs(60));
        cache.put("a1".into(), "alice", SearchResults::default(), 0).await;
        cache.put("a2".into(), "alice", SearchResults::default(), 0).await;
        cache.put("b1".into(), "bob", SearchResults::default(), 0).await;

        assert_eq!(cache.invalidate_owner("alice").await, 2);
        assert!(cache.get("a1", "alice").await.is_none());
        assert!(cache.get("b1", "bob").await.is_some());
    }

    #[tokio::test]
    async fn capacity_evicts_least_recent() {
        let cache = SearchCache::new(2, Duration::from_secs(60));
        cache.put("a".into(), "o", SearchResults::default(), 0).await;
        cache.put("b".into(), "o", SearchResults::default(), 0).await;
        cache.put("c".into(), "o", SearchResults::default(), 0).await;
        assert!(cache.get("a", "o").await.is_none());
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn entry_is_only_served_to_its_owner() {
        let cache = SearchCache::new(8, Duration::from_secs(60));
        cache.put("k".into(), "alice", SearchResults::default(), 0).await;

        assert!(cache.get("k", "mallory").await.is_none());
        // The mismatched entry is dropped rather than kept around.
        assert!(cache.get("k", "alice").await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn put_after_invalidation_is_discarded() {
        let cache = SearchCache::new(8, Duration::from_secs(60));
        let generation = cache.generation().await;

        // An upload lands while the search is still reading the repository.
        cache.invalidate_owner("alice").await;
        cache
            .put("k".into(), "alice", SearchResults::default(), generation)
            .await;
        assert!(cache.get("k", "alice").await.is_none());

        let fresh = cache.generation().await;
        assert_ne!(fresh, generation);
        cache.put("k".into(), "alice", SearchResults::default(), fresh).await;
        assert!(cache.get("k", "alice").await.is_some());
    }
}
