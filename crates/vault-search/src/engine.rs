//! Search entrypoint: validates a query, consults the cache and runs the
//! filtered, sorted, paginated lookup against the document store.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, instrument};

use vault_core::defaults::PAGE_LIMIT_MAX;
use vault_core::{
    DocumentFilter, DocumentRepository, Error, PageRequest, Result, SearchQuery, SearchResults,
};

use crate::cache::SearchCache;

pub struct SearchEngine {
    repo: Arc<dyn DocumentRepository>,
    cache: SearchCache,
}

impl SearchEngine {
    pub fn new(repo: Arc<dyn DocumentRepository>, cache: SearchCache) -> Self {
        Self { repo, cache }
    }

    /// Engine without result caching.
    pub fn uncached(repo: Arc<dyn DocumentRepository>) -> Self {
        Self::new(repo, SearchCache::disabled())
    }

    pub fn cache(&self) -> &SearchCache {
        &self.cache
    }

    /// Run a search. `total_count` is the number of matches across all pages;
    /// `elapsed_ms` is measured for this call even when served from cache.
    #[instrument(
        skip(self, query),
        fields(subsystem = "search", component = "engine", owner_id = %query.owner_id)
    )]
    pub async fn search(&self, query: SearchQuery) -> Result<SearchResults> {
        let start = Instant::now();
        let query = Self::prepare(query)?;
        let key = SearchCache::cache_key(&query);

        if let Some(mut cached) = self.cache.get(&key, &query.owner_id).await {
            cached.elapsed_ms = start.elapsed().as_millis() as u64;
            return Ok(cached);
        }

        let generation = self.cache.generation().await;
        let filter = DocumentFilter::from_query(&query);
        let page = PageRequest {
            sort_field: query.sort_field,
            sort_direction: query.sort_direction,
            limit: query.limit,
            offset: query.offset,
        };
        let found = self.repo.search(&filter, page).await?;

        let mut results = SearchResults {
            documents: found.documents,
            total_count: found.total_count,
            elapsed_ms: 0,
        };
        self.cache
            .put(key, &query.owner_id, results.clone(), generation)
            .await;

        results.elapsed_ms = start.elapsed().as_millis() as u64;
        debug!(
            result_count = results.documents.len(),
            total_count = results.total_count,
            duration_ms = results.elapsed_ms,
            "Search complete"
        );
        Ok(results)
    }

    /// Drop cached results for an owner after their corpus changed.
    pub async fn invalidate_owner(&self, owner_id: &str) -> usize {
        self.cache.invalidate_owner(owner_id).await
    }

    /// Reject malformed queries and clamp the page size to `1..=100`.
    fn prepare(mut query: SearchQuery) -> Result<SearchQuery> {
        if query.owner_id.trim().is_empty() {
            return Err(Error::InvalidInput("owner_id is required".into()));
        }
        if query.offset < 0 {
            return Err(Error::InvalidInput(format!(
                "offset must be non-negative, got {}",
                query.offset
            )));
        }
        let f = &query.filters;
        if let (Some(min), Some(max)) = (f.min_size, f.max_size) {
            if min > max {
                return Err(Error::InvalidInput(format!(
                    "min_size {} exceeds max_size {}",
                    min, max
                )));
            }
        }
        if let (Some(from), Some(to)) = (f.date_from, f.date_to) {
            if from > to {
                return Err(Error::InvalidInput("date_from is after date_to".into()));
            }
        }
        query.limit = query.limit.clamp(1, PAGE_LIMIT_MAX);
        Ok(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vault_core::SearchFilters;

    #[test]
    fn prepare_clamps_limit() {
        let q = SearchEngine::prepare(SearchQuery::new("", "a").with_page(500, 0)).unwrap();
        assert_eq!(q.limit, 100);
        let q = SearchEngine::prepare(SearchQuery::new("", "a").with_page(0, 0)).unwrap();
        assert_eq!(q.limit, 1);
    }

    #[test]
    fn prepare_rejects_malformed_queries() {
        assert!(matches!(
            SearchEngine::prepare(SearchQuery::new("", " ")),
            Err(Error::InvalidInput(_))
        ));
        assert!(SearchEngine::prepare(SearchQuery::new("", "a").with_page(10, -1)).is_err());
        let inverted = SearchQuery::new("", "a").with_filters(SearchFilters {
            min_size: Some(10),
            max_size: Some(5),
            ..Default::default()
        });
        assert!(SearchEngine::prepare(inverted).is_err());
    }
}
