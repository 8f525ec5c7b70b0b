//! Full speaking URL → decode result memoization.
//!
//! # Responsibilities
//! - Serve complete decode results for previously seen URLs
//! - Write results once they are fully known
//!
//! # Design Decisions
//! - Exact-key table, never partially matched
//! - Unreadable or unresolved rows are skipped; the first usable row wins
//! - Writes re-check with the same rule, so an unusable row never blocks a
//!   fresh one; concurrent duplicates can still slip through

use std::sync::Arc;

use crate::cache::store::{unix_now, CacheStore, StoreError, UrlCacheEntry};
use crate::decoder::types::DecodedResult;
use crate::observability::metrics;

/// URL cache scoped to one site root.
#[derive(Clone)]
pub struct UrlCache {
    store: Arc<dyn CacheStore>,
    root_id: u64,
}

impl UrlCache {
    pub fn new(store: Arc<dyn CacheStore>, root_id: u64) -> Self {
        Self { store, root_id }
    }

    /// Cached result for `speaking_url`, if a usable one exists.
    pub fn lookup(&self, speaking_url: &str) -> Result<Option<DecodedResult>, StoreError> {
        let rows = self.store.find_urls(self.root_id, speaking_url)?;
        let found = first_usable(speaking_url, &rows);

        let result = match (&found, rows.is_empty()) {
            (Some(_), _) => "hit",
            (None, true) => "miss",
            (None, false) => "unusable",
        };
        metrics::record_url_cache(result);
        Ok(found)
    }

    /// Store a resolved result unless a row appeared in the meantime.
    ///
    /// Returns `true` if a row was written.
    pub fn store(
        &self,
        speaking_url: &str,
        original_query: &str,
        result: &DecodedResult,
    ) -> Result<bool, StoreError> {
        if !result.is_resolved() {
            return Ok(false);
        }
        let rows = self.store.find_urls(self.root_id, speaking_url)?;
        if first_usable(speaking_url, &rows).is_some() {
            tracing::debug!(speaking_url = %speaking_url, "URL cache row already present");
            return Ok(false);
        }

        self.store.insert_url(UrlCacheEntry {
            root_id: self.root_id,
            speaking_url: speaking_url.to_string(),
            original_query: original_query.to_string(),
            payload: serde_json::to_string(result)?,
            created_at: unix_now(),
        })?;
        tracing::debug!(speaking_url = %speaking_url, id = result.id, "Cached decoded URL");
        Ok(true)
    }
}

/// First row whose payload decodes to a resolved result.
fn first_usable(speaking_url: &str, rows: &[UrlCacheEntry]) -> Option<DecodedResult> {
    rows.iter()
        .find_map(|row| match serde_json::from_str::<DecodedResult>(&row.payload) {
            Ok(result) if result.is_resolved() => Some(result),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(speaking_url = %speaking_url, error = %e, "Ignoring unreadable URL cache payload");
                None
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::memory::MemoryCacheStore;
    use crate::decoder::types::Parameters;
    use serde_json::json;

    fn result(id: u64) -> DecodedResult {
        let mut parameters = Parameters::new();
        parameters.insert("tx_news".to_string(), json!({"news": "42"}));
        DecodedResult { id, parameters }
    }

    #[test]
    fn test_store_then_lookup() {
        let store = MemoryCacheStore::new(None);
        let cache = UrlCache::new(Arc::new(store.clone()), 1);

        assert!(cache.lookup("news/").unwrap().is_none());
        assert!(cache.store("news/", "id=5", &result(5)).unwrap());
        assert_eq!(cache.lookup("news/").unwrap(), Some(result(5)));

        // Second write is skipped.
        assert!(!cache.store("news/", "id=5", &result(5)).unwrap());
        assert_eq!(store.url_rows(), 1);
    }

    #[test]
    fn test_unresolved_result_not_stored() {
        let store = MemoryCacheStore::new(None);
        let cache = UrlCache::new(Arc::new(store.clone()), 1);
        assert!(!cache.store("news/", "", &result(0)).unwrap());
        assert_eq!(store.url_rows(), 0);
    }

    #[test]
    fn test_corrupt_payload_is_miss() {
        let store = MemoryCacheStore::new(None);
        store
            .insert_url(UrlCacheEntry {
                root_id: 1,
                speaking_url: "broken/".to_string(),
                original_query: String::new(),
                payload: "{not json".to_string(),
                created_at: 0,
            })
            .unwrap();

        let cache = UrlCache::new(Arc::new(store.clone()), 1);
        assert!(cache.lookup("broken/").unwrap().is_none());

        // The unreadable row does not block a fresh one.
        assert!(cache.store("broken/", "id=5", &result(5)).unwrap());
        assert_eq!(cache.lookup("broken/").unwrap(), Some(result(5)));
        assert_eq!(store.url_rows(), 2);
        assert!(!cache.store("broken/", "id=5", &result(5)).unwrap());
    }

    #[test]
    fn test_unresolved_row_skipped() {
        let store = MemoryCacheStore::new(None);
        store
            .insert_url(UrlCacheEntry {
                root_id: 1,
                speaking_url: "news/".to_string(),
                original_query: String::new(),
                payload: r#"{"id": 0}"#.to_string(),
                created_at: 0,
            })
            .unwrap();

        let cache = UrlCache::new(Arc::new(store), 1);
        assert!(cache.lookup("news/").unwrap().is_none());
        assert!(cache.store("news/", "id=7", &result(7)).unwrap());
        assert_eq!(cache.lookup("news/").unwrap(), Some(result(7)));
    }

    #[test]
    fn test_rows_scoped_by_root() {
        let store = Arc::new(MemoryCacheStore::new(None));
        UrlCache::new(store.clone(), 1).store("news/", "", &result(5)).unwrap();
        assert!(UrlCache::new(store, 2).lookup("news/").unwrap().is_none());
    }
}
