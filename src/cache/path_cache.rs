//! Path prefix → node id memoization.
//!
//! # Responsibilities
//! - Longest-prefix search over a segment sequence
//! - Check-then-insert writes of resolved prefixes
//!
//! # Design Decisions
//! - Search drops trailing segments one at a time: O(depth) lookups worst case
//! - Writes are never updates; a moved page gets a second row
//! - Concurrent duplicate inserts are accepted, not locked out

use std::sync::Arc;

use crate::cache::store::{unix_now, CacheStore, PathCacheEntry, StoreError};
use crate::observability::metrics;

/// Result of a longest-prefix search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixMatch {
    /// Node of the longest cached prefix, if any prefix is cached.
    pub node_id: Option<u64>,
    /// Number of leading segments covered by that prefix.
    pub matched: usize,
}

impl PrefixMatch {
    /// Segments the cache could not account for, in original order.
    pub fn tail<'a>(&self, segments: &'a [String]) -> &'a [String] {
        &segments[self.matched..]
    }
}

/// Path cache scoped to one site root.
#[derive(Clone)]
pub struct PathCache {
    store: Arc<dyn CacheStore>,
    root_id: u64,
}

impl PathCache {
    pub fn new(store: Arc<dyn CacheStore>, root_id: u64) -> Self {
        Self { store, root_id }
    }

    pub fn root_id(&self) -> u64 {
        self.root_id
    }

    /// Find the longest cached prefix of `segments`.
    pub fn search(&self, language_id: u64, segments: &[String]) -> Result<PrefixMatch, StoreError> {
        let now = unix_now();
        for len in (1..=segments.len()).rev() {
            let path = segments[..len].join("/");
            if let Some(row) = self.store.find_path(self.root_id, language_id, &path, now)? {
                metrics::record_path_cache(true);
                tracing::trace!(path = %path, node_id = row.node_id, "Path cache hit");
                return Ok(PrefixMatch {
                    node_id: Some(row.node_id),
                    matched: len,
                });
            }
        }
        metrics::record_path_cache(false);
        Ok(PrefixMatch {
            node_id: None,
            matched: 0,
        })
    }

    /// Record that `path` resolves to `node_id`.
    ///
    /// Skipped when the node's live row already carries this path.
    pub fn put(&self, language_id: u64, node_id: u64, path: &str) -> Result<(), StoreError> {
        let now = unix_now();
        let existing = self
            .store
            .find_path_for_node(self.root_id, language_id, node_id, now)?;
        if existing.is_some_and(|row| row.path == path) {
            return Ok(());
        }

        tracing::debug!(node_id, path = %path, language_id, "Caching path");
        self.store.insert_path(PathCacheEntry {
            node_id,
            language_id,
            root_id: self.root_id,
            path: path.to_string(),
            expires_at: 0,
        })
    }
}
