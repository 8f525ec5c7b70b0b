//! In-memory cache store with optional JSON persistence.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::cache::store::{CacheStore, PathCacheEntry, StoreError, UrlCacheEntry};
use crate::observability::metrics;

type PathKey = (u64, u64, String);
type NodeKey = (u64, u64, u64);
type UrlKey = (u64, String);

/// On-disk layout of a persisted store.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    path_rows: Vec<PathCacheEntry>,
    url_rows: Vec<UrlCacheEntry>,
}

/// A thread-safe, append-only store for both cache relations.
///
/// Rows sharing a key are kept side by side, the way a table without a
/// uniqueness constraint would keep them. Path rows are indexed twice: by
/// path for prefix search and by node for the pre-insert check.
#[derive(Clone, Default)]
pub struct MemoryCacheStore {
    paths: Arc<DashMap<PathKey, Vec<PathCacheEntry>>>,
    nodes: Arc<DashMap<NodeKey, Vec<PathCacheEntry>>>,
    urls: Arc<DashMap<UrlKey, Vec<UrlCacheEntry>>>,
    path_count: Arc<AtomicUsize>,
    url_count: Arc<AtomicUsize>,
    persistence_path: Option<String>,
}

impl MemoryCacheStore {
    /// Create a new empty store.
    pub fn new(persistence_path: Option<String>) -> Self {
        Self {
            persistence_path,
            ..Self::default()
        }
    }

    /// Load from file if exists.
    pub fn load_from_file(path: &str) -> Result<Self, StoreError> {
        let store = Self::new(Some(path.to_string()));
        if Path::new(path).exists() {
            let file = File::open(path)?;
            let snapshot: Snapshot = serde_json::from_reader(BufReader::new(file))?;

            for row in snapshot.path_rows {
                store.push_path(row);
            }
            for row in snapshot.url_rows {
                store.push_url(row);
            }
            metrics::record_cache_rows(store.path_rows(), store.url_rows());
            tracing::info!(
                path_rows = store.path_rows(),
                url_rows = store.url_rows(),
                "Loaded cache store from file"
            );
        }
        Ok(store)
    }

    /// Save to file.
    pub fn save_to_file(&self) -> Result<(), StoreError> {
        if let Some(path) = &self.persistence_path {
            let snapshot = Snapshot {
                path_rows: self.paths.iter().flat_map(|r| r.value().clone()).collect(),
                url_rows: self.urls.iter().flat_map(|r| r.value().clone()).collect(),
            };
            let writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer(writer, &snapshot)?;
            tracing::info!(
                path_rows = snapshot.path_rows.len(),
                url_rows = snapshot.url_rows.len(),
                "Saved cache store to file"
            );
        }
        Ok(())
    }

    /// Number of path cache rows, duplicates included.
    pub fn path_rows(&self) -> usize {
        self.path_count.load(Ordering::Relaxed)
    }

    /// Number of URL cache rows, duplicates included.
    pub fn url_rows(&self) -> usize {
        self.url_count.load(Ordering::Relaxed)
    }

    fn push_path(&self, entry: PathCacheEntry) {
        let node_key = (entry.root_id, entry.language_id, entry.node_id);
        self.nodes.entry(node_key).or_default().push(entry.clone());
        let key = (entry.root_id, entry.language_id, entry.path.clone());
        self.paths.entry(key).or_default().push(entry);
        self.path_count.fetch_add(1, Ordering::Relaxed);
    }

    fn push_url(&self, entry: UrlCacheEntry) {
        let key = (entry.root_id, entry.speaking_url.clone());
        self.urls.entry(key).or_default().push(entry);
        self.url_count.fetch_add(1, Ordering::Relaxed);
    }
}

impl CacheStore for MemoryCacheStore {
    fn find_path(
        &self,
        root_id: u64,
        language_id: u64,
        path: &str,
        now: u64,
    ) -> Result<Option<PathCacheEntry>, StoreError> {
        let key = (root_id, language_id, path.to_string());
        Ok(self
            .paths
            .get(&key)
            .and_then(|rows| rows.iter().find(|r| r.is_live(now)).cloned()))
    }

    fn find_path_for_node(
        &self,
        root_id: u64,
        language_id: u64,
        node_id: u64,
        now: u64,
    ) -> Result<Option<PathCacheEntry>, StoreError> {
        let key = (root_id, language_id, node_id);
        Ok(self
            .nodes
            .get(&key)
            .and_then(|rows| rows.iter().rev().find(|r| r.is_live(now)).cloned()))
    }

    fn insert_path(&self, entry: PathCacheEntry) -> Result<(), StoreError> {
        self.push_path(entry);
        metrics::record_cache_rows(self.path_rows(), self.url_rows());
        Ok(())
    }

    fn find_urls(&self, root_id: u64, speaking_url: &str) -> Result<Vec<UrlCacheEntry>, StoreError> {
        let key = (root_id, speaking_url.to_string());
        Ok(self.urls.get(&key).map(|rows| rows.value().clone()).unwrap_or_default())
    }

    fn insert_url(&self, entry: UrlCacheEntry) -> Result<(), StoreError> {
        self.push_url(entry);
        metrics::record_cache_rows(self.path_rows(), self.url_rows());
        Ok(())
    }
}
