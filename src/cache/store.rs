//! Cache rows and the persistent store contract.
//!
//! # Design Decisions
//! - Row-oriented get/insert only; rows are never updated or deleted here
//! - No uniqueness constraint is assumed: readers accept any unexpired match
//! - Expiry is a timestamp compared against the caller's clock (0 = never)

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Current time in seconds since epoch.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Memoized path prefix → node id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathCacheEntry {
    pub node_id: u64,
    pub language_id: u64,
    pub root_id: u64,
    /// Segments joined with `/`, no leading or trailing slash.
    pub path: String,
    /// Expiry timestamp (seconds since epoch, 0 = never).
    pub expires_at: u64,
}

impl PathCacheEntry {
    pub fn is_live(&self, now: u64) -> bool {
        self.expires_at == 0 || self.expires_at > now
    }
}

/// Memoized speaking URL → serialized decode result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlCacheEntry {
    pub root_id: u64,
    pub speaking_url: String,
    /// Canonical query string of the resolved request.
    pub original_query: String,
    /// JSON-serialized decode result.
    pub payload: String,
    pub created_at: u64,
}

/// Errors surfaced by a cache backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cache backend failure: {0}")]
    Backend(String),

    #[error("cache IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache serialisation failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persistent storage for both cache relations.
pub trait CacheStore: Send + Sync {
    /// Any unexpired path row for (root, language, path).
    fn find_path(
        &self,
        root_id: u64,
        language_id: u64,
        path: &str,
        now: u64,
    ) -> Result<Option<PathCacheEntry>, StoreError>;

    /// Most recently written unexpired path row pointing at `node_id`.
    fn find_path_for_node(
        &self,
        root_id: u64,
        language_id: u64,
        node_id: u64,
        now: u64,
    ) -> Result<Option<PathCacheEntry>, StoreError>;

    fn insert_path(&self, entry: PathCacheEntry) -> Result<(), StoreError>;

    /// Every row stored for (root, URL), oldest first.
    fn find_urls(&self, root_id: u64, speaking_url: &str) -> Result<Vec<UrlCacheEntry>, StoreError>;

    fn insert_url(&self, entry: UrlCacheEntry) -> Result<(), StoreError>;
}
