//! Decode caches.
//!
//! # Data Flow
//! ```text
//! speaking URL
//!     → url_cache.rs (exact URL → full result; hit ends the decode)
//!     → path_cache.rs (longest cached prefix → node id)
//!     → store.rs (CacheStore rows, shared by both tiers)
//!     → memory.rs (bundled DashMap backend, JSON persistence)
//! ```
//!
//! # Design Decisions
//! - Both tiers are append-only memoization; correctness never depends on them
//! - Read-then-insert without locks; duplicate rows are a benign race
//! - Rows are scoped by site root (and language for paths)

pub mod memory;
pub mod path_cache;
pub mod store;
pub mod url_cache;

pub use memory::MemoryCacheStore;
pub use path_cache::{PathCache, PrefixMatch};
pub use store::{CacheStore, PathCacheEntry, StoreError, UrlCacheEntry};
pub use url_cache::UrlCache;
