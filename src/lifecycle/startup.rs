//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging and metrics
//! - Load the content tree and the cache store
//! - Bind the listener, serve until shutdown, persist the cache
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::cache::{MemoryCacheStore, StoreError};
use crate::config::loader::load_config;
use crate::config::watcher::ConfigWatcher;
use crate::config::{ConfigError, DecoderConfig};
use crate::http::DecoderServer;
use crate::lifecycle::signals::shutdown_on_signal;
use crate::lifecycle::Shutdown;
use crate::observability::{logging, metrics};
use crate::tree::InMemoryTree;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to load content tree from {path}: {source}")]
    Tree {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to open cache store: {0}")]
    Cache(#[from] StoreError),

    #[error("invalid metrics address: {0}")]
    MetricsAddress(String),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration from `path`, or defaults when no file is given.
pub fn load(path: Option<&Path>) -> Result<DecoderConfig, StartupError> {
    match path {
        Some(path) => Ok(load_config(path)?),
        None => Ok(DecoderConfig::default()),
    }
}

/// Content tree named by the configuration; empty if none is configured.
pub fn load_tree(config: &DecoderConfig) -> Result<InMemoryTree, StartupError> {
    let Some(pages_path) = &config.content.pages_path else {
        tracing::warn!("No content tree configured, only the root page resolves");
        return Ok(InMemoryTree::new());
    };
    let path = PathBuf::from(pages_path);
    InMemoryTree::load_from_file(&path).map_err(|source| StartupError::Tree { path, source })
}

/// Cache store, restored from its persistence file when one is configured.
pub fn open_cache(config: &DecoderConfig) -> Result<MemoryCacheStore, StartupError> {
    match &config.cache.persistence_path {
        Some(path) => Ok(MemoryCacheStore::load_from_file(path)?),
        None => Ok(MemoryCacheStore::new(None)),
    }
}

/// Run the service until SIGINT/SIGTERM.
pub async fn run(config_path: Option<&Path>) -> Result<(), StartupError> {
    let config = load(config_path)?;
    logging::init_logging(&config.observability);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        root_page_id = config.path_cache.root_page_id,
        parameter_sets = config.parameter_sets.len(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr);
    }

    let tree = load_tree(&config)?;
    let store = open_cache(&config)?;

    let (config_updates, _watcher) = match config_path {
        Some(path) => {
            let (watcher, rx) = ConfigWatcher::new(path);
            match watcher.run() {
                Ok(handle) => (rx, Some(handle)),
                Err(e) => {
                    tracing::warn!(error = %e, "Config watcher unavailable, hot reload disabled");
                    (rx, None)
                }
            }
        }
        None => (mpsc::unbounded_channel().1, None),
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    tokio::spawn(shutdown_on_signal(shutdown.clone()));

    let server = DecoderServer::new(config, Arc::new(tree), store.clone());
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    store.save_to_file()?;
    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_defaults_without_file() {
        let config = load(None).unwrap();
        assert_eq!(config.path_cache.root_page_id, 1);
    }

    #[test]
    fn test_load_tree_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"id": 2, "parent_id": 1, "page_type": "standard", "title": "News"}},
                {{"id": 3, "parent_id": 2, "page_type": "folder", "title": "Sports"}}
            ]"#
        )
        .unwrap();

        let mut config = DecoderConfig::default();
        config.content.pages_path = Some(file.path().display().to_string());
        assert_eq!(load_tree(&config).unwrap().len(), 2);
    }

    #[test]
    fn test_load_tree_missing_file_fails() {
        let mut config = DecoderConfig::default();
        config.content.pages_path = Some("/nonexistent/pages.json".to_string());
        assert!(matches!(load_tree(&config), Err(StartupError::Tree { .. })));
    }

    #[test]
    fn test_open_cache_without_persistence() {
        let store = open_cache(&DecoderConfig::default()).unwrap();
        assert_eq!(store.path_rows(), 0);
    }
}
