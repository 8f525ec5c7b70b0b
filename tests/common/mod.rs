//! Shared fixtures for the integration tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use speaking_url::cache::MemoryCacheStore;
use speaking_url::config::DecoderConfig;
use speaking_url::lifecycle::Shutdown;
use speaking_url::tree::{ContentTree, InMemoryTree, PageRecord, PageType, TreeError, VisibilityFilter};
use speaking_url::DecoderServer;

/// Site used across tests (root page 1):
///
/// ```text
/// 1
/// ├── 10 News
/// │   └── 11 2015
/// │       └── 12 Article
/// ├── 20 About Us
/// └── 30 Hidden Page (hidden)
/// ```
pub fn site_tree() -> InMemoryTree {
    let mut hidden = PageRecord::new(30, 1, "Hidden Page");
    hidden.hidden = true;
    InMemoryTree::from_pages([
        PageRecord::new(10, 1, "News"),
        PageRecord::new(11, 10, "2015"),
        PageRecord::new(12, 11, "Article"),
        PageRecord::new(20, 1, "About Us"),
        hidden,
    ])
}

/// Content tree wrapper counting child lookups.
#[derive(Clone)]
pub struct CountingTree {
    inner: InMemoryTree,
    lookups: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl CountingTree {
    pub fn new(inner: InMemoryTree) -> Self {
        Self {
            inner,
            lookups: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.lookups.store(0, Ordering::SeqCst);
    }
}

impl ContentTree for CountingTree {
    fn children_of(
        &self,
        parent_id: u64,
        allowed: &[PageType],
        filter: &VisibilityFilter,
    ) -> Result<Vec<PageRecord>, TreeError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.children_of(parent_id, allowed, filter)
    }
}

/// Running server plus the handles a test needs.
#[allow(dead_code)]
pub struct TestServer {
    pub addr: SocketAddr,
    pub store: MemoryCacheStore,
    pub shutdown: Shutdown,
    pub config_updates: mpsc::UnboundedSender<DecoderConfig>,
}

/// Start a server on an ephemeral port.
#[allow(dead_code)]
pub async fn start_server(config: DecoderConfig) -> TestServer {
    let store = MemoryCacheStore::new(None);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (config_updates, rx) = mpsc::unbounded_channel();
    let server = DecoderServer::new(config, Arc::new(site_tree()), store.clone());
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, rx, server_shutdown).await;
    });

    TestServer {
        addr,
        store,
        shutdown,
        config_updates,
    }
}

/// HTTP client that reports redirects instead of following them.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}
