//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the decode and admin handlers
//! - Wire up middleware (request ID, tracing, timeout)
//! - Bind server to listener
//! - Swap in a rebuilt decoder when the configuration changes
//! - Stop accepting on shutdown

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::get,
    Router,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::setup_admin_router;
use crate::cache::MemoryCacheStore;
use crate::config::DecoderConfig;
use crate::decoder::{RequestContext, UrlDecoder};
use crate::http::request::{request_id_of, MakeRequestUuid};
use crate::http::response::{error_response, outcome_response};
use crate::tree::ContentTree;

/// Everything that is rebuilt on a configuration change.
pub struct InnerState {
    pub config: DecoderConfig,
    pub decoder: UrlDecoder,
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<ArcSwap<InnerState>>,
    pub tree: Arc<dyn ContentTree>,
    pub store: MemoryCacheStore,
    pub request_count: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(config: DecoderConfig, tree: Arc<dyn ContentTree>, store: MemoryCacheStore) -> Self {
        let inner = build_inner(config, tree.clone(), &store);
        Self {
            inner: Arc::new(ArcSwap::from_pointee(inner)),
            tree,
            store,
            request_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Rebuild the decoder for `config`; caches and tree are shared.
    pub fn reload(&self, config: DecoderConfig) {
        let inner = build_inner(config, self.tree.clone(), &self.store);
        self.inner.store(Arc::new(inner));
    }
}

fn build_inner(config: DecoderConfig, tree: Arc<dyn ContentTree>, store: &MemoryCacheStore) -> InnerState {
    let decoder = UrlDecoder::new(&config, tree, Arc::new(store.clone()));
    InnerState { config, decoder }
}

/// HTTP front for the speaking URL decoder.
pub struct DecoderServer {
    router: Router,
    state: AppState,
}

impl DecoderServer {
    /// Create a new server with the given configuration.
    pub fn new(config: DecoderConfig, tree: Arc<dyn ContentTree>, store: MemoryCacheStore) -> Self {
        let router_config = config.clone();
        let state = AppState::new(config, tree, store);
        let router = Self::build_router(&router_config, state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &DecoderConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route("/", get(decode_handler))
            .route("/{*path}", get(decode_handler))
            .with_state(state.clone());

        if config.admin.enabled {
            router = router.merge(setup_admin_router(state));
        }

        router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
        )
    }

    /// Shared state, for callers that outlive the server (cache persistence).
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Run the server until a shutdown signal arrives.
    ///
    /// Configuration updates rebuild the decoder; listener, timeout and admin
    /// settings only take effect on restart.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<DecoderConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let state = self.state.clone();
        tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                tracing::info!(
                    root_page_id = config.path_cache.root_page_id,
                    parameter_sets = config.parameter_sets.len(),
                    "Applying new configuration"
                );
                state.reload(config);
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Decode the request path and answer with the outcome.
async fn decode_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.request_count.fetch_add(1, Ordering::Relaxed);
    let request_id = request_id_of(&request).to_string();
    let uri = request.uri();

    let mut ctx = RequestContext::from_path_and_query(uri.path(), uri.query());
    tracing::debug!(request_id = %request_id, site_script = %ctx.site_script, "Decoding request");

    let inner = state.inner.load();
    match inner.decoder.decode(&mut ctx) {
        Ok(outcome) => outcome_response(outcome, &ctx),
        Err(e) => error_response(&request_id, &e),
    }
}
