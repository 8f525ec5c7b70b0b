use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::atomic::Ordering;

use crate::http::server::AppState;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub root_page_id: u64,
    pub parameter_sets: Vec<String>,
    pub total_requests: usize,
}

#[derive(Serialize)]
pub struct CacheSummary {
    pub path_rows: usize,
    pub url_rows: usize,
    pub persistence_path: Option<String>,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let inner = state.inner.load();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        root_page_id: inner.config.path_cache.root_page_id,
        parameter_sets: inner.config.parameter_sets.keys().cloned().collect(),
        total_requests: state.request_count.load(Ordering::Relaxed),
    })
}

pub async fn get_cache(State(state): State<AppState>) -> Json<CacheSummary> {
    let inner = state.inner.load();
    Json(CacheSummary {
        path_rows: state.store.path_rows(),
        url_rows: state.store.url_rows(),
        persistence_path: inner.config.cache.persistence_path.clone(),
    })
}
