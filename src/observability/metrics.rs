//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define decoder metrics (outcomes, cache efficiency, tree lookups)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `decoder_requests_total` (counter): decodes by outcome
//! - `decoder_decode_duration_seconds` (histogram): decode latency
//! - `decoder_url_cache_total` (counter): URL cache lookups by result
//! - `decoder_path_cache_total` (counter): prefix searches by result
//! - `decoder_tree_lookups_total` (counter): child lookups against the tree
//! - `decoder_cache_rows` (gauge): stored rows per cache tier
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder (tests, CLI) every call is a no-op
//! - Labels are fixed, low-cardinality strings

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_decode(outcome: &'static str, start: Instant) {
    metrics::counter!("decoder_requests_total", "outcome" => outcome).increment(1);
    metrics::histogram!("decoder_decode_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_url_cache(result: &'static str) {
    metrics::counter!("decoder_url_cache_total", "result" => result).increment(1);
}

pub fn record_path_cache(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    metrics::counter!("decoder_path_cache_total", "result" => result).increment(1);
}

pub fn record_tree_lookup() {
    metrics::counter!("decoder_tree_lookups_total").increment(1);
}

pub fn record_cache_rows(path_rows: usize, url_rows: usize) {
    metrics::gauge!("decoder_cache_rows", "tier" => "path").set(path_rows as f64);
    metrics::gauge!("decoder_cache_rows", "tier" => "url").set(url_rows as f64);
}
