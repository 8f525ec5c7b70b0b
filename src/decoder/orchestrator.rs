//! Decode orchestration.
//!
//! # States
//! ```text
//! Start ──(direct script / empty path)──────────────→ NotSpeakingUrl
//!   │
//!   └→ CheckSlash ──(redirect requested, same site)─→ Redirected
//!        │
//!        └→ UrlCache ──(hit)────────────────────────→ Resolved (url_cache)
//!             │
//!             └→ FullResolve ──(all segments used)──→ Resolved (path_resolver)
//!                  │
//!                  └──(segments left over)──────────→ NotFound
//! ```
//!
//! # Design Decisions
//! - Terminal states are returned, never acted upon; the transport layer
//!   maps them to responses
//! - Only backend failures are errors; an undecodable URL is an outcome
//! - The URL cache is written after the request context has been updated,
//!   and only if no other request wrote it first

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use crate::cache::{CacheStore, PathCache, UrlCache};
use crate::config::DecoderConfig;
use crate::decoder::context::RequestContext;
use crate::decoder::params::{ParameterDecoder, ParameterSets};
use crate::decoder::query::{build_query_string, flatten, merge_recursive, sort_deep};
use crate::decoder::resolver::PathResolver;
use crate::decoder::slash::{resolve_on_site, SlashNormalizer};
use crate::decoder::types::{DecodeOutcome, DecodeResult, DecodedResult, ResolutionSource};
use crate::observability::metrics;
use crate::tree::ContentTree;

/// Pre-processing applied to the speaking URI before normalization.
pub type PathHook = Box<dyn Fn(&str) -> String + Send + Sync>;

/// Script names that mark a request as a direct invocation.
const FRONT_CONTROLLER: &str = "index.php";

/// Decodes speaking URLs into page ids and parameters.
pub struct UrlDecoder {
    normalizer: SlashNormalizer,
    url_cache: UrlCache,
    resolver: PathResolver,
    parameters: Arc<dyn ParameterDecoder>,
    hooks: Vec<PathHook>,
}

impl UrlDecoder {
    /// Build a decoder for the site described by `config`.
    pub fn new(
        config: &DecoderConfig,
        tree: Arc<dyn ContentTree>,
        store: Arc<dyn CacheStore>,
    ) -> Self {
        let root_id = config.path_cache.root_page_id;
        let path_cache = PathCache::new(store.clone(), root_id);
        Self {
            normalizer: SlashNormalizer::from_config(&config.init.append_missing_slash),
            url_cache: UrlCache::new(store, root_id),
            resolver: PathResolver::new(tree, path_cache, root_id, config.init.space_character),
            parameters: Arc::new(ParameterSets::from_config(&config.parameter_sets)),
            hooks: Vec::new(),
        }
    }

    /// Replace the configured parameter sets with another decoder.
    pub fn with_parameter_decoder(mut self, parameters: Arc<dyn ParameterDecoder>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Append a hook; hooks run in the order they were added.
    pub fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.hooks.push(Box::new(hook));
        self
    }

    /// Decode the request, updating `ctx` on success.
    pub fn decode(&self, ctx: &mut RequestContext) -> DecodeResult<DecodeOutcome> {
        let start = Instant::now();
        let outcome = self.run(ctx)?;
        metrics::record_decode(outcome.label(), start);
        tracing::debug!(
            site_script = %ctx.site_script,
            outcome = outcome.label(),
            resource_id = ctx.resource_id,
            "Decode finished"
        );
        Ok(outcome)
    }

    fn run(&self, ctx: &mut RequestContext) -> DecodeResult<DecodeOutcome> {
        let script = ctx.site_script.trim_start_matches('/');
        if !is_speaking_url(script) {
            return Ok(DecodeOutcome::NotSpeakingUrl);
        }

        let uri = self
            .hooks
            .iter()
            .fold(script.to_string(), |uri, hook| hook(&uri));

        let normalized = self.normalizer.normalize(&uri);
        ctx.appended_slash = normalized.appended_slash;
        if let Some(redirect) = normalized.redirect {
            tracing::info!(target_url = %redirect.target, code = redirect.code, "Redirecting to add trailing slash");
            return Ok(DecodeOutcome::Redirected {
                target: redirect.target,
                code: redirect.code,
            });
        }

        let speaking_uri = normalized.uri;
        if speaking_uri.is_empty() {
            return Ok(DecodeOutcome::NotSpeakingUrl);
        }
        ctx.language_id = ctx.requested_language();

        let Some(path) = url_path(&speaking_uri) else {
            return Ok(not_found("Current URL is invalid"));
        };

        if let Some(cached) = self.url_cache.lookup(&speaking_uri)? {
            self.apply(ctx, &cached);
            return Ok(DecodeOutcome::Resolved {
                resource_id: cached.id,
                parameters: cached.parameters,
                source: ResolutionSource::UrlCache,
            });
        }

        let result = match self.resolve(ctx.language_id, &path)? {
            Ok(result) => result,
            Err(segment) => {
                return Ok(not_found(&format!("\"{segment}\" could not be decoded from path.")));
            }
        };

        self.apply(ctx, &result);
        let original_query = canonical_query(ctx, result.id);
        self.url_cache.store(&speaking_uri, &original_query, &result)?;

        Ok(DecodeOutcome::Resolved {
            resource_id: result.id,
            parameters: result.parameters,
            source: ResolutionSource::PathResolver,
        })
    }

    /// Resolve the path; `Err` carries the first segment nothing claimed.
    fn resolve(&self, language_id: u64, path: &str) -> DecodeResult<Result<DecodedResult, String>> {
        let segments = split_segments(path);
        let resolution = self
            .resolver
            .decode_path(language_id, &segments, self.parameters.as_ref())?;

        let mut remaining: VecDeque<String> = resolution.remaining;
        let parameters = self.parameters.decode(&mut remaining);
        if let Some(segment) = remaining.pop_front() {
            return Ok(Err(segment));
        }

        Ok(Ok(DecodedResult {
            id: resolution.node_id,
            parameters,
        }))
    }

    /// Write a resolved result into the request context.
    fn apply(&self, ctx: &mut RequestContext, result: &DecodedResult) {
        if !result.is_resolved() {
            return;
        }
        ctx.decoded_query_string = build_query_string(&result.parameters, &ctx.query_string);

        let mut merged = ctx.get_vars.clone();
        merge_recursive(&mut merged, &result.parameters);
        ctx.merged_parameters = merged;
        ctx.resource_id = result.id;
    }
}

fn not_found(reason: &str) -> DecodeOutcome {
    tracing::info!(reason = %reason, "Speaking URL not found");
    DecodeOutcome::NotFound {
        reason: reason.to_string(),
    }
}

/// Direct script calls and bare query strings are not speaking URLs.
fn is_speaking_url(script: &str) -> bool {
    !script.is_empty() && !script.starts_with(FRONT_CONTROLLER) && !script.starts_with('?')
}

/// Path component of a speaking URI, or `None` if the URI does not parse.
///
/// Scheme, host, query and fragment of absolute or scheme-relative URIs
/// never become segments.
fn url_path(uri: &str) -> Option<String> {
    resolve_on_site(uri).map(|url| url.path().to_string())
}

/// Path segments without empty leading or trailing entries.
fn split_segments(path: &str) -> Vec<String> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Vec::new();
    }
    trimmed.split('/').map(String::from).collect()
}

/// Sorted, flattened request parameters plus the page id.
fn canonical_query(ctx: &RequestContext, id: u64) -> String {
    let mut vars = ctx.merged_parameters.clone();
    vars.insert("id".to_string(), serde_json::Value::String(id.to_string()));
    flatten(&sort_deep(&vars)).join("&")
}
