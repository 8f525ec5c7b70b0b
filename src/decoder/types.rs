//! Decode results and terminal outcomes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::StoreError;
use crate::tree::TreeError;

/// Insertion-ordered nested parameters: scalars are JSON strings, nested
/// maps are JSON objects.
pub type Parameters = serde_json::Map<String, serde_json::Value>;

/// A resource id plus the parameters decoded from the path.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DecodedResult {
    /// Resolved page; 0 means unresolved.
    pub id: u64,
    #[serde(default)]
    pub parameters: Parameters,
}

impl DecodedResult {
    pub fn is_resolved(&self) -> bool {
        self.id != 0
    }
}

/// Where a resolved result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    UrlCache,
    PathResolver,
}

/// Terminal state of one decode.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeOutcome {
    /// Direct script invocation or empty path; nothing was touched.
    NotSpeakingUrl,
    /// A trailing slash was appended and the configuration asks for a redirect.
    Redirected { target: String, code: u16 },
    /// The request context now carries the resource id and parameters.
    Resolved {
        resource_id: u64,
        parameters: Parameters,
        source: ResolutionSource,
    },
    /// The path could not be decoded.
    NotFound { reason: String },
}

impl DecodeOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            DecodeOutcome::NotSpeakingUrl => "not_speaking_url",
            DecodeOutcome::Redirected { .. } => "redirected",
            DecodeOutcome::Resolved { source: ResolutionSource::UrlCache, .. } => "url_cache_hit",
            DecodeOutcome::Resolved { .. } => "found",
            DecodeOutcome::NotFound { .. } => "not_found",
        }
    }
}

/// Infrastructure failures; everything else is a [`DecodeOutcome`].
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Result type for decoder operations.
pub type DecodeResult<T> = Result<T, DecodeError>;
