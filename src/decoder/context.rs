//! Per-request state the decoder reads from and writes into.

use crate::decoder::query::parse_query;
use crate::decoder::types::Parameters;

/// Query parameter selecting the content language.
pub const LANGUAGE_KEY: &str = "L";

/// One request, as seen by the decoder.
///
/// Inputs are `site_script`, `query_string` and `get_vars`; the decoder fills
/// in the rest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestContext {
    /// Site-relative request URI, e.g. `news/article/?L=1`.
    pub site_script: String,
    /// Raw query string of the request (without `?`).
    pub query_string: String,
    /// Parsed query parameters of the request.
    pub get_vars: Parameters,

    /// Resolved page, 0 until a decode succeeds.
    pub resource_id: u64,
    /// Request parameters merged with decoded ones (decoded win).
    pub merged_parameters: Parameters,
    /// Query string the application should see after decoding.
    pub decoded_query_string: String,
    /// Language taken from the `L` parameter.
    pub language_id: u64,
    /// A trailing slash was appended during normalization.
    pub appended_slash: bool,
}

impl RequestContext {
    /// Build a context from a site-relative URI; the query part is parsed.
    pub fn new(site_script: impl Into<String>) -> Self {
        let site_script = site_script.into();
        let query_string = site_script
            .split_once('?')
            .map(|(_, q)| q.to_string())
            .unwrap_or_default();
        let get_vars = parse_query(&query_string);
        Self {
            site_script,
            query_string,
            get_vars,
            ..Self::default()
        }
    }

    /// Build a context from an HTTP path and optional query.
    pub fn from_path_and_query(path: &str, query: Option<&str>) -> Self {
        let path = path.trim_start_matches('/');
        match query {
            Some(q) => Self::new(format!("{path}?{q}")),
            None => Self::new(path),
        }
    }

    /// Language id requested through `L`; 0 if absent or not a number.
    pub fn requested_language(&self) -> u64 {
        self.get_vars
            .get(LANGUAGE_KEY)
            .and_then(|v| v.as_str())
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0)
    }
}
