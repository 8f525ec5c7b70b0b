//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the decoder
//! service. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root configuration for the speaking URL decoder.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DecoderConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Request pre-processing options (slash handling, title normalization).
    pub init: InitConfig,

    /// Path cache scoping.
    pub path_cache: PathCacheConfig,

    /// Declared parameter sets, keyed by the reserved path segment that
    /// introduces them.
    pub parameter_sets: BTreeMap<String, ParameterSetConfig>,

    /// Content tree source.
    pub content: ContentConfig,

    /// Cache store settings.
    pub cache: CacheConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Options applied to the raw speaking URL before decoding.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InitConfig {
    /// Comma-separated trailing slash options: `ifNotFile`, `redirect`,
    /// `redirect[301|302|303|307]`. Empty means "always append silently".
    pub append_missing_slash: String,

    /// Character replacing whitespace when page titles are turned into
    /// path segments.
    pub space_character: char,
}

impl Default for InitConfig {
    fn default() -> Self {
        Self {
            append_missing_slash: String::new(),
            space_character: '-',
        }
    }
}

/// Path cache scoping.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathCacheConfig {
    /// Root page of the site; tree walks start here and cache rows are
    /// scoped to it.
    pub root_page_id: u64,
}

impl Default for PathCacheConfig {
    fn default() -> Self {
        Self { root_page_id: 1 }
    }
}

/// A named parameter set embedded in the path.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ParameterSetConfig {
    /// Query variable names filled positionally from the segments following
    /// the set name. Bracket syntax (`tx_news[news]`) nests the value.
    pub variables: Vec<String>,
}

/// Content tree source.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ContentConfig {
    /// JSON array of page records. Without it the tree is empty and only
    /// parameter sets on the root page resolve.
    pub pages_path: Option<String>,
}

/// Cache store settings.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CacheConfig {
    /// JSON file the in-memory cache store is loaded from and saved to.
    pub persistence_path: Option<String>,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin endpoints.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let config: DecoderConfig = toml::from_str("").unwrap();
        assert_eq!(config.path_cache.root_page_id, 1);
        assert_eq!(config.init.space_character, '-');
        assert!(config.parameter_sets.is_empty());
        assert!(config.content.pages_path.is_none());
    }

    #[test]
    fn test_parse_parameter_sets() {
        let raw = r#"
            [init]
            append_missing_slash = "ifNotFile, redirect[302]"

            [path_cache]
            root_page_id = 7

            [parameter_sets.article]
            variables = ["tx_news[news]"]
        "#;
        let config: DecoderConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.path_cache.root_page_id, 7);
        assert_eq!(config.init.append_missing_slash, "ifNotFile, redirect[302]");
        assert_eq!(
            config.parameter_sets["article"].variables,
            vec!["tx_news[news]".to_string()]
        );
    }
}
