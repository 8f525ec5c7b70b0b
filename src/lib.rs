//! Speaking URL decoder library.
//!
//! Maps human-readable paths such as `news/2015/article/` back to a page id
//! and query parameters, memoizing path prefixes and complete results.

pub mod admin;
pub mod cache;
pub mod config;
pub mod decoder;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod tree;

pub use config::schema::DecoderConfig;
pub use decoder::{DecodeOutcome, RequestContext, UrlDecoder};
pub use http::DecoderServer;
pub use lifecycle::Shutdown;
