//! Speaking URL decoding.
//!
//! # Data Flow
//! ```text
//! RequestContext
//!     → orchestrator.rs (script check, hooks, outcome selection)
//!     → slash.rs (trailing slash / redirect decision)
//!     → cache::UrlCache (exact URL hit ends here)
//!     → resolver.rs (cached prefix + tree walk)
//!     → params.rs (parameter sets in the unresolved tail)
//!     → query.rs (query string for the application)
//! ```

pub mod context;
pub mod orchestrator;
pub mod params;
pub mod query;
pub mod resolver;
pub mod slash;
pub mod types;

pub use context::RequestContext;
pub use orchestrator::{PathHook, UrlDecoder};
pub use params::{ParameterDecoder, ParameterSets};
pub use resolver::{PathResolver, Resolution};
pub use slash::{SlashNormalizer, SlashOptions};
pub use types::{DecodeError, DecodeOutcome, DecodeResult, DecodedResult, Parameters, ResolutionSource};
