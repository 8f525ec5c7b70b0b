//! HTTP front of the decoder.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, decoder swap on reload)
//!     → request.rs (request ID)
//!     → decoder::UrlDecoder (outcome)
//!     → response.rs (status, Location, JSON body)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::{AppState, DecoderServer};
