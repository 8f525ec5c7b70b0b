//! Decode outcome → HTTP response.
//!
//! # Responsibilities
//! - Turn each terminal decode state into a response
//! - Map backend failures to 500 without leaking details
//!
//! # Design Decisions
//! - Redirects carry the configured status and a site-relative `Location`
//! - Not-found responses carry the diagnostic as plain text
//! - Resolved requests answer with JSON for the application in front

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::decoder::{DecodeError, DecodeOutcome, Parameters, RequestContext, ResolutionSource};

/// Body of a 404 for requests that bypass decoding.
pub const NOT_SPEAKING_URL: &str = "not a speaking URL";

/// JSON body of a resolved request.
#[derive(Debug, Serialize)]
pub struct ResolvedBody {
    pub id: u64,
    pub query_string: String,
    pub parameters: Parameters,
    pub source: ResolutionSource,
}

/// Build the response for a finished decode.
pub fn outcome_response(outcome: DecodeOutcome, ctx: &RequestContext) -> Response {
    match outcome {
        DecodeOutcome::NotSpeakingUrl => (StatusCode::NOT_FOUND, NOT_SPEAKING_URL).into_response(),
        DecodeOutcome::Redirected { target, code } => {
            let status = StatusCode::from_u16(code).unwrap_or(StatusCode::MOVED_PERMANENTLY);
            (status, [(header::LOCATION, target)]).into_response()
        }
        DecodeOutcome::NotFound { reason } => (StatusCode::NOT_FOUND, reason).into_response(),
        DecodeOutcome::Resolved {
            resource_id,
            source,
            ..
        } => Json(ResolvedBody {
            id: resource_id,
            query_string: ctx.decoded_query_string.clone(),
            parameters: ctx.merged_parameters.clone(),
            source,
        })
        .into_response(),
    }
}

/// Response for an infrastructure failure during decoding.
pub fn error_response(request_id: &str, error: &DecodeError) -> Response {
    tracing::error!(request_id = %request_id, error = %error, "Decode failed");
    (StatusCode::INTERNAL_SERVER_ERROR, "Decode failed").into_response()
}
