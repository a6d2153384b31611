//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors are automatically converted
//! to a JSON-body HTTP response with an appropriate status code.
//!
//! **Security note:** internal errors are logged with full detail but only a
//! generic message is returned to the caller, so upstream URLs and engine
//! internals never leak to clients.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use flock_swarm::SwarmError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// All errors that can occur in the flock-server request lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Propagated from the swarm core (routing, transport, engine).
    #[error("swarm error: {0}")]
    Swarm(#[from] SwarmError),

    /// The caller referenced a resource that does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller sent an invalid or malformed request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A serve claim for the code is held by another peer.
    #[error("serve claim denied: code is held by {owner}")]
    ClaimDenied { owner: String },

    /// An unclassified internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, client_message) = match &self {
            // Client-facing errors: expose the message directly.
            ServerError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            ServerError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ServerError::ClaimDenied { owner } => (
                StatusCode::CONFLICT,
                format!("model code is already served by peer {owner}"),
            ),

            ServerError::Swarm(e) => match e {
                // Final, user-visible routing outcome: the caller should
                // pick or start a model.
                SwarmError::NoModelAvailable => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "no model available; pick or start a model first".to_owned(),
                ),
                SwarmError::NotServing(model) => (
                    StatusCode::CONFLICT,
                    format!("model {model} is not actively served on this node"),
                ),
                // Internal errors: log the full detail, keep the response
                // generic.
                SwarmError::Http(_) | SwarmError::Protocol { .. } => {
                    error!(error = %e, "upstream peer error");
                    (StatusCode::BAD_GATEWAY, "upstream peer error".to_owned())
                }
                SwarmError::Engine(_) => {
                    error!(error = %e, "inference engine error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "inference backend error".to_owned(),
                    )
                }
            },

            ServerError::Internal(m) => {
                error!(message = %m, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_owned(),
                )
            }
        };
        (status, Json(json!({ "error": client_message }))).into_response()
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(e: anyhow::Error) -> Self {
        // Preserve the full chain in the logs before discarding it.
        error!(error = ?e, "converting anyhow error to ServerError::Internal");
        ServerError::Internal(e.to_string())
    }
}
