//! Relay routes: this node as a serving target.
//!
//! `/swarm/relay/chat` and `/swarm/relay/next-token` execute on the local
//! inference engine, gated on the model being actively served here.
//! `/swarm/relay/compose` fans out to the serving peers of a code and
//! returns the first usable answer.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use flock_swarm::{ChatOptions, ModelStore, SwarmError};
use flock_types::{
    ChatMessage, ModelStatus, RelayChatRequest, RelayChatResponse, RelayComposeRequest,
    RelayComposeResponse, RelayNextTokenRequest, RelayNextTokenResponse,
};
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, info};
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::state::AppState;

/// Peers contacted concurrently by one compose call.
const COMPOSE_FANOUT: usize = 3;

#[derive(OpenApi)]
#[openapi(
    paths(relay_chat, relay_next_token, relay_compose),
    components(schemas(
        RelayChatRequest,
        RelayChatResponse,
        RelayNextTokenRequest,
        RelayNextTokenResponse,
        RelayComposeRequest,
        RelayComposeResponse
    ))
)]
pub struct RelayApi;

/// Register relay routes (nested under `/swarm/relay`).
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/chat", post(relay_chat))
        .route("/next-token", post(relay_next_token))
        .route("/compose", post(relay_compose))
}

/// Serve a chat request on this node (`POST /swarm/relay/chat`).
///
/// Answers `409` when the model is not actively served here; the remote
/// router treats that as a candidate failure and moves on.
#[utoipa::path(
    post,
    path = "/swarm/relay/chat",
    tag = "relay",
    request_body = RelayChatRequest,
    responses(
        (status = 200, description = "Completion generated", body = RelayChatResponse),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Model not actively served here"),
        (status = 500, description = "Inference failure"),
    )
)]
pub async fn relay_chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RelayChatRequest>,
) -> Result<Json<RelayChatResponse>, ServerError> {
    if req.messages.is_empty() {
        return Err(ServerError::BadRequest("messages must not be empty".into()));
    }
    ensure_serving(&state, &req.model_id).await?;

    let opts = ChatOptions {
        max_tokens: req.max_tokens,
        temperature: req.temperature,
    };
    match state.engine.chat(&req.model_id, &req.messages, opts).await {
        Ok(content) => {
            state.store.record_serve_outcome(&req.model_id, true).await;
            info!(model = %req.model_id, output_len = content.len(), "relay chat served");
            Ok(Json(RelayChatResponse { content }))
        }
        Err(e) => {
            state.store.record_serve_outcome(&req.model_id, false).await;
            Err(ServerError::Swarm(SwarmError::Engine(e)))
        }
    }
}

/// Generate a single token on this node (`POST /swarm/relay/next-token`).
#[utoipa::path(
    post,
    path = "/swarm/relay/next-token",
    tag = "relay",
    request_body = RelayNextTokenRequest,
    responses(
        (status = 200, description = "Token generated", body = RelayNextTokenResponse),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Model not actively served here"),
        (status = 500, description = "Inference failure"),
    )
)]
pub async fn relay_next_token(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RelayNextTokenRequest>,
) -> Result<Json<RelayNextTokenResponse>, ServerError> {
    if req.prompt.is_empty() {
        return Err(ServerError::BadRequest("prompt must not be empty".into()));
    }
    ensure_serving(&state, &req.model_id).await?;

    match state
        .engine
        .next_token(&req.model_id, &req.prompt, req.temperature)
        .await
    {
        Ok(token) => {
            state.store.record_serve_outcome(&req.model_id, true).await;
            Ok(Json(RelayNextTokenResponse { token }))
        }
        Err(e) => {
            state.store.record_serve_outcome(&req.model_id, false).await;
            Err(ServerError::Swarm(SwarmError::Engine(e)))
        }
    }
}

/// Compose an answer across the serving peers of a code
/// (`POST /swarm/relay/compose`).
///
/// Best-effort "first complete response wins": relay-chat calls fan out to
/// up to [`COMPOSE_FANOUT`] serving peers and the first non-empty answer is
/// returned.  No merging or voting.
#[utoipa::path(
    post,
    path = "/swarm/relay/compose",
    tag = "relay",
    request_body = RelayComposeRequest,
    responses(
        (status = 200, description = "Composed answer", body = RelayComposeResponse),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "No serving peers for the code"),
        (status = 500, description = "Every fanned-out candidate failed"),
    )
)]
pub async fn relay_compose(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RelayComposeRequest>,
) -> Result<Json<RelayComposeResponse>, ServerError> {
    if req.code.is_empty() {
        return Err(ServerError::BadRequest("code must not be empty".into()));
    }
    if req.prompt.is_empty() {
        return Err(ServerError::BadRequest("prompt must not be empty".into()));
    }

    // Serving peers of the code, excluding ourselves to avoid a relay loop.
    let targets: Vec<(String, String)> = state
        .registry
        .aggregate()
        .into_iter()
        .filter(|entry| entry.code == req.code)
        .flat_map(|entry| entry.examples)
        .filter(|example| {
            example.status == ModelStatus::Serving
                && !flock_swarm::identity::same_peer(&example.public_url, &state.config.public_url)
        })
        .map(|example| (example.public_url, example.model_id))
        .take(COMPOSE_FANOUT)
        .collect();

    if targets.is_empty() {
        return Err(ServerError::NotFound(format!(
            "no serving peers for code {}",
            req.code
        )));
    }

    let mut in_flight: FuturesUnordered<_> = targets
        .into_iter()
        .map(|(peer_url, model_id)| {
            let transport = Arc::clone(&state.transport);
            let relay = RelayChatRequest {
                model_id,
                messages: vec![ChatMessage {
                    role: "user".into(),
                    content: req.prompt.clone(),
                }],
                max_tokens: req.max_tokens,
                temperature: req.temperature,
            };
            async move {
                let result = transport.relay_chat(&peer_url, &relay).await;
                (peer_url, result)
            }
        })
        .collect();

    while let Some((peer_url, result)) = in_flight.next().await {
        match result {
            Ok(resp) if !resp.content.trim().is_empty() => {
                info!(code = %req.code, peer = %peer_url, "compose answered");
                return Ok(Json(RelayComposeResponse { text: resp.content }));
            }
            Ok(_) => debug!(peer = %peer_url, "compose candidate answered empty"),
            Err(e) => debug!(peer = %peer_url, error = %e, "compose candidate failed"),
        }
    }

    Err(ServerError::Internal(
        "every compose candidate failed".into(),
    ))
}

async fn ensure_serving(state: &AppState, model_id: &str) -> Result<(), ServerError> {
    if state.store.model_by_id(model_id).await.is_none() {
        return Err(ServerError::NotFound(format!("unknown model: {model_id}")));
    }
    if !state.store.is_serving(model_id).await {
        return Err(ServerError::Swarm(SwarmError::NotServing(
            model_id.to_owned(),
        )));
    }
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
