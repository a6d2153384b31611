//! Swarm registry routes.
//!
//! Every node carries the registry role: peers push their catalogs to
//! `/swarm/register`, query the aggregated view from `/swarm/models`, and
//! coordinate serve ownership through `/swarm/claim`.  A standalone
//! registry is just a node pointed at itself that serves nothing.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use flock_types::{AggregatedEntry, ClaimRequest, ClaimResponse, RegisterPayload};
use serde_json::{Value, json};
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::schemas::swarm::ReleaseClaimQuery;
use crate::state::AppState;

use super::relay;

#[derive(OpenApi)]
#[openapi(
    paths(register_peer, list_models, claim_code, release_claim),
    components(schemas(RegisterPayload, ClaimRequest, ClaimResponse, AggregatedEntry))
)]
pub struct SwarmApi;

/// Register swarm routes (nested under `/swarm`).
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register_peer))
        .route("/models", get(list_models))
        .route("/claim", post(claim_code).delete(release_claim))
        .nest("/relay", relay::router())
}

/// Record a peer registration (`POST /swarm/register`).
///
/// Fire-and-forget from the peer's point of view: the row overwrites any
/// previous registration and ages out of the aggregated view on its own.
#[utoipa::path(
    post,
    path = "/swarm/register",
    tag = "swarm",
    request_body = RegisterPayload,
    responses(
        (status = 200, description = "Registration recorded"),
        (status = 400, description = "Missing peer id or public URL"),
    )
)]
pub async fn register_peer(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterPayload>,
) -> Result<Json<Value>, ServerError> {
    if payload.peer_id.is_empty() || payload.public_url.is_empty() {
        return Err(ServerError::BadRequest(
            "peerId and publicUrl must not be empty".into(),
        ));
    }
    state.registry.record(payload);
    Ok(Json(json!({})))
}

/// The aggregated, code-grouped view of all fresh peers (`GET /swarm/models`).
#[utoipa::path(
    get,
    path = "/swarm/models",
    tag = "swarm",
    responses(
        (status = 200, description = "Aggregated view", body = [AggregatedEntry]),
    )
)]
pub async fn list_models(State(state): State<Arc<AppState>>) -> Json<Vec<AggregatedEntry>> {
    Json(state.registry.aggregate())
}

/// Grant, renew, or deny a serve claim (`POST /swarm/claim`).
#[utoipa::path(
    post,
    path = "/swarm/claim",
    tag = "swarm",
    request_body = ClaimRequest,
    responses(
        (status = 200, description = "Claim outcome", body = ClaimResponse),
        (status = 400, description = "Missing code or peer id"),
    )
)]
pub async fn claim_code(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ClaimRequest>,
) -> Result<Json<ClaimResponse>, ServerError> {
    if req.code.is_empty() || req.peer_id.is_empty() {
        return Err(ServerError::BadRequest(
            "code and peerId must not be empty".into(),
        ));
    }

    let outcome = state.leases.claim(&req.code, &req.peer_id, req.ttl_ms);
    Ok(Json(ClaimResponse {
        ok: true,
        granted: outcome.granted,
        owner: outcome.owner,
    }))
}

/// Release a serve claim (`DELETE /swarm/claim?code=...&peerId=...`).
///
/// Owner-checked and idempotent: a release by a non-owner (or of a claim
/// that no longer exists) still answers `{ok: true}`.
#[utoipa::path(
    delete,
    path = "/swarm/claim",
    tag = "swarm",
    params(ReleaseClaimQuery),
    responses(
        (status = 200, description = "Released (or no-op)"),
        (status = 400, description = "Missing code or peer id"),
    )
)]
pub async fn release_claim(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReleaseClaimQuery>,
) -> Result<Json<Value>, ServerError> {
    let (Some(code), Some(peer_id)) = (query.code, query.peer_id) else {
        return Err(ServerError::BadRequest(
            "code and peerId query parameters are required".into(),
        ));
    };
    if code.is_empty() || peer_id.is_empty() {
        return Err(ServerError::BadRequest(
            "code and peerId must not be empty".into(),
        ));
    }

    state.leases.release(&code, &peer_id);
    Ok(Json(json!({ "ok": true })))
}

// ── Tests ──────────────────────────────────────────────────────────────────────
