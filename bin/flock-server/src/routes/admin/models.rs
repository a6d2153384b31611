//! Local model catalog and serve-lifecycle routes.
//!
//! Serving follows the swarm caller contract: claim the model's code before
//! starting, renew at half the TTL while serving, release on stop.  A lost
//! lease stops local serving instead of fighting the new owner.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use flock_swarm::ModelStore;
use flock_swarm::identity::{model_code, peer_id};
use flock_types::{ClaimRequest, ModelAdvertisement, ModelStatus};
use tracing::{debug, info, warn};
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::schemas::admin::models::{ModelItemResponse, ServeModelResponse, UpsertModelRequest};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(list_models, upsert_model, serve_model, stop_model),
    components(schemas(UpsertModelRequest, ModelItemResponse, ServeModelResponse))
)]
pub struct ModelsApi;

/// Register model catalog routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/models", get(list_models).post(upsert_model))
        .route("/models/{id}/serve", post(serve_model))
        .route("/models/{id}/stop", post(stop_model))
}

/// List the local catalog with computed swarm codes (`GET /admin/models`).
#[utoipa::path(
    get,
    path = "/admin/models",
    tag = "admin::models",
    responses(
        (status = 200, description = "Local catalog", body = [ModelItemResponse]),
        (status = 401, description = "Unauthorised (admin token required)"),
    )
)]
pub async fn list_models(State(state): State<Arc<AppState>>) -> Json<Vec<ModelItemResponse>> {
    let mut items = Vec::new();
    for model in state.store.all_models().await {
        let serving = state.store.is_serving(&model.model_id).await;
        items.push(ModelItemResponse {
            code: model_code(&model),
            serving,
            model,
        });
    }
    Json(items)
}

/// Add or replace a catalog entry (`POST /admin/models`).
#[utoipa::path(
    post,
    path = "/admin/models",
    tag = "admin::models",
    request_body = UpsertModelRequest,
    responses(
        (status = 200, description = "Entry stored", body = ModelItemResponse),
        (status = 400, description = "Missing model id or name"),
        (status = 401, description = "Unauthorised (admin token required)"),
    )
)]
pub async fn upsert_model(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpsertModelRequest>,
) -> Result<Json<ModelItemResponse>, ServerError> {
    if req.model_id.is_empty() || req.name.is_empty() {
        return Err(ServerError::BadRequest(
            "modelId and name must not be empty".into(),
        ));
    }

    let ad = ModelAdvertisement {
        model_id: req.model_id,
        name: req.name,
        info_hash: req.info_hash,
        repo_id: req.repo_id,
        file_name: req.file_name,
        status: ModelStatus::Ready,
        capabilities: vec![],
        seeders: req.seeders,
        peers: req.peers,
        uploaded_bytes: 0,
        downloaded_bytes: 0,
        serve_host: None,
        serve_port: None,
    };
    let code = model_code(&ad);
    state.store.upsert(ad.clone()).await;

    // Advertise the catalog change right away instead of waiting for the
    // next heartbeat.
    state.beacon.register_self(&state.config.public_url).await;

    Ok(Json(ModelItemResponse {
        code,
        serving: false,
        model: ad,
    }))
}

/// Start serving a model (`POST /admin/models/{id}/serve`).
///
/// Claims the model's code first; a denial means another peer is already
/// serving it and this node must route there instead (`409`).
#[utoipa::path(
    post,
    path = "/admin/models/{id}/serve",
    tag = "admin::models",
    params(("id" = String, Path, description = "Catalog model id")),
    responses(
        (status = 200, description = "Serving started", body = ServeModelResponse),
        (status = 404, description = "Unknown model"),
        (status = 409, description = "Another peer holds the serve claim"),
        (status = 502, description = "Registry unreachable"),
    )
)]
pub async fn serve_model(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ServeModelResponse>, ServerError> {
    let ad = state
        .store
        .model_by_id(&id)
        .await
        .ok_or_else(|| ServerError::NotFound(format!("unknown model: {id}")))?;
    let code = model_code(&ad);
    let self_peer = peer_id(&state.config.public_url);

    let claim = ClaimRequest {
        code: code.clone(),
        peer_id: self_peer,
        ttl_ms: state.config.lease_ttl_ms,
    };
    let resp = state
        .transport
        .claim(&state.config.registry_url, &claim)
        .await?;
    if !resp.granted {
        return Err(ServerError::ClaimDenied {
            owner: resp.owner.unwrap_or_else(|| "unknown peer".into()),
        });
    }

    state.store.set_serving(&id, None, None).await;
    spawn_renewal(state.clone(), id.clone(), claim);

    // Advertise the change right away instead of waiting for the heartbeat.
    state.beacon.register_self(&state.config.public_url).await;

    info!(model = %id, code = %code, "model serving started");
    Ok(Json(ServeModelResponse {
        model_id: id,
        code,
        serving: true,
    }))
}

/// Stop serving a model (`POST /admin/models/{id}/stop`).
#[utoipa::path(
    post,
    path = "/admin/models/{id}/stop",
    tag = "admin::models",
    params(("id" = String, Path, description = "Catalog model id")),
    responses(
        (status = 200, description = "Serving stopped", body = ServeModelResponse),
        (status = 404, description = "Unknown model"),
    )
)]
pub async fn stop_model(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ServeModelResponse>, ServerError> {
    let ad = state
        .store
        .model_by_id(&id)
        .await
        .ok_or_else(|| ServerError::NotFound(format!("unknown model: {id}")))?;
    let code = model_code(&ad);
    let self_peer = peer_id(&state.config.public_url);

    state.renewals.cancel(&id);

    // Best-effort: an unreachable registry just means the claim lapses at
    // its TTL.
    if let Err(e) = state
        .transport
        .release(&state.config.registry_url, &code, &self_peer)
        .await
    {
        debug!(model = %id, error = %e, "claim release failed; lease will lapse at TTL");
    }

    state.store.clear_serving(&id).await;
    state.beacon.register_self(&state.config.public_url).await;

    info!(model = %id, code = %code, "model serving stopped");
    Ok(Json(ServeModelResponse {
        model_id: id,
        code,
        serving: false,
    }))
}

/// Renew the serve claim at half the TTL for as long as we keep it.
///
/// Renewal failures are swallowed (the lease survives until its TTL); a
/// clean denial means another peer took over, so local serving stops.
fn spawn_renewal(state: Arc<AppState>, model_id: String, claim: ClaimRequest) {
    let renew_every = Duration::from_millis((state.config.lease_ttl_ms / 2).max(1_000));

    let handle = tokio::spawn({
        let state = Arc::clone(&state);
        let model_id = model_id.clone();
        async move {
            let mut ticker = tokio::time::interval(renew_every);
            // Skip the immediate tick; the claim was just granted.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match state
                    .transport
                    .claim(&state.config.registry_url, &claim)
                    .await
                {
                    Ok(resp) if resp.granted => {}
                    Ok(resp) => {
                        warn!(
                            model = %model_id,
                            owner = ?resp.owner,
                            "serve claim lost; stopping local serving"
                        );
                        state.store.clear_serving(&model_id).await;
                        state.renewals.remove(&model_id);
                        state.beacon.register_self(&state.config.public_url).await;
                        break;
                    }
                    Err(e) => {
                        debug!(
                            model = %model_id,
                            error = %e,
                            "claim renewal failed; retrying next tick"
                        );
                    }
                }
            }
        }
    });

    state.renewals.insert(model_id, handle.abort_handle());
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use crate::testutil::harness;

    fn upsert_request(id: &str) -> UpsertModelRequest {
        UpsertModelRequest {
            model_id: id.into(),
            name: "tiny".into(),
            info_hash: Some("c17a9f2ab44e".into()),
            repo_id: None,
            file_name: None,
            seeders: 0,
            peers: 0,
        }
    }

    #[tokio::test]
    async fn upsert_then_list_shows_the_code() {
        let h = harness();
        upsert_model(State(h.state.clone()), Json(upsert_request("m1")))
            .await
            .unwrap();

        let Json(items) = list_models(State(h.state)).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].code, "c17a9f2");
        assert!(!items[0].serving);
    }

    #[tokio::test]
    async fn upsert_rejects_empty_ids() {
        let h = harness();
        let mut req = upsert_request("m1");
        req.model_id = String::new();
        let err = upsert_model(State(h.state), Json(req)).await.unwrap_err();
        assert!(matches!(err, ServerError::BadRequest(_)));
    }

    #[tokio::test]
    async fn serve_claims_then_marks_serving() {
        let h = harness();
        upsert_model(State(h.state.clone()), Json(upsert_request("m1")))
            .await
            .unwrap();

        let Json(resp) = serve_model(State(h.state.clone()), Path("m1".into()))
            .await
            .unwrap();
        assert!(resp.serving);
        assert_eq!(resp.code, "c17a9f2");
        assert!(h.state.store.is_serving("m1").await);
        // A renewal task is running and can be cancelled.
        assert!(h.state.renewals.cancel("m1"));
    }

    #[tokio::test]
    async fn serve_denied_keeps_the_model_idle() {
        let h = harness();
        upsert_model(State(h.state.clone()), Json(upsert_request("m1")))
            .await
            .unwrap();
        *h.transport.deny_claims_with.lock().unwrap() = Some("peer-other".into());

        let err = serve_model(State(h.state.clone()), Path("m1".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::ClaimDenied { .. }));
        assert!(!h.state.store.is_serving("m1").await);
        assert!(!h.state.renewals.cancel("m1"));
    }

    #[tokio::test]
    async fn serve_unknown_model_is_404() {
        let h = harness();
        let err = serve_model(State(h.state), Path("ghost".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::NotFound(_)));
    }

    #[tokio::test]
    async fn stop_releases_the_claim_and_clears_state() {
        let h = harness();
        upsert_model(State(h.state.clone()), Json(upsert_request("m1")))
            .await
            .unwrap();
        serve_model(State(h.state.clone()), Path("m1".into()))
            .await
            .unwrap();

        let Json(resp) = stop_model(State(h.state.clone()), Path("m1".into()))
            .await
            .unwrap();
        assert!(!resp.serving);
        assert!(!h.state.store.is_serving("m1").await);

        let released = h.transport.released.lock().unwrap().clone();
        assert_eq!(released.len(), 1);
        assert_eq!(released[0].0, "c17a9f2");
    }
}
