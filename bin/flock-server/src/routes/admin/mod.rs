pub mod models;

use crate::middleware::auth;
use crate::state::AppState;

use axum::{Router, middleware};
use std::sync::Arc;
use utoipa::OpenApi;

// Routes nested under `/admin` (model catalog, serve lifecycle).
pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .merge(models::router())
        .route_layer(middleware::from_fn(auth::check_admin_auth))
        .with_state(state.clone())
}

#[derive(OpenApi)]
#[openapi()]
pub struct AdminApi;

pub fn api_docs() -> utoipa::openapi::OpenApi {
    let mut spec = AdminApi::openapi();
    spec.merge(models::ModelsApi::openapi());
    spec
}
