//! Query types for the `/swarm` endpoints.

use serde::Deserialize;
use utoipa::IntoParams;

/// Query parameters for `DELETE /swarm/claim`.
///
/// Both parameters are required; they are optional here only so the handler
/// can answer a tidy `400` instead of axum's default rejection.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseClaimQuery {
    pub code: Option<String>,
    pub peer_id: Option<String>,
}
