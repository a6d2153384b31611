//! Request / response types for the local model catalog (`/admin/models`).

use flock_types::ModelAdvertisement;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for `POST /admin/models`: add or replace a catalog entry.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpsertModelRequest {
    pub model_id: String,
    pub name: String,
    /// Torrent info-hash of the weights file, when known.
    pub info_hash: Option<String>,
    pub repo_id: Option<String>,
    pub file_name: Option<String>,
    #[serde(default)]
    pub seeders: u32,
    #[serde(default)]
    pub peers: u32,
}

/// One catalog entry with its computed swarm code and live serve flag.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModelItemResponse {
    pub code: String,
    pub serving: bool,
    pub model: ModelAdvertisement,
}

/// Response body for the serve / stop endpoints.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServeModelResponse {
    pub model_id: String,
    pub code: String,
    pub serving: bool,
}
