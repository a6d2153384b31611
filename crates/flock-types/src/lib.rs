//! Shared wire and data-model types for the flock swarm.
//!
//! The structures here describe the JSON bodies exchanged between peers on
//! the `/swarm/*` endpoints.  Field names are serialized in camelCase to
//! stay byte-compatible with existing swarm deployments, so peers written
//! against older node versions interoperate without translation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

// ── Model catalog ─────────────────────────────────────────────────────────────

/// Lifecycle state of a model on one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ModelStatus {
    Downloading,
    Paused,
    Ready,
    Serving,
    Error,
}

/// What a node can do with a model it advertises.
///
/// A model carries capabilities only while its serve status is live; a model
/// that is merely on disk advertises an empty capability set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Capability {
    Chat,
    NextToken,
}

/// One model as advertised by one peer in its registration payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModelAdvertisement {
    /// Node-local model identifier.
    pub model_id: String,
    /// Human-readable model name.
    pub name: String,
    /// Torrent info-hash of the weights file, when known.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub info_hash: Option<String>,
    /// Source repository id (e.g. a HuggingFace repo), when known.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub repo_id: Option<String>,
    /// Weights file name inside the repository.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub file_name: Option<String>,
    pub status: ModelStatus,
    /// Empty unless the model is actively served right now.
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    #[serde(default)]
    pub seeders: u32,
    #[serde(default)]
    pub peers: u32,
    #[serde(default)]
    pub uploaded_bytes: u64,
    #[serde(default)]
    pub downloaded_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub serve_host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub serve_port: Option<u16>,
}

/// Live serve-state record the local model store keeps per model.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServeStatus {
    pub serving: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub port: Option<u16>,
    /// Completed requests served by this model locally.
    #[serde(default)]
    pub requests: u64,
    /// Failed local completions.
    #[serde(default)]
    pub errors: u64,
}

// ── Registration ──────────────────────────────────────────────────────────────

/// Body of `POST /swarm/register`: one node's full catalog snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayload {
    pub peer_id: String,
    pub public_url: String,
    pub version: String,
    pub models: Vec<ModelAdvertisement>,
}

// ── Serve claims ──────────────────────────────────────────────────────────────

/// A time-bounded, renewable ownership record for one model code.
///
/// At most one unexpired claim exists per code; an expired record is treated
/// as absent on the next read rather than being swept.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServeClaim {
    pub code: String,
    pub owner_peer_id: String,
    pub expires_at: DateTime<Utc>,
}

/// Body of `POST /swarm/claim`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRequest {
    pub code: String,
    pub peer_id: String,
    pub ttl_ms: u64,
}

/// Response of `POST /swarm/claim`.
///
/// `granted: false` is a normal control-flow signal, not an error: the caller
/// must not start serving and should route to `owner` instead.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClaimResponse {
    pub ok: bool,
    pub granted: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub owner: Option<String>,
}

// ── Aggregated view ───────────────────────────────────────────────────────────

/// One contributing peer inside an [`AggregatedEntry`].
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedExample {
    pub model_id: String,
    pub public_url: String,
    pub status: ModelStatus,
    pub seeders: u32,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
}

/// The registry's merged, per-code summary of all fresh peers.
///
/// Recomputed on every query; never persisted.  Ordering of `examples` and
/// of entries is unspecified; routing priority is the router's concern.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedEntry {
    /// Deterministic 7-hex identifier correlating the same model across peers.
    pub code: String,
    pub name: String,
    /// Distinct peers holding this code.
    pub nodes: u32,
    pub total_seeders: u32,
    pub peers: u32,
    pub examples: Vec<AggregatedExample>,
}

// ── Relay bodies ──────────────────────────────────────────────────────────────

/// A single message in a conversation, OpenAI-compatible shape.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    /// `"system"`, `"user"`, or `"assistant"`.
    pub role: String,
    pub content: String,
}

/// Body of `POST /swarm/relay/chat`: serve this request on the receiving node.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RelayChatRequest {
    pub model_id: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RelayChatResponse {
    pub content: String,
}

/// Body of `POST /swarm/relay/next-token`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RelayNextTokenRequest {
    pub model_id: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RelayNextTokenResponse {
    pub token: String,
}

/// Body of `POST /swarm/relay/compose`: best-effort fan-out over the serving
/// peers of one code, first usable text wins.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RelayComposeRequest {
    pub code: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RelayComposeResponse {
    pub text: String,
}

// ── Tests ──────────────────────────────────────────────────────────────────────
