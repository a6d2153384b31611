//! Federated router.
//!
//! Answers a chat request by picking the best available server, remote-first:
//! fetch the aggregated view, walk candidates in priority order with bounded
//! retries, and degrade gracefully to local execution when no remote peer
//! succeeds.  Candidates are contacted strictly sequentially and never
//! revisited within one request.

use std::sync::Arc;
use std::time::Duration;

use flock_types::{
    AggregatedEntry, Capability, ChatMessage, ModelStatus, RelayChatRequest, RelayComposeRequest,
};
use tracing::{debug, info};

use crate::error::SwarmError;
use crate::identity::{model_code, same_peer};
use crate::local::{ChatOptions, InferenceEngine, ModelStore};
use crate::transport::PeerTransport;

/// Attempts per remote candidate before moving on.
const RELAY_ATTEMPTS: u32 = 3;
/// Linear backoff unit between attempts (×1, ×2, ...).
const RELAY_BACKOFF_MS: u64 = 800;
/// Serving `next_token` candidates required to try the composition fast path.
const COMPOSE_MIN_SERVING: usize = 2;

/// One inbound request as seen by the router.
#[derive(Debug, Clone, Default)]
pub struct RouteRequest {
    pub messages: Vec<ChatMessage>,
    /// Restrict routing to one model code.
    pub requested_code: Option<String>,
    /// Model already active in the caller's session; preferred for local
    /// fallback.
    pub session_model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Who ended up serving the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServedBy {
    /// A remote peer, identified by its public URL.
    Remote(String),
    /// The composition fast path.
    Composed,
    /// This node's own engine, identified by model id.
    Local(String),
}

#[derive(Debug, Clone)]
pub struct RoutedChat {
    pub content: String,
    pub served_by: ServedBy,
}

/// One peer+model combination considered for a single request.  Ephemeral:
/// derived from the aggregated view and dropped when the request completes.
#[derive(Debug, Clone)]
pub struct ChatCandidate {
    pub code: String,
    pub model_id: String,
    pub public_url: String,
    pub status: ModelStatus,
    pub seeders: u32,
    pub capabilities: Vec<Capability>,
}

pub struct FederatedRouter {
    transport: Arc<dyn PeerTransport>,
    store: Arc<dyn ModelStore>,
    engine: Arc<dyn InferenceEngine>,
    self_url: String,
    registry_url: String,
}

impl FederatedRouter {
    pub fn new(
        transport: Arc<dyn PeerTransport>,
        store: Arc<dyn ModelStore>,
        engine: Arc<dyn InferenceEngine>,
        self_url: impl Into<String>,
        registry_url: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            store,
            engine,
            self_url: self_url.into(),
            registry_url: registry_url.into(),
        }
    }

    /// Route one chat request: remote candidates in priority order, then the
    /// local fallback ladder, then [`SwarmError::NoModelAvailable`].
    pub async fn route_chat(&self, req: RouteRequest) -> Result<RoutedChat, SwarmError> {
        let entries = match self.transport.fetch_aggregated(&self.registry_url).await {
            Ok(entries) => entries,
            Err(e) => {
                debug!(error = %e, "aggregated view unavailable; trying local fallback");
                Vec::new()
            }
        };

        let candidates = build_candidates(entries, req.requested_code.as_deref());

        if let Some(text) = self.try_compose(&candidates, &req).await {
            return Ok(RoutedChat {
                content: text,
                served_by: ServedBy::Composed,
            });
        }

        for candidate in &candidates {
            // Our own advertisements are not remote candidates; the local
            // fallback ladder below covers the same models.
            if same_peer(&candidate.public_url, &self.self_url) {
                continue;
            }
            if let Some(content) = self.try_relay(candidate, &req).await {
                info!(
                    peer = %candidate.public_url,
                    code = %candidate.code,
                    "request served by remote peer"
                );
                return Ok(RoutedChat {
                    content,
                    served_by: ServedBy::Remote(candidate.public_url.clone()),
                });
            }
        }

        self.serve_locally(&req).await
    }

    /// Composition fast path: when at least two serving peers advertise
    /// `next_token` for the preferred code, try a single fan-out compose
    /// call.  Best-effort: any failure falls through to the candidate walk.
    async fn try_compose(&self, candidates: &[ChatCandidate], req: &RouteRequest) -> Option<String> {
        let code = req
            .requested_code
            .clone()
            .or_else(|| candidates.first().map(|c| c.code.clone()))?;

        let serving = candidates
            .iter()
            .filter(|c| {
                c.code == code
                    && c.status == ModelStatus::Serving
                    && c.capabilities.contains(&Capability::NextToken)
            })
            .count();
        if serving < COMPOSE_MIN_SERVING {
            return None;
        }

        let compose = RelayComposeRequest {
            code: code.clone(),
            prompt: flatten_prompt(&req.messages),
            max_tokens: req.max_tokens,
            temperature: req.temperature,
        };
        match self.transport.relay_compose(&self.registry_url, &compose).await {
            Ok(resp) if !resp.text.trim().is_empty() => {
                info!(code = %code, "composition fast path answered");
                Some(resp.text)
            }
            Ok(_) => None,
            Err(e) => {
                debug!(error = %e, "composition fast path failed; walking candidates");
                None
            }
        }
    }

    /// One candidate: up to [`RELAY_ATTEMPTS`] attempts with linear backoff,
    /// retrying only on transport/5xx failure.  `None` means exhausted:
    /// the caller moves to the next candidate and never returns here.
    async fn try_relay(&self, candidate: &ChatCandidate, req: &RouteRequest) -> Option<String> {
        let relay = RelayChatRequest {
            model_id: candidate.model_id.clone(),
            messages: req.messages.clone(),
            max_tokens: req.max_tokens,
            temperature: req.temperature,
        };

        for attempt in 1..=RELAY_ATTEMPTS {
            match self.transport.relay_chat(&candidate.public_url, &relay).await {
                Ok(resp) => {
                    if resp.content.trim().is_empty() {
                        // A clean but unusable answer: skip, do not retry.
                        debug!(peer = %candidate.public_url, "peer answered with empty content");
                        return None;
                    }
                    return Some(resp.content);
                }
                Err(e) if e.retryable() && attempt < RELAY_ATTEMPTS => {
                    debug!(
                        peer = %candidate.public_url,
                        attempt,
                        error = %e,
                        "relay attempt failed; backing off"
                    );
                    tokio::time::sleep(Duration::from_millis(RELAY_BACKOFF_MS * attempt as u64))
                        .await;
                }
                Err(e) => {
                    debug!(
                        peer = %candidate.public_url,
                        attempt,
                        error = %e,
                        "candidate exhausted; moving on"
                    );
                    return None;
                }
            }
        }
        None
    }

    async fn serve_locally(&self, req: &RouteRequest) -> Result<RoutedChat, SwarmError> {
        let model_id = self
            .pick_local_model(req)
            .await
            .ok_or(SwarmError::NoModelAvailable)?;

        let opts = ChatOptions {
            max_tokens: req.max_tokens,
            temperature: req.temperature,
        };
        match self.engine.chat(&model_id, &req.messages, opts).await {
            Ok(content) => {
                self.store.record_serve_outcome(&model_id, true).await;
                info!(model = %model_id, "request served locally");
                Ok(RoutedChat {
                    content,
                    served_by: ServedBy::Local(model_id),
                })
            }
            Err(e) => {
                self.store.record_serve_outcome(&model_id, false).await;
                Err(SwarmError::Engine(e))
            }
        }
    }

    /// Local fallback ladder: the caller's session model, then a serving
    /// model matching the requested code, then the sole serving model.
    async fn pick_local_model(&self, req: &RouteRequest) -> Option<String> {
        if let Some(id) = &req.session_model {
            if self.store.model_by_id(id).await.is_some() {
                return Some(id.clone());
            }
        }

        let models = self.store.all_models().await;

        if let Some(code) = req.requested_code.as_deref() {
            for ad in &models {
                if model_code(ad) == code && self.is_serving(&ad.model_id).await {
                    return Some(ad.model_id.clone());
                }
            }
        }

        let mut serving = Vec::new();
        for ad in &models {
            if self.is_serving(&ad.model_id).await {
                serving.push(ad.model_id.clone());
            }
        }
        if serving.len() == 1 {
            return serving.pop();
        }
        None
    }

    async fn is_serving(&self, id: &str) -> bool {
        self.store
            .serve_status(id)
            .await
            .map(|s| s.serving)
            .unwrap_or(false)
    }
}

/// Build the ordered candidate list from the aggregated view.
///
/// With a requested code the entries are filtered to that code; otherwise
/// they are ranked by node count, then total seeders.  Within an entry,
/// `serving` examples come before everything else, then by seeders
/// descending.  The flattened list is walked best-first.
pub fn build_candidates(
    mut entries: Vec<AggregatedEntry>,
    requested_code: Option<&str>,
) -> Vec<ChatCandidate> {
    match requested_code {
        Some(code) => entries.retain(|e| e.code == code),
        None => entries.sort_by(|a, b| {
            b.nodes
                .cmp(&a.nodes)
                .then(b.total_seeders.cmp(&a.total_seeders))
        }),
    }

    let mut out = Vec::new();
    for entry in entries {
        let mut examples = entry.examples;
        examples.sort_by(|a, b| {
            let a_serving = a.status == ModelStatus::Serving;
            let b_serving = b.status == ModelStatus::Serving;
            b_serving
                .cmp(&a_serving)
                .then(b.seeders.cmp(&a.seeders))
        });
        for example in examples {
            out.push(ChatCandidate {
                code: entry.code.clone(),
                model_id: example.model_id,
                public_url: example.public_url,
                status: example.status,
                seeders: example.seeders,
                capabilities: example.capabilities,
            });
        }
    }
    out
}

/// Flatten a conversation into a single prompt (`Role: content` lines,
/// closed with `Assistant:`), the format the compose relay expects.
fn flatten_prompt(messages: &[ChatMessage]) -> String {
    let mut parts: Vec<String> = messages
        .iter()
        .map(|m| format!("{}: {}", capitalize_role(&m.role), m.content))
        .collect();
    parts.push("Assistant:".into());
    parts.join("\n")
}

fn capitalize_role(role: &str) -> &str {
    match role {
        "user" => "User",
        "assistant" => "Assistant",
        "system" => "System",
        other => other,
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
