//! Scripted fakes shared by the crate's unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use flock_types::{
    AggregatedEntry, AggregatedExample, Capability, ChatMessage, ClaimRequest, ClaimResponse,
    ModelAdvertisement, ModelStatus, RegisterPayload, RelayChatRequest, RelayChatResponse,
    RelayComposeRequest, RelayComposeResponse, ServeStatus,
};

use crate::error::SwarmError;
use crate::local::{ChatOptions, InferenceEngine, ModelStore};
use crate::transport::PeerTransport;

pub(crate) fn ad(model_id: &str, info_hash: &str, status: ModelStatus) -> ModelAdvertisement {
    ModelAdvertisement {
        model_id: model_id.into(),
        name: "tiny".into(),
        info_hash: Some(info_hash.into()),
        repo_id: None,
        file_name: None,
        status,
        capabilities: vec![],
        seeders: 0,
        peers: 0,
        uploaded_bytes: 0,
        downloaded_bytes: 0,
        serve_host: None,
        serve_port: None,
    }
}

pub(crate) fn example(
    model_id: &str,
    public_url: &str,
    status: ModelStatus,
    seeders: u32,
    capabilities: Vec<Capability>,
) -> AggregatedExample {
    AggregatedExample {
        model_id: model_id.into(),
        public_url: public_url.into(),
        status,
        seeders,
        capabilities,
    }
}

pub(crate) fn entry(code: &str, nodes: u32, examples: Vec<AggregatedExample>) -> AggregatedEntry {
    AggregatedEntry {
        code: code.into(),
        name: "tiny".into(),
        nodes,
        total_seeders: examples.iter().map(|e| e.seeders).sum(),
        peers: 0,
        examples,
    }
}

// ── FakeModelStore ────────────────────────────────────────────────────────────

#[derive(Default)]
pub(crate) struct FakeModelStore {
    pub models: Mutex<Vec<ModelAdvertisement>>,
    pub statuses: Mutex<HashMap<String, ServeStatus>>,
    pub outcomes: Mutex<Vec<(String, bool)>>,
}

impl FakeModelStore {
    pub fn with_models(models: Vec<ModelAdvertisement>) -> Self {
        Self {
            models: Mutex::new(models),
            ..Default::default()
        }
    }

    pub fn set_serving(&self, id: &str) {
        self.statuses.lock().unwrap().insert(
            id.to_owned(),
            ServeStatus {
                serving: true,
                ..Default::default()
            },
        );
    }
}

#[async_trait]
impl ModelStore for FakeModelStore {
    async fn all_models(&self) -> Vec<ModelAdvertisement> {
        self.models.lock().unwrap().clone()
    }

    async fn model_by_id(&self, id: &str) -> Option<ModelAdvertisement> {
        self.models
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.model_id == id)
            .cloned()
    }

    async fn serve_status(&self, id: &str) -> Option<ServeStatus> {
        self.statuses.lock().unwrap().get(id).cloned()
    }

    async fn record_serve_outcome(&self, id: &str, success: bool) {
        self.outcomes.lock().unwrap().push((id.to_owned(), success));
    }
}

// ── FakeEngine ────────────────────────────────────────────────────────────────

pub(crate) struct FakeEngine {
    pub reply: String,
    pub fail: AtomicBool,
    pub calls: Mutex<Vec<String>>,
}

impl FakeEngine {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.into(),
            fail: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl InferenceEngine for FakeEngine {
    async fn chat(
        &self,
        model_id: &str,
        _messages: &[ChatMessage],
        _opts: ChatOptions,
    ) -> anyhow::Result<String> {
        self.calls.lock().unwrap().push(model_id.to_owned());
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("engine down");
        }
        Ok(self.reply.clone())
    }

    async fn next_token(
        &self,
        model_id: &str,
        _prompt: &str,
        _temperature: Option<f32>,
    ) -> anyhow::Result<String> {
        self.calls.lock().unwrap().push(model_id.to_owned());
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("engine down");
        }
        Ok(self.reply.clone())
    }
}

// ── FakeTransport ─────────────────────────────────────────────────────────────

/// What one relay-chat attempt against a fake peer should produce.
#[derive(Clone)]
pub(crate) enum RelayReply {
    Content(String),
    /// Clean non-2xx answer; retryable iff >= 500.
    Status(u16),
}

#[derive(Default)]
pub(crate) struct FakeTransport {
    pub aggregated: Mutex<Vec<AggregatedEntry>>,
    pub fail_aggregated: AtomicBool,
    /// Reply script per peer URL; every attempt consumes nothing: the same
    /// reply is returned for each attempt against that peer.
    pub relay_replies: Mutex<HashMap<String, RelayReply>>,
    pub compose_text: Mutex<Option<String>>,
    pub registrations: Mutex<Vec<RegisterPayload>>,
    /// Ordered log of outbound calls, e.g. `"chat http://node-b:3000"`.
    pub calls: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn with_aggregated(entries: Vec<AggregatedEntry>) -> Self {
        Self {
            aggregated: Mutex::new(entries),
            ..Default::default()
        }
    }

    pub fn script_relay(&self, peer_url: &str, reply: RelayReply) {
        self.relay_replies
            .lock()
            .unwrap()
            .insert(peer_url.to_owned(), reply);
    }

    pub fn log(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl PeerTransport for FakeTransport {
    async fn register(
        &self,
        registry_url: &str,
        payload: &RegisterPayload,
    ) -> Result<(), SwarmError> {
        self.record(format!("register {registry_url}"));
        self.registrations.lock().unwrap().push(payload.clone());
        Ok(())
    }

    async fn fetch_aggregated(
        &self,
        registry_url: &str,
    ) -> Result<Vec<AggregatedEntry>, SwarmError> {
        self.record(format!("aggregated {registry_url}"));
        if self.fail_aggregated.load(Ordering::SeqCst) {
            return Err(SwarmError::Protocol { status: 503 });
        }
        Ok(self.aggregated.lock().unwrap().clone())
    }

    async fn claim(
        &self,
        registry_url: &str,
        req: &ClaimRequest,
    ) -> Result<ClaimResponse, SwarmError> {
        self.record(format!("claim {registry_url} {}", req.code));
        Ok(ClaimResponse {
            ok: true,
            granted: true,
            owner: Some(req.peer_id.clone()),
        })
    }

    async fn release(
        &self,
        registry_url: &str,
        code: &str,
        _peer_id: &str,
    ) -> Result<(), SwarmError> {
        self.record(format!("release {registry_url} {code}"));
        Ok(())
    }

    async fn relay_chat(
        &self,
        peer_url: &str,
        _req: &RelayChatRequest,
    ) -> Result<RelayChatResponse, SwarmError> {
        self.record(format!("chat {peer_url}"));
        match self.relay_replies.lock().unwrap().get(peer_url) {
            Some(RelayReply::Content(text)) => Ok(RelayChatResponse {
                content: text.clone(),
            }),
            Some(RelayReply::Status(status)) => Err(SwarmError::Protocol { status: *status }),
            None => Err(SwarmError::Protocol { status: 404 }),
        }
    }

    async fn relay_compose(
        &self,
        registry_url: &str,
        _req: &RelayComposeRequest,
    ) -> Result<RelayComposeResponse, SwarmError> {
        self.record(format!("compose {registry_url}"));
        match self.compose_text.lock().unwrap().clone() {
            Some(text) => Ok(RelayComposeResponse { text }),
            None => Err(SwarmError::Protocol { status: 503 }),
        }
    }
}
