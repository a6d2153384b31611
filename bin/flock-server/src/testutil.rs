//! Shared test fixtures: an [`AppState`] wired to scripted collaborators.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use flock_swarm::{
    Beacon, ChatOptions, FederatedRouter, InferenceEngine, LeaseManager, MemoryClaimStore,
    MemoryPeerStore, PeerTransport, Registry, SwarmError, SystemClock,
};
use flock_types::{
    AggregatedEntry, ChatMessage, ClaimRequest, ClaimResponse, ModelAdvertisement, ModelStatus,
    RegisterPayload, RelayChatRequest, RelayChatResponse, RelayComposeRequest,
    RelayComposeResponse,
};

use crate::config::Config;
use crate::state::{AppState, RenewalManager};
use crate::store::MemoryModelStore;

pub(crate) const SELF_URL: &str = "http://node-self:3000";

pub(crate) fn advertisement(id: &str, info_hash: &str, status: ModelStatus) -> ModelAdvertisement {
    ModelAdvertisement {
        model_id: id.into(),
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

// ── Scripted collaborators ────────────────────────────────────────────────────

#[derive(Default)]
pub(crate) struct ScriptedTransport {
    pub aggregated: Mutex<Vec<AggregatedEntry>>,
    /// `Some(owner)` makes every claim come back denied with that owner.
    pub deny_claims_with: Mutex<Option<String>>,
    pub registrations: Mutex<Vec<RegisterPayload>>,
    /// `(code, peer_id)` pairs released so far.
    pub released: Mutex<Vec<(String, String)>>,
    /// Reply for any relay-chat call; unset means the peer is unreachable.
    pub relay_content: Mutex<Option<String>>,
    pub compose_text: Mutex<Option<String>>,
}

#[async_trait]
impl PeerTransport for ScriptedTransport {
    async fn register(
        &self,
        _registry_url: &str,
        payload: &RegisterPayload,
    ) -> Result<(), SwarmError> {
        self.registrations.lock().unwrap().push(payload.clone());
        Ok(())
    }

    async fn fetch_aggregated(
        &self,
        _registry_url: &str,
    ) -> Result<Vec<AggregatedEntry>, SwarmError> {
        Ok(self.aggregated.lock().unwrap().clone())
    }

    async fn claim(
        &self,
        _registry_url: &str,
        req: &ClaimRequest,
    ) -> Result<ClaimResponse, SwarmError> {
        match self.deny_claims_with.lock().unwrap().clone() {
            Some(owner) => Ok(ClaimResponse {
                ok: true,
                granted: false,
                owner: Some(owner),
            }),
            None => Ok(ClaimResponse {
                ok: true,
                granted: true,
                owner: Some(req.peer_id.clone()),
            }),
        }
    }

    async fn release(
        &self,
        _registry_url: &str,
        code: &str,
        peer_id: &str,
    ) -> Result<(), SwarmError> {
        self.released
            .lock()
            .unwrap()
            .push((code.to_owned(), peer_id.to_owned()));
        Ok(())
    }

    async fn relay_chat(
        &self,
        _peer_url: &str,
        _req: &RelayChatRequest,
    ) -> Result<RelayChatResponse, SwarmError> {
        match self.relay_content.lock().unwrap().clone() {
            Some(content) => Ok(RelayChatResponse { content }),
            None => Err(SwarmError::Protocol { status: 503 }),
        }
    }

    async fn relay_compose(
        &self,
        _registry_url: &str,
        _req: &RelayComposeRequest,
    ) -> Result<RelayComposeResponse, SwarmError> {
        match self.compose_text.lock().unwrap().clone() {
            Some(text) => Ok(RelayComposeResponse { text }),
            None => Err(SwarmError::Protocol { status: 503 }),
        }
    }
}

pub(crate) struct ScriptedEngine {
    pub reply: String,
    pub fail: AtomicBool,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedEngine {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.into(),
            fail: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl InferenceEngine for ScriptedEngine {
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

// ── Harness ───────────────────────────────────────────────────────────────────

pub(crate) struct Harness {
    pub state: Arc<AppState>,
    pub transport: Arc<ScriptedTransport>,
    pub engine: Arc<ScriptedEngine>,
}

fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".into(),
        public_url: SELF_URL.into(),
        registry_url: "http://registry:3000".into(),
        engine_url: "http://engine:8080".into(),
        heartbeat_ms: 30_000,
        lease_ttl_ms: 60_000,
        staleness_ms: 90_000,
        log_level: "info".into(),
        log_json: false,
        enable_swagger: false,
        cors_allowed_origins: None,
    }
}

pub(crate) fn harness() -> Harness {
    let transport = Arc::new(ScriptedTransport::default());
    let engine = Arc::new(ScriptedEngine::replying("fake answer"));
    let config = Arc::new(test_config());
    let store = Arc::new(MemoryModelStore::new());
    let clock = Arc::new(SystemClock);

    let registry = Arc::new(Registry::new(
        Arc::new(MemoryPeerStore::new()),
        clock.clone(),
        Duration::from_millis(config.staleness_ms),
    ));
    let leases = Arc::new(LeaseManager::new(Arc::new(MemoryClaimStore::new()), clock));
    let beacon = Arc::new(Beacon::new(
        transport.clone(),
        store.clone(),
        config.registry_url.clone(),
        env!("CARGO_PKG_VERSION"),
    ));
    let router = Arc::new(FederatedRouter::new(
        transport.clone(),
        store.clone(),
        engine.clone(),
        config.public_url.clone(),
        config.registry_url.clone(),
    ));

    let state = Arc::new(AppState {
        config,
        store,
        engine: engine.clone(),
        transport: transport.clone(),
        registry,
        leases,
        beacon,
        router,
        renewals: Arc::new(RenewalManager::new()),
    });

    Harness {
        state,
        transport,
        engine,
    }
}

pub(crate) async fn test_state() -> Arc<AppState> {
    harness().state
}
