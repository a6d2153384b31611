//! Registration beacon.
//!
//! Keeps the swarm's view of this node fresh: one immediate registration on
//! startup (and on serve-state changes, via [`Beacon::register_self`]), then
//! a periodic push for the life of the process.  Registration is silent and
//! best-effort: a failure is logged and swallowed, never raised into
//! caller code.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use flock_types::{Capability, RegisterPayload};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::identity::peer_id;
use crate::local::ModelStore;
use crate::transport::PeerTransport;

pub struct Beacon {
    transport: Arc<dyn PeerTransport>,
    store: Arc<dyn ModelStore>,
    registry_url: String,
    version: String,
    heartbeat: Mutex<Option<Heartbeat>>,
}

struct Heartbeat {
    self_url: String,
    handle: JoinHandle<()>,
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl Beacon {
    pub fn new(
        transport: Arc<dyn PeerTransport>,
        store: Arc<dyn ModelStore>,
        registry_url: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            store,
            registry_url: registry_url.into(),
            version: version.into(),
            heartbeat: Mutex::new(None),
        }
    }

    /// Build this node's registration payload from the local catalog.
    pub async fn payload(&self, self_url: &str) -> RegisterPayload {
        build_payload(self.store.as_ref(), &self.version, self_url).await
    }

    /// Push one registration to the registry.  Never raises.
    pub async fn register_self(&self, self_url: &str) {
        let payload = self.payload(self_url).await;
        push_registration(self.transport.as_ref(), &self.registry_url, &payload).await;
    }

    /// Start (or keep) the periodic registration timer.
    ///
    /// Idempotent for the same `self_url`; a different URL aborts and
    /// replaces the previous timer.  The first registration fires
    /// immediately, then every `interval` until the process exits; there
    /// is no stop API.
    pub fn ensure_heartbeat(&self, self_url: &str, interval: Duration) {
        let Ok(mut guard) = self.heartbeat.lock() else {
            return;
        };

        if let Some(hb) = guard.as_ref() {
            if hb.self_url == self_url {
                return;
            }
        }

        let transport = Arc::clone(&self.transport);
        let store = Arc::clone(&self.store);
        let registry_url = self.registry_url.clone();
        let version = self.version.clone();
        let url = self_url.to_owned();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let payload = build_payload(store.as_ref(), &version, &url).await;
                push_registration(transport.as_ref(), &registry_url, &payload).await;
            }
        });

        // Dropping the previous Heartbeat aborts its timer task.
        *guard = Some(Heartbeat {
            self_url: self_url.to_owned(),
            handle,
        });
    }
}

/// Snapshot the catalog into a registration payload.
///
/// A model carries `[chat, next_token]` capabilities only while its live
/// serve status shows it actively serving; otherwise it advertises none.
async fn build_payload(store: &dyn ModelStore, version: &str, self_url: &str) -> RegisterPayload {
    let mut models = store.all_models().await;
    for ad in &mut models {
        let live = store
            .serve_status(&ad.model_id)
            .await
            .map(|s| s.serving)
            .unwrap_or(false);
        ad.capabilities = if live {
            vec![Capability::Chat, Capability::NextToken]
        } else {
            Vec::new()
        };
    }

    RegisterPayload {
        peer_id: peer_id(self_url),
        public_url: self_url.to_owned(),
        version: version.to_owned(),
        models,
    }
}

async fn push_registration(
    transport: &dyn PeerTransport,
    registry_url: &str,
    payload: &RegisterPayload,
) {
    if let Err(e) = transport.register(registry_url, payload).await {
        debug!(
            error = %e,
            registry = %registry_url,
            "swarm registration failed; next heartbeat will retry"
        );
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
