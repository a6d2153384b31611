//! Shared application state injected into every Axum handler.

use std::collections::HashMap;
use std::sync::Arc;

use flock_swarm::{Beacon, FederatedRouter, InferenceEngine, LeaseManager, PeerTransport, Registry};

use crate::config::Config;
use crate::store::MemoryModelStore;

/// Tracks lease-renewal task abort handles, keyed by model id.
pub struct RenewalManager {
    handles: std::sync::Mutex<HashMap<String, tokio::task::AbortHandle>>,
}

impl std::fmt::Debug for RenewalManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.handles.lock().map(|h| h.len()).unwrap_or(0);
        write!(f, "RenewalManager({count} handles)")
    }
}

impl RenewalManager {
    pub fn new() -> Self {
        Self {
            handles: std::sync::Mutex::new(HashMap::new()),
        }
    }

    pub fn insert(&self, id: impl Into<String>, handle: tokio::task::AbortHandle) {
        if let Ok(mut map) = self.handles.lock() {
            map.insert(id.into(), handle);
        }
    }

    /// Abort and remove a renewal task.  Returns `true` if one was running.
    pub fn cancel(&self, id: &str) -> bool {
        if let Ok(mut map) = self.handles.lock() {
            if let Some(h) = map.remove(id) {
                h.abort();
                return true;
            }
        }
        false
    }

    pub fn remove(&self, id: &str) {
        if let Ok(mut map) = self.handles.lock() {
            map.remove(id);
        }
    }
}

impl Default for RenewalManager {
    fn default() -> Self {
        Self::new()
    }
}

/// State shared across all HTTP handlers and the background timers.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// This node's model catalog and live serve state.
    pub store: Arc<MemoryModelStore>,
    /// Local inference engine collaborator.
    pub engine: Arc<dyn InferenceEngine>,
    /// Transport to the registry and to other peers.
    pub transport: Arc<dyn PeerTransport>,
    /// Registry role: peer registrations and the aggregated view.
    pub registry: Arc<Registry>,
    /// Registry role: the serve-claim table.
    pub leases: Arc<LeaseManager>,
    /// Keeps this node's registration fresh.
    pub beacon: Arc<Beacon>,
    /// Remote-first request routing.
    pub router: Arc<FederatedRouter>,
    /// Abort handles for running lease-renewal tasks.
    pub renewals: Arc<RenewalManager>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn cancel_reports_whether_a_task_was_running() {
        let manager = RenewalManager::new();
        let handle = tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        });
        manager.insert("m1", handle.abort_handle());

        assert!(manager.cancel("m1"));
        assert!(!manager.cancel("m1"));
    }
}
