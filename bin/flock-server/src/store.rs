//! In-memory local model store.
//!
//! The node's catalog of known models and their live serve state.  Nothing
//! here is persisted: the catalog is rebuilt through `/admin/models` after a
//! restart, and serve state is deliberately process-local: a restarted
//! node re-claims before serving again.

use std::collections::HashMap;

use async_trait::async_trait;
use flock_swarm::ModelStore;
use flock_types::{ModelAdvertisement, ModelStatus, ServeStatus};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryModelStore {
    models: RwLock<HashMap<String, ModelAdvertisement>>,
    statuses: RwLock<HashMap<String, ServeStatus>>,
}

impl MemoryModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a catalog entry.
    pub async fn upsert(&self, ad: ModelAdvertisement) {
        self.models.write().await.insert(ad.model_id.clone(), ad);
    }

    /// Mark a model as actively serving.
    ///
    /// The advertisement's status and serve address are updated so the next
    /// beacon push advertises the change.
    pub async fn set_serving(&self, id: &str, host: Option<String>, port: Option<u16>) {
        if let Some(ad) = self.models.write().await.get_mut(id) {
            ad.status = ModelStatus::Serving;
            ad.serve_host = host.clone();
            ad.serve_port = port;
        }
        let mut statuses = self.statuses.write().await;
        let status = statuses.entry(id.to_owned()).or_default();
        status.serving = true;
        status.host = host;
        status.port = port;
    }

    /// Clear serving state, returning the model to `ready`.
    pub async fn clear_serving(&self, id: &str) {
        if let Some(ad) = self.models.write().await.get_mut(id) {
            if ad.status == ModelStatus::Serving {
                ad.status = ModelStatus::Ready;
            }
            ad.serve_host = None;
            ad.serve_port = None;
        }
        if let Some(status) = self.statuses.write().await.get_mut(id) {
            status.serving = false;
            status.host = None;
            status.port = None;
        }
    }

    /// `true` while the model's live serve status is serving.
    pub async fn is_serving(&self, id: &str) -> bool {
        self.statuses
            .read()
            .await
            .get(id)
            .map(|s| s.serving)
            .unwrap_or(false)
    }
}

#[async_trait]
impl ModelStore for MemoryModelStore {
    async fn all_models(&self) -> Vec<ModelAdvertisement> {
        self.models.read().await.values().cloned().collect()
    }

    async fn model_by_id(&self, id: &str) -> Option<ModelAdvertisement> {
        self.models.read().await.get(id).cloned()
    }

    async fn serve_status(&self, id: &str) -> Option<ServeStatus> {
        self.statuses.read().await.get(id).cloned()
    }

    async fn record_serve_outcome(&self, id: &str, success: bool) {
        let mut statuses = self.statuses.write().await;
        let status = statuses.entry(id.to_owned()).or_default();
        if success {
            status.requests += 1;
        } else {
            status.errors += 1;
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;

    fn ad(id: &str) -> ModelAdvertisement {
        ModelAdvertisement {
            model_id: id.into(),
            name: "tiny".into(),
            info_hash: None,
            repo_id: Some("org/repo".into()),
            file_name: Some("w.gguf".into()),
            status: ModelStatus::Ready,
            capabilities: vec![],
            seeders: 0,
            peers: 0,
            uploaded_bytes: 0,
            downloaded_bytes: 0,
            serve_host: None,
            serve_port: None,
        }
    }

    #[tokio::test]
    async fn serve_lifecycle_updates_advertisement_and_status() {
        let store = MemoryModelStore::new();
        store.upsert(ad("m1")).await;

        store.set_serving("m1", Some("127.0.0.1".into()), Some(9000)).await;
        assert!(store.is_serving("m1").await);
        let m = store.model_by_id("m1").await.unwrap();
        assert_eq!(m.status, ModelStatus::Serving);
        assert_eq!(m.serve_port, Some(9000));

        store.clear_serving("m1").await;
        assert!(!store.is_serving("m1").await);
        let m = store.model_by_id("m1").await.unwrap();
        assert_eq!(m.status, ModelStatus::Ready);
        assert!(m.serve_host.is_none());
    }

    #[tokio::test]
    async fn outcomes_bump_the_right_counter() {
        let store = MemoryModelStore::new();
        store.upsert(ad("m1")).await;
        store.record_serve_outcome("m1", true).await;
        store.record_serve_outcome("m1", true).await;
        store.record_serve_outcome("m1", false).await;

        let status = store.serve_status("m1").await.unwrap();
        assert_eq!(status.requests, 2);
        assert_eq!(status.errors, 1);
    }
}
