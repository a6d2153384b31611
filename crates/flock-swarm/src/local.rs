//! Collaborator seams for node-local concerns.
//!
//! The swarm core reads the node's model catalog and invokes its inference
//! engine but implements neither; both arrive as injected trait objects.
//! (`async_trait` because callers hold `Arc<dyn ...>` handles.)

use async_trait::async_trait;
use flock_types::{ChatMessage, ModelAdvertisement, ServeStatus};

/// Options forwarded to the engine for a chat completion.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatOptions {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Read access to the node's model catalog and live serve state.
///
/// `record_serve_outcome` is the single mutation the swarm performs: request
/// and error counters are bumped after a local completion.
#[async_trait]
pub trait ModelStore: Send + Sync + 'static {
    async fn all_models(&self) -> Vec<ModelAdvertisement>;
    async fn model_by_id(&self, id: &str) -> Option<ModelAdvertisement>;
    async fn serve_status(&self, id: &str) -> Option<ServeStatus>;
    async fn record_serve_outcome(&self, id: &str, success: bool);
}

/// The node's local inference engine.
#[async_trait]
pub trait InferenceEngine: Send + Sync + 'static {
    async fn chat(
        &self,
        model_id: &str,
        messages: &[ChatMessage],
        opts: ChatOptions,
    ) -> anyhow::Result<String>;

    async fn next_token(
        &self,
        model_id: &str,
        prompt: &str,
        temperature: Option<f32>,
    ) -> anyhow::Result<String>;
}
