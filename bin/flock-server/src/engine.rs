//! HTTP inference engine collaborator.
//!
//! The relay endpoints forward to a local OpenAI-compatible runtime (e.g. a
//! llama.cpp server) configured via `FLOCK_ENGINE_URL`.  The swarm core
//! never implements inference itself.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use flock_swarm::{ChatOptions, InferenceEngine};
use flock_types::ChatMessage;
use reqwest::Client;
use serde_json::json;

/// Bounds one engine call; kept below the relay timeout so a slow local
/// runtime fails the relay attempt instead of the remote caller's socket.
const ENGINE_TIMEOUT: Duration = Duration::from_secs(40);

pub struct HttpEngine {
    client: Client,
    base_url: String,
}

impl HttpEngine {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .user_agent(concat!("flock/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl InferenceEngine for HttpEngine {
    async fn chat(
        &self,
        model_id: &str,
        messages: &[ChatMessage],
        opts: ChatOptions,
    ) -> anyhow::Result<String> {
        let body = json!({
            "model": model_id,
            "messages": messages,
            "max_tokens": opts.max_tokens,
            "temperature": opts.temperature,
        });

        let resp: serde_json::Value = self
            .client
            .post(self.url("/v1/chat/completions"))
            .timeout(ENGINE_TIMEOUT)
            .json(&body)
            .send()
            .await
            .context("engine request failed")?
            .error_for_status()
            .context("engine answered with an error status")?
            .json()
            .await
            .context("engine answered with an invalid body")?;

        resp["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_owned)
            .context("engine response carried no content")
    }

    async fn next_token(
        &self,
        model_id: &str,
        prompt: &str,
        temperature: Option<f32>,
    ) -> anyhow::Result<String> {
        let body = json!({
            "model": model_id,
            "prompt": prompt,
            "max_tokens": 1,
            "temperature": temperature,
        });

        let resp: serde_json::Value = self
            .client
            .post(self.url("/v1/completions"))
            .timeout(ENGINE_TIMEOUT)
            .json(&body)
            .send()
            .await
            .context("engine request failed")?
            .error_for_status()
            .context("engine answered with an error status")?
            .json()
            .await
            .context("engine answered with an invalid body")?;

        resp["choices"][0]["text"]
            .as_str()
            .map(str::to_owned)
            .context("engine response carried no text")
    }
}
