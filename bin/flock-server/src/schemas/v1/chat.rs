//! OpenAI-compatible API v1 request / response types.
//!
//! The structures here are intentionally kept compatible with the OpenAI
//! REST API specification so that existing OpenAI SDK clients work without
//! modification.  The `code` extension restricts routing to one swarm model
//! code.

use flock_types::ChatMessage;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for `POST /v1/chat/completions`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatCompletionRequest {
    /// The preferred local model identifier; used as the session's model for
    /// local fallback.  May be empty when routing purely by `code`.
    #[serde(default)]
    pub model: String,
    /// Conversation history; the last user message is used as the prompt.
    pub messages: Vec<ChatMessage>,
    /// Restrict routing to the peers serving this swarm model code.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub code: Option<String>,
    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature in [0, 2].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// A single choice in the completion response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatChoice {
    /// Zero-based index of this choice.
    pub index: u32,
    /// The generated message.
    pub message: ChatMessage,
    /// Why generation stopped (`"stop"`, `"length"`, …).
    pub finish_reason: String,
}

/// Response body for `POST /v1/chat/completions`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatCompletionResponse {
    /// Unique identifier for this completion.
    pub id: String,
    /// Always `"chat.completion"`.
    pub object: String,
    /// Unix timestamp of when the response was created.
    pub created: i64,
    /// Model that produced the completion (or the peer URL that served it).
    pub model: String,
    /// Generated choices.
    pub choices: Vec<ChatChoice>,
}
