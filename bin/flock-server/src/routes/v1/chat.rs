//! OpenAI-compatible chat-completion routes.
//!
//! The handler validates the request, hands it to the federated router
//! (remote candidates first, then the local engine), and wraps whatever came
//! back in an OpenAI-shaped response.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use flock_swarm::{RouteRequest, ServedBy};
use flock_types::ChatMessage;
use tracing::{debug, info};
use utoipa::OpenApi;
use uuid::Uuid;

use crate::error::ServerError;
use crate::schemas::v1::chat::{ChatChoice, ChatCompletionRequest, ChatCompletionResponse};
use crate::state::AppState;

/// Maximum allowed prompt length in bytes to prevent memory exhaustion.
const MAX_PROMPT_BYTES: usize = 128 * 1024; // 128 KiB

#[derive(OpenApi)]
#[openapi(
    paths(chat_completions),
    components(schemas(ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ChatChoice))
)]
pub struct ChatApi;

/// Register chat-completion routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/chat/completions", post(chat_completions))
}

/// OpenAI chat completions (`POST /v1/chat/completions`).
///
/// Routed through the swarm: the best-positioned remote peer answers when
/// one is available, otherwise a locally-served model, otherwise `503`.
#[utoipa::path(
    post,
    path = "/v1/chat/completions",
    tag = "chat",
    request_body = ChatCompletionRequest,
    responses(
        (status = 200, description = "Completion generated", body = ChatCompletionResponse),
        (status = 400, description = "Bad request"),
        (status = 503, description = "No model available"),
    )
)]
pub async fn chat_completions(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatCompletionRequest>,
) -> Result<Json<ChatCompletionResponse>, ServerError> {
    // Use the last user-role message as the current prompt.
    let user_content = req
        .messages
        .iter()
        .rev()
        .find(|m| m.role == "user")
        .map(|m| m.content.clone())
        .ok_or_else(|| ServerError::BadRequest("no user message found".into()))?;

    if user_content.len() > MAX_PROMPT_BYTES {
        return Err(ServerError::BadRequest(format!(
            "prompt too large ({} bytes); maximum is {} bytes",
            user_content.len(),
            MAX_PROMPT_BYTES,
        )));
    }

    let max_tokens = req.max_tokens.unwrap_or(512);
    if max_tokens == 0 || max_tokens > 4096 {
        return Err(ServerError::BadRequest(format!(
            "invalid max_tokens ({max_tokens}): must be between 1 and 4096"
        )));
    }

    let temperature = req.temperature.unwrap_or(0.7);
    if !(0.0..=2.0).contains(&temperature) {
        return Err(ServerError::BadRequest(format!(
            "invalid temperature ({temperature}): must be between 0.0 and 2.0"
        )));
    }

    debug!(
        model = %req.model,
        code = ?req.code,
        prompt_len = user_content.len(),
        "chat completion request"
    );

    let route = RouteRequest {
        messages: req.messages,
        requested_code: req.code,
        session_model: (!req.model.is_empty()).then(|| req.model.clone()),
        max_tokens: Some(max_tokens),
        temperature: Some(temperature),
    };

    let routed = state.router.route_chat(route).await?;

    let served_model = match &routed.served_by {
        ServedBy::Remote(peer_url) => peer_url.clone(),
        ServedBy::Composed => "swarm-compose".to_owned(),
        ServedBy::Local(model_id) => model_id.clone(),
    };
    info!(served_by = %served_model, output_len = routed.content.len(), "chat completion done");

    let resp = ChatCompletionResponse {
        id: format!("chatcmpl-{}", Uuid::new_v4()),
        object: "chat.completion".into(),
        created: Utc::now().timestamp(),
        model: served_model,
        choices: vec![ChatChoice {
            index: 0,
            message: ChatMessage {
                role: "assistant".into(),
                content: routed.content,
            },
            finish_reason: "stop".into(),
        }],
    };

    Ok(Json(resp))
}

// ── Tests ──────────────────────────────────────────────────────────────────────
