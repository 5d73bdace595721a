use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::chat::DEFAULT_LANGUAGE;
use crate::error::ApiError;
use crate::state::AppState;

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub voice: bool,
}

impl Default for ChatRequest {
    fn default() -> Self {
        Self {
            message: None,
            language: default_language(),
            voice: false,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    /// Echo of the request flag; the client decides whether to speak the reply.
    pub voice: bool,
}

/// POST /api/chat
///
/// A missing or malformed body is treated like an empty message.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            tracing::debug!("unreadable chat body: {}", rejection.body_text());
            ChatRequest::default()
        }
    };

    let message = req.message.unwrap_or_default();
    let reply = state.chat.ask(&message, &req.language).await?;

    Ok(Json(ChatResponse {
        reply,
        voice: req.voice,
    }))
}
