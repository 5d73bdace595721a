//! # Chat relay - stateless assistant backed by an OpenAI-compatible API
//!
//! [`ChatRelay::ask`] sends exactly two messages upstream: a system prompt
//! asking for replies in the requested language, and the user's message. No
//! history is kept between calls.
//!
//! Empty messages are rejected locally with [`ChatError::EmptyMessage`] before
//! any network traffic. Every upstream problem (transport error, non-2xx status,
//! a response without content) becomes a [`ChatError`] that the route returns
//! to the client verbatim; nothing is retried.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upstream configuration, read from the `chat` settings section.
#[derive(Clone, Debug, Deserialize)]
pub struct ChatSettings {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("No message provided")]
    EmptyMessage,

    #[error("Chat assistant is not configured: OPENAI_API_KEY is not set")]
    MissingApiKey,

    #[error("Error communicating with AI: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Error communicating with AI: upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Error communicating with AI: response contained no reply")]
    EmptyReply,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

pub const DEFAULT_LANGUAGE: &str = "en";

pub struct ChatRelay {
    client: reqwest::Client,
    settings: ChatSettings,
}

impl ChatRelay {
    pub fn new(settings: ChatSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.settings.api_key.is_some()
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        )
    }

    /// Ask the assistant a single question and return its trimmed reply.
    pub async fn ask(&self, message: &str, language: &str) -> Result<String, ChatError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let api_key = self
            .settings
            .api_key
            .as_deref()
            .ok_or(ChatError::MissingApiKey)?;

        let language = match language.trim() {
            "" => DEFAULT_LANGUAGE,
            language => language,
        };
        let system_prompt = format!("You are an AI assistant that replies in {language}.");

        let request = CompletionRequest {
            model: &self.settings.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: message,
                },
            ],
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "chat upstream returned an error");
            return Err(ChatError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let completion: CompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(ChatError::EmptyReply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    /// Start a fake completions endpoint and return its base URL.
    async fn spawn_upstream(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/v1")
    }

    fn relay(base_url: String) -> ChatRelay {
        ChatRelay::new(ChatSettings {
            api_key: Some("test-key".to_string()),
            base_url,
            model: "test-model".to_string(),
        })
    }

    #[tokio::test]
    async fn empty_message_is_rejected_without_upstream_call() {
        // Nothing listens on port 9 (discard); any request would fail with a
        // transport error instead.
        let relay = relay("http://127.0.0.1:9/v1".to_string());

        for message in ["", "   \n"] {
            let err = relay.ask(message, "en").await.unwrap_err();
            assert!(matches!(err, ChatError::EmptyMessage));
        }
    }

    #[tokio::test]
    async fn missing_api_key_is_an_error() {
        let relay = ChatRelay::new(ChatSettings::default());
        assert!(!relay.is_configured());

        let err = relay.ask("hello", "en").await.unwrap_err();
        assert!(matches!(err, ChatError::MissingApiKey));
    }

    #[tokio::test]
    async fn forwards_prompt_and_returns_trimmed_reply() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers["authorization"], "Bearer test-key");
                assert_eq!(body["model"], "test-model");
                assert_eq!(
                    body["messages"][0]["content"],
                    "You are an AI assistant that replies in fr."
                );
                assert_eq!(body["messages"][1]["role"], "user");
                let question = body["messages"][1]["content"].as_str().unwrap_or_default();
                Json(json!({
                    "choices": [{ "message": { "role": "assistant", "content": format!("  echo: {question}\n") } }]
                }))
            }),
        );
        let relay = relay(spawn_upstream(router).await);

        let reply = relay.ask("  What is an MRI?  ", "fr").await.unwrap();

        assert_eq!(reply, "echo: What is an MRI?");
    }

    #[tokio::test]
    async fn upstream_error_status_is_reported() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "rate limited") }),
        );
        let relay = relay(spawn_upstream(router).await);

        let err = relay.ask("hello", "en").await.unwrap_err();

        match err {
            ChatError::Upstream { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn response_without_choices_is_an_empty_reply() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { Json(json!({ "choices": [] })) }),
        );
        let relay = relay(spawn_upstream(router).await);

        let err = relay.ask("hello", "en").await.unwrap_err();
        assert!(matches!(err, ChatError::EmptyReply));
    }
}
