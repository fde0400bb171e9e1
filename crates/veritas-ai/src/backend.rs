//! Decision backends: the external reasoning service that turns a JUNO
//! prompt into a verdict.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use veritas_core::config::DEFAULT_OPENAI_API_URL;

use crate::prompt::{self, DecisionRequest};

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("response contained no completion")]
    EmptyResponse,
}

/// Executes a decision request and returns the model's raw text, which is
/// expected (but not guaranteed) to be a single JSON object.
#[async_trait]
pub trait DecisionBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn decide(&self, request: &DecisionRequest) -> Result<String, BackendError>;
}

/// Degraded backend used when no model credential is configured.
#[derive(Debug, Default, Clone)]
pub struct StubBackend;

impl StubBackend {
    pub const RESPONSE: &'static str = r#"{"notes":"stub decision backend: no model configured"}"#;
}

#[async_trait]
impl DecisionBackend for StubBackend {
    fn name(&self) -> &str {
        "stub"
    }

    async fn decide(&self, _request: &DecisionRequest) -> Result<String, BackendError> {
        Ok(Self::RESPONSE.to_string())
    }
}

/// OpenAI chat-completions backend.
pub struct OpenAiBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl OpenAiBackend {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

    pub fn new(api_key: String) -> Self {
        Self::with_base_url(DEFAULT_OPENAI_API_URL.to_string(), api_key)
    }

    /// `base_url` should be like `https://api.openai.com` (no trailing slash).
    pub fn with_base_url(base_url: String, api_key: String) -> Self {
        Self {
            client: build_client(Self::REQUEST_TIMEOUT),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Replace the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }
}

fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "HTTP client build failed; falling back to a client without request timeout");
            reqwest::Client::new()
        })
}

#[async_trait]
impl DecisionBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    async fn decide(&self, request: &DecisionRequest) -> Result<String, BackendError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &request.model,
            temperature: 0.0,
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: prompt::system_prompt(),
                },
                ChatMessage {
                    role: "user".into(),
                    content: request.user_prompt(),
                },
            ],
        };

        info!(url = %url, model = %request.model, "requesting decision");
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = resp.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(BackendError::EmptyResponse)
    }
}
