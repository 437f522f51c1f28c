//! Chat client for OpenAI-compatible `chat/completions` over HTTP.

use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::credentials::Credentials;
use crate::error::{LlmError, Result};
use crate::types::{ChatRequest, ChatResponse};

#[derive(Deserialize)]
struct Completion {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    completion_tokens: u32,
}

/// HTTP client bound to one endpoint and key.
pub struct ChatClient {
    http: Client,
    credentials: Credentials,
}

impl ChatClient {
    /// Create a client.
    ///
    /// # Errors
    /// Returns [`LlmError::ConfigError`] if the HTTP client cannot be built.
    pub fn new(credentials: Credentials) -> Result<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| LlmError::ConfigError(e.to_string()))?;
        Ok(Self { http, credentials })
    }

    /// Endpoint root this client talks to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.credentials.base_url()
    }

    /// Send one chat completion request. No retries.
    ///
    /// # Errors
    /// - [`LlmError::Timeout`] if no answer arrived within `timeout`
    /// - [`LlmError::RequestFailed`] / [`LlmError::Unavailable`] for transport or HTTP errors
    /// - [`LlmError::ParseError`] if the body is not a chat completion
    /// - [`LlmError::EmptyResponse`] if the message content is blank
    pub async fn complete(&self, request: &ChatRequest, timeout: Duration) -> Result<ChatResponse> {
        let url = format!("{}/chat/completions", self.credentials.base_url());
        let body = json!({
            "model": request.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user },
            ],
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });

        let start = Instant::now();
        let resp = self
            .http
            .post(&url)
            .bearer_auth(self.credentials.api_key())
            .json(&body)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(e, timeout))?;

        let status = resp.status();
        if !status.is_success() {
            warn!(%status, "Chat API returned error");
            return Err(LlmError::RequestFailed(format!("HTTP {status}")));
        }

        let bytes = resp.bytes().await.map_err(|e| classify(e, timeout))?;
        let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        let completion: Completion =
            serde_json::from_slice(&bytes).map_err(|e| LlmError::ParseError(e.to_string()))?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::ParseError("response has no message content".into()))?;

        let text = content.trim().to_string();
        if text.is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        debug!(latency_ms, chars = text.len(), "Chat completion received");
        Ok(ChatResponse {
            text,
            tokens_generated: completion.usage.map_or(0, |u| u.completion_tokens),
            latency_ms,
            model: completion.model.unwrap_or_else(|| request.model.clone()),
        })
    }

    /// Check that the endpoint answers and accepts the key.
    ///
    /// Any HTTP answer other than 401/403 counts as reachable.
    ///
    /// # Errors
    /// Returns [`LlmError::Unavailable`] if the endpoint cannot be reached or
    /// rejects the credentials, [`LlmError::Timeout`] if it is too slow.
    pub async fn probe(&self, timeout: Duration) -> Result<()> {
        let url = format!("{}/models", self.credentials.base_url());
        let resp = self
            .http
            .get(&url)
            .bearer_auth(self.credentials.api_key())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(e, timeout))?;

        match resp.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(LlmError::Unavailable(format!(
                "credentials rejected (HTTP {})",
                resp.status()
            ))),
            status => {
                debug!(%status, "Chat API reachable");
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("base_url", &self.credentials.base_url())
            .finish_non_exhaustive()
    }
}

fn classify(err: reqwest::Error, timeout: Duration) -> LlmError {
    match LlmError::from(err) {
        LlmError::Timeout(_) => LlmError::Timeout(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)),
        other => other,
    }
}
