//! Completion client: send the prompt to a chat-completion endpoint and
//! return the model's raw reply text.
//!
//! The pipeline talks to the model only through the [`CompletionClient`]
//! trait, so tests (and callers with their own middleware) can swap in any
//! implementation. [`ChatCompletionClient`] is the production one: a single
//! bearer-authenticated `POST {base_url}/chat/completions` per call.
//!
//! ## Error Classification
//!
//! Failures are sorted at the network boundary so the caller can report
//! them differently:
//!
//! | Condition | Error |
//! |-----------|-------|
//! | timeout, DNS, connection reset, body read failure | `NetworkFailure` |
//! | HTTP 401 / 403 | `AuthFailure` |
//! | any other non-2xx | `UpstreamFormatFailure` (with status) |
//! | 2xx without `choices[0].message.content` | `UpstreamFormatFailure` |
//!
//! There is exactly one attempt per call. Retrying is a policy decision
//! left to whoever owns the request.

use crate::config::{AnalyzerConfig, ApiKey};
use crate::error::AnalyzeError;
use crate::prompts::{Prompt, DEFAULT_SYSTEM_PROMPT};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::debug;

/// The unprocessed reply text of one completion. Untrusted: no structure is
/// guaranteed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCompletion(String);

impl RawCompletion {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters.
    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }
}

impl fmt::Display for RawCompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Anything that can turn a prompt into a raw model reply.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send one request and return the reply text.
    async fn complete(&self, prompt: &Prompt) -> Result<RawCompletion, AnalyzeError>;

    /// Short name used in logs and error messages.
    fn name(&self) -> &str;
}

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatReply>,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

// ── HTTP implementation ──────────────────────────────────────────────────────

/// Chat-completion client for DeepSeek and other OpenAI-compatible APIs.
pub struct ChatCompletionClient {
    client: Client,
    api_key: ApiKey,
    endpoint: String,
    provider: String,
    model: String,
    system_prompt: String,
    temperature: f32,
    max_tokens: u32,
    timeout_secs: u64,
}

impl fmt::Debug for ChatCompletionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatCompletionClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ChatCompletionClient {
    /// Build a client from the generation settings in `config`.
    ///
    /// `api_key` is passed separately so a config without a key can never
    /// produce a client.
    pub fn new(api_key: ApiKey, config: &AnalyzerConfig) -> Result<Self, AnalyzeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AnalyzeError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let endpoint = config.completions_url();
        let provider = reqwest::Url::parse(&endpoint)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| endpoint.clone());

        Ok(Self {
            client,
            api_key,
            endpoint,
            provider,
            model: config.model.clone(),
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout_secs: config.timeout_secs,
        })
    }

    fn network_error(&self, e: reqwest::Error) -> AnalyzeError {
        let detail = if e.is_timeout() {
            format!("request timed out after {}s", self.timeout_secs)
        } else if e.is_connect() {
            format!("connection failed: {}", e)
        } else {
            e.to_string()
        };
        AnalyzeError::NetworkFailure {
            provider: self.provider.clone(),
            detail,
        }
    }

    fn format_error(&self, status: Option<StatusCode>, detail: impl Into<String>) -> AnalyzeError {
        AnalyzeError::UpstreamFormatFailure {
            provider: self.provider.clone(),
            status: status.map(|s| s.as_u16()),
            detail: detail.into(),
        }
    }
}

#[async_trait]
impl CompletionClient for ChatCompletionClient {
    async fn complete(&self, prompt: &Prompt) -> Result<RawCompletion, AnalyzeError> {
        let start = Instant::now();
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: prompt.as_str(),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.network_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.network_error(e))?;
        debug!(
            "{} responded HTTP {} ({} bytes) in {:?}",
            self.provider,
            status,
            body.len(),
            start.elapsed()
        );

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
                return Err(AnalyzeError::AuthFailure {
                    provider: self.provider.clone(),
                    status: status.as_u16(),
                    detail: message,
                });
            }
            return Err(self.format_error(Some(status), message));
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| self.format_error(None, format!("response is not valid JSON: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .map(RawCompletion)
            .ok_or_else(|| self.format_error(None, "response has no choices[0].message.content"))
    }

    fn name(&self) -> &str {
        &self.provider
    }
}
