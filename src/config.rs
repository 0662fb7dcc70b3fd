//! Configuration types for resume analysis.
//!
//! All analysis behaviour is controlled through [`AnalyzerConfig`], built via
//! its [`AnalyzerConfigBuilder`] or read once from the process environment
//! with [`AnalyzerConfig::from_env`]. The config is immutable after `build()`
//! and cheap to clone, so one instance can be shared by every request.
//!
//! The API key is carried explicitly in the config rather than read from the
//! environment deep inside the client; tests inject fake keys or a fake
//! [`CompletionClient`] the same way production injects the real one.

use crate::error::AnalyzeError;
use crate::pipeline::llm::CompletionClient;
use crate::progress::ProgressCallback;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::sync::Arc;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "DEEPSEEK_API_KEY";
/// Optional override of [`DEFAULT_BASE_URL`].
pub const BASE_URL_ENV: &str = "DEEPSEEK_BASE_URL";
/// Optional override of [`DEFAULT_MODEL`].
pub const MODEL_ENV: &str = "DEEPSEEK_MODEL";

pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";
pub const DEFAULT_MODEL: &str = "deepseek-chat";

/// Bearer credential for the completion service. `Debug` never shows it.
#[derive(Clone)]
pub struct ApiKey(SecretString);

impl ApiKey {
    /// Returns `None` for an empty or whitespace-only key.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            None
        } else {
            Some(Self(SecretString::new(key.trim().to_string())))
        }
    }

    pub(crate) fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Configuration for the analysis pipeline.
///
/// # Example
/// ```rust
/// use resume_insight::AnalyzerConfig;
///
/// let config = AnalyzerConfig::builder()
///     .api_key("sk-test")
///     .model("deepseek-chat")
///     .timeout_secs(20)
///     .build()
///     .unwrap();
/// assert!(config.api_key.is_some());
/// ```
#[derive(Clone)]
pub struct AnalyzerConfig {
    /// Bearer token for the completion service. `None` disables analysis:
    /// every call fails with `ServiceUnavailable`.
    pub api_key: Option<ApiKey>,

    /// Base URL of the chat-completion API; requests go to
    /// `{base_url}/chat/completions`. Default: [`DEFAULT_BASE_URL`].
    pub base_url: String,

    /// Model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Sampling temperature. Default: 0.5.
    ///
    /// Low enough that the JSON shape is followed reliably, high enough that
    /// suggestions do not read like boilerplate.
    pub temperature: f32,

    /// Upper bound on generated tokens. Default: 800.
    ///
    /// A summary, ten keywords and five suggestions fit comfortably; the cap
    /// bounds cost and latency when a model rambles.
    pub max_tokens: u32,

    /// Whole-request timeout in seconds. Default: 30.
    pub timeout_secs: u64,

    /// Custom system prompt. If None, uses [`crate::prompts::DEFAULT_SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,

    /// Pre-constructed completion client. Takes precedence over `api_key`.
    pub client: Option<Arc<dyn CompletionClient>>,

    /// Optional stage-event observer.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.5,
            max_tokens: 800,
            timeout_secs: 30,
            system_prompt: None,
            client: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AnalyzerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerConfig")
            .field("api_key", &self.api_key)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("system_prompt", &self.system_prompt.as_ref().map(|p| p.len()))
            .field("client", &self.client.as_ref().map(|c| c.name().to_string()))
            .field("progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

impl AnalyzerConfig {
    /// Create a new builder for `AnalyzerConfig`.
    pub fn builder() -> AnalyzerConfigBuilder {
        AnalyzerConfigBuilder {
            config: Self::default(),
        }
    }

    /// Read the configuration from the process environment.
    ///
    /// A missing or empty `DEEPSEEK_API_KEY` is not an error: the config is
    /// returned without a key and analysis degrades to `ServiceUnavailable`.
    pub fn from_env() -> Result<Self, AnalyzeError> {
        let mut builder = Self::builder();
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            builder = builder.api_key(key);
        }
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                builder = builder.base_url(url);
            }
        }
        if let Ok(model) = std::env::var(MODEL_ENV) {
            if !model.trim().is_empty() {
                builder = builder.model(model);
            }
        }
        builder.build()
    }

    /// Whether a completion client can be constructed from this config.
    pub fn has_credentials(&self) -> bool {
        self.client.is_some() || self.api_key.is_some()
    }

    /// `{base_url}/chat/completions`, tolerating a trailing slash.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Builder for [`AnalyzerConfig`].
#[derive(Debug)]
pub struct AnalyzerConfigBuilder {
    config: AnalyzerConfig,
}

impl AnalyzerConfigBuilder {
    /// Empty keys are treated as absent.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = ApiKey::new(key);
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: u32) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn client(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.config.client = Some(client);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalyzerConfig, AnalyzeError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(AnalyzeError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        if c.timeout_secs == 0 {
            return Err(AnalyzeError::InvalidConfig("timeout_secs must be ≥ 1".into()));
        }
        if c.model.trim().is_empty() {
            return Err(AnalyzeError::InvalidConfig("model must not be empty".into()));
        }
        let url = reqwest::Url::parse(&c.base_url).map_err(|e| {
            AnalyzeError::InvalidConfig(format!("base_url '{}' is not a URL: {}", c.base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AnalyzeError::InvalidConfig(format!(
                "base_url must be http(s), got '{}'",
                c.base_url
            )));
        }
        Ok(self.config)
    }
}
