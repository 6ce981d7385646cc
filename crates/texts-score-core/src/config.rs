//! Settings for the generation client and the retry policy.
//!
//! The scoring core reads these as opaque values; only the CLI and the
//! session bootstrap construct them.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ScoreError, ScoreResult};

/// Connection and sampling settings for the generation collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model id sent with every request.
    #[serde(default = "default_model")]
    pub model: String,

    /// API key. Falls back to `OPENAI_API_KEY` in `from_env`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Azure resource endpoint, e.g. `https://my-resource.openai.azure.com`.
    /// When unset the public OpenAI endpoint is used.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Azure deployment name.
    #[serde(default)]
    pub deployment: Option<String>,

    /// Azure API version query parameter.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default)]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_version() -> String {
    "2024-06-01".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_timeout() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            endpoint: None,
            deployment: None,
            api_version: default_api_version(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout(),
        }
    }
}

impl LlmConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `TEXTS_SCORE_LLM_MODEL` | Model id |
    /// | `TEXTS_SCORE_LLM_API_KEY` | API key (falls back to `OPENAI_API_KEY`) |
    /// | `TEXTS_SCORE_LLM_ENDPOINT` | Azure endpoint |
    /// | `TEXTS_SCORE_LLM_DEPLOYMENT` | Azure deployment |
    /// | `TEXTS_SCORE_LLM_API_VERSION` | Azure API version |
    /// | `TEXTS_SCORE_LLM_TEMPERATURE` | Sampling temperature |
    /// | `TEXTS_SCORE_LLM_MAX_TOKENS` | Max output tokens |
    /// | `TEXTS_SCORE_LLM_TIMEOUT` | Request timeout in seconds |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            model: env_string("TEXTS_SCORE_LLM_MODEL").unwrap_or(defaults.model),
            api_key: env_string("TEXTS_SCORE_LLM_API_KEY").or_else(|| env_string("OPENAI_API_KEY")),
            endpoint: env_string("TEXTS_SCORE_LLM_ENDPOINT"),
            deployment: env_string("TEXTS_SCORE_LLM_DEPLOYMENT"),
            api_version: env_string("TEXTS_SCORE_LLM_API_VERSION")
                .unwrap_or(defaults.api_version),
            temperature: env_parse("TEXTS_SCORE_LLM_TEMPERATURE").unwrap_or(defaults.temperature),
            max_tokens: env_parse("TEXTS_SCORE_LLM_MAX_TOKENS").unwrap_or(defaults.max_tokens),
            timeout_secs: env_parse("TEXTS_SCORE_LLM_TIMEOUT").unwrap_or(defaults.timeout_secs),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Route requests to an Azure OpenAI deployment.
    pub fn with_azure(
        mut self,
        endpoint: impl Into<String>,
        deployment: impl Into<String>,
    ) -> Self {
        self.endpoint = Some(endpoint.into());
        self.deployment = Some(deployment.into());
        self
    }

    /// Override the endpoint only (OpenAI-compatible servers, tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Bounded retry for one scoring round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay of the exponential backoff, in milliseconds. Zero disables sleeping.
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,

    /// Cap on a single backoff delay, in milliseconds.
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

/// Default retry cap for a scoring round.
pub const MAX_RETRY_ON_ERROR: u32 = 5;

fn default_max_retries() -> u32 {
    MAX_RETRY_ON_ERROR
}

fn default_base_delay() -> u64 {
    250
}

fn default_max_delay() -> u64 {
    4_000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}

impl RetryPolicy {
    /// Default cap, no sleeping between attempts.
    pub fn immediate() -> Self {
        Self::default().without_backoff()
    }

    pub fn without_backoff(mut self) -> Self {
        self.base_delay_ms = 0;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Upper bound of the jittered delay before retry number `retry` (1-based).
    pub fn backoff_ceiling(&self, retry: u32) -> Duration {
        if self.base_delay_ms == 0 {
            return Duration::ZERO;
        }
        let shift = retry.saturating_sub(1).min(16);
        let ms = self.base_delay_ms.saturating_mul(1 << shift);
        Duration::from_millis(ms.min(self.max_delay_ms))
    }

    /// Read `TEXTS_SCORE_MAX_RETRIES` and `TEXTS_SCORE_RETRY_BASE_MS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_retries: env_parse("TEXTS_SCORE_MAX_RETRIES").unwrap_or(defaults.max_retries),
            base_delay_ms: env_parse("TEXTS_SCORE_RETRY_BASE_MS")
                .unwrap_or(defaults.base_delay_ms),
            max_delay_ms: defaults.max_delay_ms,
        }
    }
}

/// Everything a scoring session needs, as loaded from YAML.
///
/// ```yaml
/// llm:
///   model: gpt-4o-mini
///   endpoint: https://my-resource.openai.azure.com
///   deployment: scoring
/// retry:
///   max_retries: 5
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            llm: LlmConfig::from_env(),
            retry: RetryPolicy::from_env(),
        }
    }

    pub fn from_yaml_str(raw: &str) -> ScoreResult<Self> {
        serde_yaml::from_str(raw)
            .map_err(|e| ScoreError::config(format!("failed to parse settings YAML: {}", e)))
    }

    pub fn load(path: &Path) -> ScoreResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ScoreError::config(format!(
                "failed to read settings file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml_str(&raw)
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.trim().parse().ok())
}
