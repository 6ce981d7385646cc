use super::{ChatRequest, LlmClient, LlmResponse};
use crate::config::LlmConfig;
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    /// Bearer auth against an OpenAI-compatible `/v1/chat/completions`.
    OpenAi { url: String },
    /// `api-key` auth against an Azure deployment.
    Azure { url: String },
}

/// Chat completions client for OpenAI and Azure OpenAI.
pub struct OpenAIClient {
    api_key: String,
    target: Target,
    client: reqwest::Client,
}

impl OpenAIClient {
    pub fn new(config: &LlmConfig) -> anyhow::Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            anyhow::anyhow!(
                "config error: no API key configured for the LLM client (set TEXTS_SCORE_LLM_API_KEY)"
            )
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| anyhow::anyhow!("failed to create HTTP client: {}", e))?;

        Ok(Self {
            api_key,
            target: resolve_target(config),
            client,
        })
    }

    pub fn is_azure(&self) -> bool {
        matches!(self.target, Target::Azure { .. })
    }
}

fn resolve_target(config: &LlmConfig) -> Target {
    match (&config.endpoint, &config.deployment) {
        (Some(endpoint), Some(deployment)) => Target::Azure {
            url: format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                endpoint.trim_end_matches('/'),
                deployment,
                config.api_version
            ),
        },
        (Some(endpoint), None) => Target::OpenAi {
            url: format!("{}/v1/chat/completions", endpoint.trim_end_matches('/')),
        },
        _ => Target::OpenAi {
            url: OPENAI_CHAT_URL.to_string(),
        },
    }
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn complete(&self, request: &ChatRequest) -> anyhow::Result<LlmResponse> {
        let body = json!({
            "model": request.model,
            "messages": request.messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });

        let builder = match &self.target {
            Target::OpenAi { url } => self
                .client
                .post(url)
                .header("Authorization", format!("Bearer {}", self.api_key)),
            Target::Azure { url } => self.client.post(url).header("api-key", &self.api_key),
        };

        debug!(stage = %request.stage, model = %request.model, "sending chat completion");
        let resp = builder
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let error_text = resp.text().await.unwrap_or_else(|_| String::new());
            anyhow::bail!("OpenAI chat API error (status {}): {}", status.as_u16(), error_text);
        }

        let json: serde_json::Value = resp.json().await?;

        // Parse choices[0].message.content
        let text = json
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("OpenAI API response missing content"))?
            .to_string();

        let model = json
            .get("model")
            .and_then(|v| v.as_str())
            .unwrap_or(&request.model)
            .to_string();

        Ok(LlmResponse {
            text,
            provider: self.provider_name().to_string(),
            model,
        })
    }

    fn provider_name(&self) -> &'static str {
        match self.target {
            Target::OpenAi { .. } => "openai",
            Target::Azure { .. } => "azure-openai",
        }
    }
}
