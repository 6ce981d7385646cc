use std::sync::Arc;

use crate::config::{LlmConfig, RetryPolicy, Settings};
use crate::error::{ScoreError, ScoreResult};
use crate::providers::llm::openai::OpenAIClient;
use crate::providers::llm::tracing::TracingLlmClient;
use crate::providers::llm::{ChatMessage, ChatRequest, LlmClient, Stage};

/// Handle every scoring stage runs against.
///
/// Built once per session and passed by reference; it holds no per-call state.
#[derive(Clone)]
pub struct ScoringContext {
    client: Arc<dyn LlmClient>,
    llm: LlmConfig,
    retry: RetryPolicy,
}

impl ScoringContext {
    pub fn new(client: Arc<dyn LlmClient>, llm: LlmConfig, retry: RetryPolicy) -> Self {
        Self { client, llm, retry }
    }

    /// Build a traced OpenAI/Azure client from settings.
    pub fn from_settings(settings: Settings) -> ScoreResult<Self> {
        let client = OpenAIClient::new(&settings.llm)
            .map_err(|e| ScoreError::config(format!("{:#}", e)))?;
        let client: Arc<dyn LlmClient> = Arc::new(TracingLlmClient::new(Arc::new(client)));
        Ok(Self::new(client, settings.llm, settings.retry))
    }

    pub fn from_env() -> ScoreResult<Self> {
        Self::from_settings(Settings::from_env())
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn client(&self) -> &Arc<dyn LlmClient> {
        &self.client
    }

    pub fn llm(&self) -> &LlmConfig {
        &self.llm
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    pub(crate) fn request(&self, stage: Stage, messages: Vec<ChatMessage>) -> ChatRequest {
        ChatRequest {
            model: self.llm.model.clone(),
            messages,
            max_tokens: self.llm.max_tokens,
            temperature: self.llm.temperature,
            stage,
        }
    }
}

impl std::fmt::Debug for ScoringContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoringContext")
            .field("provider", &self.client.provider_name())
            .field("model", &self.llm.model)
            .field("retry", &self.retry)
            .finish()
    }
}
