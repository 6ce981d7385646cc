use super::{ChatRequest, LlmClient, LlmResponse};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info_span, Instrument};

/// Wraps a client in a `gen_ai.client.request` span per call.
///
/// Prompts and completions are never recorded; only sizes, model and outcome.
pub struct TracingLlmClient {
    inner: Arc<dyn LlmClient>,
}

impl TracingLlmClient {
    pub fn new(inner: Arc<dyn LlmClient>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl LlmClient for TracingLlmClient {
    async fn complete(&self, request: &ChatRequest) -> anyhow::Result<LlmResponse> {
        let span = info_span!(
            "gen_ai.client.request",
            "gen_ai.system" = self.inner.provider_name(),
            "gen_ai.request.model" = request.model.as_str(),
            "gen_ai.request.max_tokens" = request.max_tokens,
            "gen_ai.request.temperature" = request.temperature as f64,
            "texts_score.stage" = request.stage.as_str(),
            "texts_score.messages" = request.messages.len(),
            "gen_ai.response.model" = tracing::field::Empty,
            "texts_score.response_chars" = tracing::field::Empty,
            "duration_ms" = tracing::field::Empty,
            "error" = tracing::field::Empty,
            "error.message" = tracing::field::Empty
        );

        async move {
            let start = std::time::Instant::now();
            let result = self.inner.complete(request).await;

            let span = tracing::Span::current();
            span.record("duration_ms", start.elapsed().as_millis() as u64);
            match &result {
                Ok(resp) => {
                    span.record("gen_ai.response.model", resp.model.as_str());
                    span.record("texts_score.response_chars", resp.text.chars().count() as u64);
                }
                Err(e) => {
                    span.record("error", true);
                    span.record("error.message", e.to_string().as_str());
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::llm::fake::{FakeClient, FakeReply};
    use crate::providers::llm::Stage;

    #[tokio::test]
    async fn passes_results_through() {
        let inner = Arc::new(
            FakeClient::new("fake")
                .with_questions(FakeReply::text("{}"))
                .with_answers(FakeReply::error("down")),
        );
        let client = TracingLlmClient::new(inner);
        assert_eq!(client.provider_name(), "fake");

        let mut request = ChatRequest {
            model: "m".into(),
            messages: vec![],
            max_tokens: 8,
            temperature: 0.0,
            stage: Stage::Questions,
        };
        assert_eq!(client.complete(&request).await.unwrap().text, "{}");

        request.stage = Stage::Answers;
        let err = client.complete(&request).await.unwrap_err();
        assert!(err.to_string().contains("down"));
    }
}
