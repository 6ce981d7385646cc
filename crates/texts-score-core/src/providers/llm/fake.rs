use super::{ChatRequest, LlmClient, LlmResponse, Stage};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum FakeReply {
    Text(String),
    Error(String),
}

impl FakeReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }
}

#[derive(Debug, Default)]
struct Script {
    queued: VecDeque<FakeReply>,
    fallback: Option<FakeReply>,
    calls: u32,
}

impl Script {
    fn next(&mut self) -> Option<FakeReply> {
        self.calls += 1;
        self.queued.pop_front().or_else(|| self.fallback.clone())
    }
}

/// Offline client that answers from per-stage scripts.
///
/// Queued replies are consumed first; once a stage's queue is empty its
/// fallback reply is repeated.
#[derive(Debug)]
pub struct FakeClient {
    model: String,
    questions: Mutex<Script>,
    answers: Mutex<Script>,
}

impl FakeClient {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            questions: Mutex::new(Script::default()),
            answers: Mutex::new(Script::default()),
        }
    }

    /// Fallback reply for question generation.
    pub fn with_questions(self, reply: FakeReply) -> Self {
        self.script(Stage::Questions).fallback = Some(reply);
        self
    }

    /// Fallback reply for answer evaluation.
    pub fn with_answers(self, reply: FakeReply) -> Self {
        self.script(Stage::Answers).fallback = Some(reply);
        self
    }

    /// Queue a one-shot reply ahead of the fallback.
    pub fn queue(self, stage: Stage, reply: FakeReply) -> Self {
        self.script(stage).queued.push_back(reply);
        self
    }

    /// Requests seen so far for `stage`.
    pub fn calls(&self, stage: Stage) -> u32 {
        self.script(stage).calls
    }

    fn script(&self, stage: Stage) -> std::sync::MutexGuard<'_, Script> {
        let slot = match stage {
            Stage::Questions => &self.questions,
            Stage::Answers => &self.answers,
        };
        slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl LlmClient for FakeClient {
    async fn complete(&self, request: &ChatRequest) -> anyhow::Result<LlmResponse> {
        let reply = self.script(request.stage).next();
        match reply {
            Some(FakeReply::Text(text)) => Ok(LlmResponse {
                text,
                provider: "fake".to_string(),
                model: self.model.clone(),
            }),
            Some(FakeReply::Error(message)) => anyhow::bail!(message),
            None => anyhow::bail!("fake client has no scripted reply for {}", request.stage),
        }
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}
