//! Question generation: one model call turning a base text into probe questions.

use serde::Serialize;
use tracing::debug;

use crate::context::ScoringContext;
use crate::error::{ScoreError, ScoreResult};
use crate::payload;
use crate::prompt;
use crate::providers::llm::Stage;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    /// Key the model gave the question.
    pub id: String,
    pub text: String,
}

/// Ordered questions from exactly one generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionSet {
    questions: Vec<Question>,
}

impl QuestionSet {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }

    /// JSON object `{id: text}` in question order, as sent to the evaluator.
    pub fn to_prompt_json(&self) -> String {
        let map: serde_json::Map<String, serde_json::Value> = self
            .questions
            .iter()
            .map(|q| (q.id.clone(), serde_json::Value::String(q.text.clone())))
            .collect();
        serde_json::Value::Object(map).to_string()
    }

    /// Parse a generation response: a JSON object whose values are question strings.
    pub fn parse(text: &str) -> ScoreResult<Self> {
        let value = payload::parse_json(Stage::Questions, text)?;
        let serde_json::Value::Object(map) = value else {
            return Err(ScoreError::parse(
                Stage::Questions,
                "expected a JSON object mapping ids to questions",
            ));
        };

        let mut questions = Vec::with_capacity(map.len());
        for (id, value) in map {
            let text = value.as_str().ok_or_else(|| {
                ScoreError::parse(
                    Stage::Questions,
                    format!("question '{}' is not a string", id),
                )
            })?;
            let text = text.trim();
            if text.is_empty() {
                return Err(ScoreError::parse(
                    Stage::Questions,
                    format!("question '{}' is empty", id),
                ));
            }
            questions.push(Question {
                id,
                text: text.to_string(),
            });
        }
        Ok(Self { questions })
    }
}

/// Ask the model for probe questions about `source_text`.
///
/// Does not retry; failures surface to the caller's round.
pub async fn generate_questions(
    ctx: &ScoringContext,
    source_text: &str,
) -> ScoreResult<QuestionSet> {
    let request = ctx.request(Stage::Questions, prompt::questions_messages(source_text));
    let resp = ctx
        .client()
        .complete(&request)
        .await
        .map_err(|e| ScoreError::provider(Stage::Questions, &e))?;

    let set = QuestionSet::parse(&resp.text)?;
    debug!(questions = set.len(), model = %resp.model, "generated questions");
    Ok(set)
}
