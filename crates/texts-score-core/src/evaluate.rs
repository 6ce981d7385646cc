//! Answer evaluation: one model call judging a candidate text against a question set.

use tracing::debug;

use crate::context::ScoringContext;
use crate::error::{ScoreError, ScoreResult};
use crate::payload;
use crate::prompt;
use crate::providers::llm::Stage;
use crate::questions::QuestionSet;

/// Outcome for one question: 1.0 when the text answers it correctly, 0.0 otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Judgment {
    pub value: f64,
}

/// Parse an evaluation response: `{"list": [{"answer": 1|0|true|false, ...}, ...]}`.
pub fn parse_judgments(text: &str) -> ScoreResult<Vec<Judgment>> {
    let value = payload::parse_json(Stage::Answers, text)?;
    let list = value
        .get("list")
        .and_then(|v| v.as_array())
        .ok_or_else(|| ScoreError::parse(Stage::Answers, "missing 'list' array"))?;

    list.iter()
        .enumerate()
        .map(|(idx, item)| {
            let answer = item.get("answer").ok_or_else(|| {
                ScoreError::parse(Stage::Answers, format!("entry {} has no 'answer'", idx))
            })?;
            let value = match answer {
                serde_json::Value::Bool(b) => f64::from(u8::from(*b)),
                serde_json::Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
                other => {
                    return Err(ScoreError::parse(
                        Stage::Answers,
                        format!("entry {} has non-numeric answer {}", idx, other),
                    ))
                }
            };
            if !(0.0..=1.0).contains(&value) {
                return Err(ScoreError::parse(
                    Stage::Answers,
                    format!("entry {} answer {} is outside [0, 1]", idx, answer),
                ));
            }
            Ok(Judgment { value })
        })
        .collect()
}

/// Judge `candidate_text` against `questions`, one judgment per question in order.
///
/// Does not retry; failures surface to the caller's round.
pub async fn evaluate(
    ctx: &ScoringContext,
    candidate_text: &str,
    questions: &QuestionSet,
) -> ScoreResult<Vec<Judgment>> {
    if questions.is_empty() {
        return Ok(Vec::new());
    }

    let request = ctx.request(
        Stage::Answers,
        prompt::answers_messages(candidate_text, &questions.to_prompt_json()),
    );
    let resp = ctx
        .client()
        .complete(&request)
        .await
        .map_err(|e| ScoreError::provider(Stage::Answers, &e))?;

    let judgments = parse_judgments(&resp.text)?;
    if judgments.len() != questions.len() {
        return Err(ScoreError::JudgmentCountMismatch {
            questions: questions.len(),
            judgments: judgments.len(),
        });
    }
    debug!(judgments = judgments.len(), model = %resp.model, "evaluated answers");
    Ok(judgments)
}

/// Mean judgment value; an empty set has no score.
pub fn directional_score(judgments: &[Judgment]) -> ScoreResult<f64> {
    if judgments.is_empty() {
        return Err(ScoreError::EmptyJudgments);
    }
    let sum: f64 = judgments.iter().map(|j| j.value).sum();
    Ok(sum / judgments.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_and_boolean_answers() {
        let judgments = parse_judgments(
            r#"{"list": [{"question": "a", "answer": 1}, {"question": "b", "answer": false}, {"answer": true}]}"#,
        )
        .unwrap();
        let values: Vec<f64> = judgments.iter().map(|j| j.value).collect();
        assert_eq!(values, [1.0, 0.0, 1.0]);
    }

    #[test]
    fn missing_list_or_answer_is_malformed() {
        assert!(parse_judgments(r#"{"answers": []}"#).is_err());
        let err = parse_judgments(r#"{"list": [{"answer": 1}, {"question": "x"}]}"#).unwrap_err();
        assert!(err.to_string().contains("entry 1"));
        assert!(parse_judgments(r#"{"list": [{"answer": "yes"}]}"#).is_err());
        assert!(parse_judgments(r#"{"list": [{"answer": 3}]}"#).is_err());
    }

    #[test]
    fn score_is_mean_of_judgments() {
        let js = [1.0, 1.0, 0.0].map(|value| Judgment { value });
        assert_eq!(directional_score(&js).unwrap(), 2.0 / 3.0);
    }

    #[test]
    fn empty_judgments_are_an_error_not_zero() {
        assert!(matches!(
            directional_score(&[]),
            Err(ScoreError::EmptyJudgments)
        ));
    }
}
