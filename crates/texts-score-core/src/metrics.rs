//! Precision, recall and F1 over the two scoring directions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::context::ScoringContext;
use crate::error::{ScoreError, ScoreResult};
use crate::scorer::score_one_side;

/// Which metric a scalar score represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreType {
    F1,
    Precision,
    Recall,
}

impl ScoreType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreType::F1 => "f1",
            ScoreType::Precision => "precision",
            ScoreType::Recall => "recall",
        }
    }
}

impl fmt::Display for ScoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoreType {
    type Err = ScoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "f1" => Ok(ScoreType::F1),
            "precision" => Ok(ScoreType::Precision),
            "recall" => Ok(ScoreType::Recall),
            _ => Err(ScoreError::UnknownScoreType(s.to_string())),
        }
    }
}

/// Harmonic mean of precision and recall; 0 when both are 0.
pub fn f1_score(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        return 0.0;
    }
    (2.0 * precision * recall) / (precision + recall)
}

/// How much of what `given` asserts is supported by `expected`.
pub async fn texts_evaluate_precision(
    ctx: &ScoringContext,
    expected: &str,
    given: &str,
    retry_on_error: bool,
) -> ScoreResult<f64> {
    score_one_side(ctx, given, expected, retry_on_error).await
}

/// How much of what `expected` asserts is covered by `given`.
pub async fn texts_evaluate_recall(
    ctx: &ScoringContext,
    expected: &str,
    given: &str,
    retry_on_error: bool,
) -> ScoreResult<f64> {
    score_one_side(ctx, expected, given, retry_on_error).await
}

pub async fn texts_evaluate_f1(
    ctx: &ScoringContext,
    expected: &str,
    given: &str,
    retry_on_error: bool,
) -> ScoreResult<f64> {
    let precision = texts_evaluate_precision(ctx, expected, given, retry_on_error).await?;
    let recall = texts_evaluate_recall(ctx, expected, given, retry_on_error).await?;
    Ok(f1_score(precision, recall))
}

/// Score `expected`/`given` with the metric named by `score_type`.
pub async fn texts_evaluate(
    ctx: &ScoringContext,
    score_type: ScoreType,
    expected: &str,
    given: &str,
    retry_on_error: bool,
) -> ScoreResult<f64> {
    match score_type {
        ScoreType::F1 => texts_evaluate_f1(ctx, expected, given, retry_on_error).await,
        ScoreType::Precision => {
            texts_evaluate_precision(ctx, expected, given, retry_on_error).await
        }
        ScoreType::Recall => texts_evaluate_recall(ctx, expected, given, retry_on_error).await,
    }
}
