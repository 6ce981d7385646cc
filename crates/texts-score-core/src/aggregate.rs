//! Repeated scoring rounds and their statistical reduction.
//!
//! A round generates its question set(s) once and evaluates against them
//! `each_question_runs` times, so one aggregated call makes
//! `full_runs` generation calls per direction and
//! `full_runs * each_question_runs` evaluation calls per direction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::ScoringContext;
use crate::error::{ScoreError, ScoreResult};
use crate::evaluate::{directional_score, evaluate};
use crate::metrics::{f1_score, ScoreType};
use crate::questions::{generate_questions, QuestionSet};
use crate::retry::with_retry;

/// Reduction applied over the collected scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggType {
    Minimum,
    Maximum,
    Median,
    /// Arithmetic mean; `average` parses to this as well.
    #[serde(alias = "average")]
    Mean,
}

impl AggType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggType::Minimum => "minimum",
            AggType::Maximum => "maximum",
            AggType::Median => "median",
            AggType::Mean => "mean",
        }
    }
}

impl fmt::Display for AggType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggType {
    type Err = ScoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minimum" | "min" => Ok(AggType::Minimum),
            "maximum" | "max" => Ok(AggType::Maximum),
            "median" => Ok(AggType::Median),
            "mean" | "average" => Ok(AggType::Mean),
            _ => Err(ScoreError::UnknownAggregation(s.to_string())),
        }
    }
}

/// Reduce `scores` with `agg_type`.
pub fn scores_agg(scores: &[f64], agg_type: AggType) -> ScoreResult<f64> {
    if scores.is_empty() {
        return Err(ScoreError::EmptyScores);
    }
    let value = match agg_type {
        AggType::Minimum => scores.iter().copied().fold(f64::INFINITY, f64::min),
        AggType::Maximum => scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        AggType::Median => {
            let mut sorted = scores.to_vec();
            sorted.sort_by(f64::total_cmp);
            let mid = sorted.len() / 2;
            if sorted.len() % 2 == 0 {
                (sorted[mid - 1] + sorted[mid]) / 2.0
            } else {
                sorted[mid]
            }
        }
        AggType::Mean => scores.iter().sum::<f64>() / scores.len() as f64,
    };
    Ok(value)
}

/// One evaluation inside one round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunSample {
    pub round: u32,
    pub repetition: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recall: Option<f64>,
    /// The value for the requested metric.
    pub score: f64,
}

/// Samples of one aggregated call, in round-major order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunResult {
    pub score_type: Option<ScoreType>,
    pub samples: Vec<RunSample>,
}

impl RunResult {
    pub fn scores(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.score).collect()
    }

    pub fn aggregate(&self, agg_type: AggType) -> ScoreResult<f64> {
        scores_agg(&self.scores(), agg_type)
    }
}

/// Question sets generated once per round.
enum RoundQuestions {
    Precision(QuestionSet),
    Recall(QuestionSet),
    F1 {
        precision: QuestionSet,
        recall: QuestionSet,
    },
}

impl RoundQuestions {
    async fn generate(
        ctx: &ScoringContext,
        score_type: ScoreType,
        expected: &str,
        given: &str,
    ) -> ScoreResult<Self> {
        Ok(match score_type {
            ScoreType::Precision => Self::Precision(generate_questions(ctx, given).await?),
            ScoreType::Recall => Self::Recall(generate_questions(ctx, expected).await?),
            ScoreType::F1 => Self::F1 {
                precision: generate_questions(ctx, given).await?,
                recall: generate_questions(ctx, expected).await?,
            },
        })
    }

    /// Evaluate once against the held sets: `(precision, recall, score)`.
    async fn evaluate(
        &self,
        ctx: &ScoringContext,
        expected: &str,
        given: &str,
    ) -> ScoreResult<(Option<f64>, Option<f64>, f64)> {
        Ok(match self {
            Self::Precision(set) => {
                let p = directional_score(&evaluate(ctx, expected, set).await?)?;
                (Some(p), None, p)
            }
            Self::Recall(set) => {
                let r = directional_score(&evaluate(ctx, given, set).await?)?;
                (None, Some(r), r)
            }
            Self::F1 { precision, recall } => {
                let p = directional_score(&evaluate(ctx, expected, precision).await?)?;
                let r = directional_score(&evaluate(ctx, given, recall).await?)?;
                (Some(p), Some(r), f1_score(p, r))
            }
        })
    }
}

async fn run_round(
    ctx: &ScoringContext,
    score_type: ScoreType,
    expected: &str,
    given: &str,
    round: u32,
    each_question_runs: u32,
) -> ScoreResult<Vec<RunSample>> {
    let questions = RoundQuestions::generate(ctx, score_type, expected, given).await?;

    let mut samples = Vec::with_capacity(each_question_runs as usize);
    for repetition in 0..each_question_runs {
        let (precision, recall, score) = questions.evaluate(ctx, expected, given).await?;
        samples.push(RunSample {
            round,
            repetition,
            precision,
            recall,
            score,
        });
    }
    Ok(samples)
}

/// Run `full_runs` rounds of `each_question_runs` evaluations each.
///
/// Retries are scoped per round: a failed round is restarted from question
/// generation and its partial samples are dropped.
pub async fn texts_multiple(
    ctx: &ScoringContext,
    score_type: ScoreType,
    expected: &str,
    given: &str,
    full_runs: u32,
    each_question_runs: u32,
    retry_on_error: bool,
) -> ScoreResult<RunResult> {
    let mut samples = Vec::with_capacity(full_runs.saturating_mul(each_question_runs) as usize);
    for round in 0..full_runs {
        let scope = format!("{} round {}", score_type, round);
        let round_samples = with_retry(ctx.retry(), retry_on_error, &scope, || {
            run_round(ctx, score_type, expected, given, round, each_question_runs)
        })
        .await?;
        samples.extend(round_samples);
    }
    debug!(
        score_type = %score_type,
        samples = samples.len(),
        "collected run samples"
    );
    Ok(RunResult {
        score_type: Some(score_type),
        samples,
    })
}

pub async fn texts_multiple_f1(
    ctx: &ScoringContext,
    expected: &str,
    given: &str,
    full_runs: u32,
    each_question_runs: u32,
    retry_on_error: bool,
) -> ScoreResult<RunResult> {
    texts_multiple(
        ctx,
        ScoreType::F1,
        expected,
        given,
        full_runs,
        each_question_runs,
        retry_on_error,
    )
    .await
}

pub async fn texts_multiple_precision(
    ctx: &ScoringContext,
    expected: &str,
    given: &str,
    full_runs: u32,
    each_question_runs: u32,
    retry_on_error: bool,
) -> ScoreResult<RunResult> {
    texts_multiple(
        ctx,
        ScoreType::Precision,
        expected,
        given,
        full_runs,
        each_question_runs,
        retry_on_error,
    )
    .await
}

pub async fn texts_multiple_recall(
    ctx: &ScoringContext,
    expected: &str,
    given: &str,
    full_runs: u32,
    each_question_runs: u32,
    retry_on_error: bool,
) -> ScoreResult<RunResult> {
    texts_multiple(
        ctx,
        ScoreType::Recall,
        expected,
        given,
        full_runs,
        each_question_runs,
        retry_on_error,
    )
    .await
}

/// Run the rounds and reduce them to one value.
#[allow(clippy::too_many_arguments)]
pub async fn texts_agg(
    ctx: &ScoringContext,
    score_type: ScoreType,
    expected: &str,
    given: &str,
    full_runs: u32,
    each_question_runs: u32,
    agg_type: AggType,
    retry_on_error: bool,
) -> ScoreResult<f64> {
    texts_multiple(ctx, score_type, expected, given, full_runs, each_question_runs, retry_on_error)
        .await?
        .aggregate(agg_type)
}
