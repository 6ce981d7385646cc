//! One-sided scoring: questions from a base text, judged against an answer text.

use tracing::debug;

use crate::context::ScoringContext;
use crate::error::ScoreResult;
use crate::evaluate::{directional_score, evaluate};
use crate::questions::generate_questions;
use crate::retry::with_retry;

/// One round without retry: fresh questions, fresh evaluation, mean of judgments.
pub(crate) async fn score_round(
    ctx: &ScoringContext,
    base_text: &str,
    answer_text: &str,
) -> ScoreResult<f64> {
    let questions = generate_questions(ctx, base_text).await?;
    let judgments = evaluate(ctx, answer_text, &questions).await?;
    directional_score(&judgments)
}

/// Fraction of questions drawn from `base_text` that `answer_text` answers correctly.
///
/// Every retry is a full restart with a newly generated question set.
pub async fn score_one_side(
    ctx: &ScoringContext,
    base_text: &str,
    answer_text: &str,
    retry_on_error: bool,
) -> ScoreResult<f64> {
    let score = with_retry(ctx.retry(), retry_on_error, "score_one_side", || {
        score_round(ctx, base_text, answer_text)
    })
    .await?;
    debug!(score, "one-sided score");
    Ok(score)
}
