//! Assertion surface: validate bounds, score, and fail when out of range.
//!
//! Every function returns the score it checked on success. A score outside
//! the window is `ScoreError::Assertion`; bad inputs are `ScoreError::Config`
//! and are raised before any model call.

use tracing::info;

use crate::aggregate::{texts_agg, AggType};
use crate::bounds::{
    assert_score, check_range, check_runs, check_target, target_window,
    MINIMAL_EXPECTED_AGG_MAX_DELTA, MINIMAL_EXPECTED_MAX_DELTA,
};
use crate::context::ScoringContext;
use crate::error::ScoreResult;
use crate::metrics::{texts_evaluate, ScoreType};

/// Options for `expect_*_equal`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EqualOptions {
    pub target: f64,
    pub max_delta: f64,
    pub skip_warnings: bool,
    pub retry_on_error: bool,
}

impl Default for EqualOptions {
    fn default() -> Self {
        Self {
            target: 1.0,
            max_delta: 0.2,
            skip_warnings: false,
            retry_on_error: true,
        }
    }
}

impl EqualOptions {
    pub fn target(target: f64) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    pub fn with_max_delta(mut self, max_delta: f64) -> Self {
        self.max_delta = max_delta;
        self
    }

    pub fn skip_warnings(mut self) -> Self {
        self.skip_warnings = true;
        self
    }

    pub fn no_retry(mut self) -> Self {
        self.retry_on_error = false;
        self
    }
}

/// Options for `expect_*_range`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeOptions {
    pub skip_warnings: bool,
    pub retry_on_error: bool,
}

impl Default for RangeOptions {
    fn default() -> Self {
        Self {
            skip_warnings: false,
            retry_on_error: true,
        }
    }
}

/// Options for the aggregated `agg_*` assertions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggOptions {
    pub full_runs: u32,
    pub each_question_runs: u32,
    /// Tolerance around the target of median/mean assertions.
    pub max_delta: f64,
    pub skip_warnings: bool,
    pub retry_on_error: bool,
}

impl Default for AggOptions {
    fn default() -> Self {
        Self {
            full_runs: 5,
            each_question_runs: 1,
            max_delta: 0.1,
            skip_warnings: false,
            retry_on_error: true,
        }
    }
}

impl AggOptions {
    pub fn runs(full_runs: u32, each_question_runs: u32) -> Self {
        Self {
            full_runs,
            each_question_runs,
            ..Self::default()
        }
    }

    pub fn with_max_delta(mut self, max_delta: f64) -> Self {
        self.max_delta = max_delta;
        self
    }

    pub fn no_retry(mut self) -> Self {
        self.retry_on_error = false;
        self
    }
}

/// Assert `score_type` of the pair lies within `target ± max_delta`.
pub async fn expect_equal(
    ctx: &ScoringContext,
    score_type: ScoreType,
    expected: &str,
    given: &str,
    opts: &EqualOptions,
) -> ScoreResult<f64> {
    check_target(
        opts.target,
        opts.max_delta,
        MINIMAL_EXPECTED_MAX_DELTA,
        opts.skip_warnings,
    )?;
    let (min_score, max_score) = target_window(opts.target, opts.max_delta);
    let range = RangeOptions {
        skip_warnings: true,
        retry_on_error: opts.retry_on_error,
    };
    expect_range(ctx, score_type, expected, given, min_score, max_score, &range).await
}

/// Assert `score_type` of the pair lies within `[min_score, max_score]`.
pub async fn expect_range(
    ctx: &ScoringContext,
    score_type: ScoreType,
    expected: &str,
    given: &str,
    min_score: f64,
    max_score: f64,
    opts: &RangeOptions,
) -> ScoreResult<f64> {
    check_range(
        max_score,
        min_score,
        MINIMAL_EXPECTED_MAX_DELTA,
        opts.skip_warnings,
    )?;
    let score = texts_evaluate(ctx, score_type, expected, given, opts.retry_on_error).await?;
    info!(score_type = %score_type, score, min_score, max_score, "checked text score");
    assert_score(score, max_score, min_score, expected, given, score_type)?;
    Ok(score)
}

/// The bound an aggregated assertion checks its reduced score against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AggBound {
    /// Reduced score must be at least this.
    Lower(f64),
    /// Reduced score must be at most this.
    Upper(f64),
    /// Reduced score must be within `target ± AggOptions::max_delta`.
    Target(f64),
}

/// Run the rounds, reduce with `agg_type`, and check the result against `bound`.
pub async fn expect_aggregated(
    ctx: &ScoringContext,
    score_type: ScoreType,
    agg_type: AggType,
    expected: &str,
    given: &str,
    bound: AggBound,
    opts: &AggOptions,
) -> ScoreResult<f64> {
    check_runs(opts.full_runs, opts.each_question_runs)?;
    let (min_score, max_score) = match bound {
        AggBound::Lower(lower) => {
            check_range(1.0, lower, MINIMAL_EXPECTED_AGG_MAX_DELTA, opts.skip_warnings)?;
            (lower, 1.0)
        }
        AggBound::Upper(upper) => {
            check_range(upper, 0.0, MINIMAL_EXPECTED_AGG_MAX_DELTA, opts.skip_warnings)?;
            (0.0, upper)
        }
        AggBound::Target(target) => {
            check_target(
                target,
                opts.max_delta,
                MINIMAL_EXPECTED_AGG_MAX_DELTA,
                opts.skip_warnings,
            )?;
            target_window(target, opts.max_delta)
        }
    };

    let score = texts_agg(
        ctx,
        score_type,
        expected,
        given,
        opts.full_runs,
        opts.each_question_runs,
        agg_type,
        opts.retry_on_error,
    )
    .await?;
    info!(
        score_type = %score_type,
        agg = %agg_type,
        score,
        min_score,
        max_score,
        "checked aggregated text score"
    );
    assert_score(score, max_score, min_score, expected, given, score_type)?;
    Ok(score)
}

pub async fn expect_f1_equal(
    ctx: &ScoringContext,
    expected: &str,
    given: &str,
    opts: &EqualOptions,
) -> ScoreResult<f64> {
    expect_equal(ctx, ScoreType::F1, expected, given, opts).await
}

pub async fn expect_f1_range(
    ctx: &ScoringContext,
    expected: &str,
    given: &str,
    min_score: f64,
    max_score: f64,
    opts: &RangeOptions,
) -> ScoreResult<f64> {
    expect_range(ctx, ScoreType::F1, expected, given, min_score, max_score, opts).await
}

pub async fn expect_precision_equal(
    ctx: &ScoringContext,
    expected: &str,
    given: &str,
    opts: &EqualOptions,
) -> ScoreResult<f64> {
    expect_equal(ctx, ScoreType::Precision, expected, given, opts).await
}

pub async fn expect_precision_range(
    ctx: &ScoringContext,
    expected: &str,
    given: &str,
    min_score: f64,
    max_score: f64,
    opts: &RangeOptions,
) -> ScoreResult<f64> {
    expect_range(
        ctx,
        ScoreType::Precision,
        expected,
        given,
        min_score,
        max_score,
        opts,
    )
    .await
}

pub async fn expect_recall_equal(
    ctx: &ScoringContext,
    expected: &str,
    given: &str,
    opts: &EqualOptions,
) -> ScoreResult<f64> {
    expect_equal(ctx, ScoreType::Recall, expected, given, opts).await
}

pub async fn expect_recall_range(
    ctx: &ScoringContext,
    expected: &str,
    given: &str,
    min_score: f64,
    max_score: f64,
    opts: &RangeOptions,
) -> ScoreResult<f64> {
    expect_range(ctx, ScoreType::Recall, expected, given, min_score, max_score, opts).await
}

// Aggregated assertions, one per metric and reduction.

pub async fn agg_f1_min(
    ctx: &ScoringContext,
    expected: &str,
    given: &str,
    lower_bound: f64,
    opts: &AggOptions,
) -> ScoreResult<f64> {
    expect_aggregated(
        ctx,
        ScoreType::F1,
        AggType::Minimum,
        expected,
        given,
        AggBound::Lower(lower_bound),
        opts,
    )
    .await
}

pub async fn agg_f1_max(
    ctx: &ScoringContext,
    expected: &str,
    given: &str,
    upper_bound: f64,
    opts: &AggOptions,
) -> ScoreResult<f64> {
    expect_aggregated(
        ctx,
        ScoreType::F1,
        AggType::Maximum,
        expected,
        given,
        AggBound::Upper(upper_bound),
        opts,
    )
    .await
}

pub async fn agg_f1_median(
    ctx: &ScoringContext,
    expected: &str,
    given: &str,
    target: f64,
    opts: &AggOptions,
) -> ScoreResult<f64> {
    expect_aggregated(
        ctx,
        ScoreType::F1,
        AggType::Median,
        expected,
        given,
        AggBound::Target(target),
        opts,
    )
    .await
}

pub async fn agg_f1_mean(
    ctx: &ScoringContext,
    expected: &str,
    given: &str,
    target: f64,
    opts: &AggOptions,
) -> ScoreResult<f64> {
    expect_aggregated(
        ctx,
        ScoreType::F1,
        AggType::Mean,
        expected,
        given,
        AggBound::Target(target),
        opts,
    )
    .await
}

pub async fn agg_precision_min(
    ctx: &ScoringContext,
    expected: &str,
    given: &str,
    lower_bound: f64,
    opts: &AggOptions,
) -> ScoreResult<f64> {
    expect_aggregated(
        ctx,
        ScoreType::Precision,
        AggType::Minimum,
        expected,
        given,
        AggBound::Lower(lower_bound),
        opts,
    )
    .await
}

pub async fn agg_precision_max(
    ctx: &ScoringContext,
    expected: &str,
    given: &str,
    upper_bound: f64,
    opts: &AggOptions,
) -> ScoreResult<f64> {
    expect_aggregated(
        ctx,
        ScoreType::Precision,
        AggType::Maximum,
        expected,
        given,
        AggBound::Upper(upper_bound),
        opts,
    )
    .await
}

pub async fn agg_precision_median(
    ctx: &ScoringContext,
    expected: &str,
    given: &str,
    target: f64,
    opts: &AggOptions,
) -> ScoreResult<f64> {
    expect_aggregated(
        ctx,
        ScoreType::Precision,
        AggType::Median,
        expected,
        given,
        AggBound::Target(target),
        opts,
    )
    .await
}

pub async fn agg_precision_mean(
    ctx: &ScoringContext,
    expected: &str,
    given: &str,
    target: f64,
    opts: &AggOptions,
) -> ScoreResult<f64> {
    expect_aggregated(
        ctx,
        ScoreType::Precision,
        AggType::Mean,
        expected,
        given,
        AggBound::Target(target),
        opts,
    )
    .await
}

pub async fn agg_recall_min(
    ctx: &ScoringContext,
    expected: &str,
    given: &str,
    lower_bound: f64,
    opts: &AggOptions,
) -> ScoreResult<f64> {
    expect_aggregated(
        ctx,
        ScoreType::Recall,
        AggType::Minimum,
        expected,
        given,
        AggBound::Lower(lower_bound),
        opts,
    )
    .await
}

pub async fn agg_recall_max(
    ctx: &ScoringContext,
    expected: &str,
    given: &str,
    upper_bound: f64,
    opts: &AggOptions,
) -> ScoreResult<f64> {
    expect_aggregated(
        ctx,
        ScoreType::Recall,
        AggType::Maximum,
        expected,
        given,
        AggBound::Upper(upper_bound),
        opts,
    )
    .await
}

pub async fn agg_recall_median(
    ctx: &ScoringContext,
    expected: &str,
    given: &str,
    target: f64,
    opts: &AggOptions,
) -> ScoreResult<f64> {
    expect_aggregated(
        ctx,
        ScoreType::Recall,
        AggType::Median,
        expected,
        given,
        AggBound::Target(target),
        opts,
    )
    .await
}

pub async fn agg_recall_mean(
    ctx: &ScoringContext,
    expected: &str,
    given: &str,
    target: f64,
    opts: &AggOptions,
) -> ScoreResult<f64> {
    expect_aggregated(
        ctx,
        ScoreType::Recall,
        AggType::Mean,
        expected,
        given,
        AggBound::Target(target),
        opts,
    )
    .await
}
