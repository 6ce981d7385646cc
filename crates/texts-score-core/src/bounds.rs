//! Validation of assertion bounds and run counts, and the final range check.
//!
//! Invalid input is a `ScoreError::Config` raised before any model call.
//! Weak but valid configurations yield advisory warnings, which are logged
//! and returned; they never block execution.

use std::fmt;

use tracing::warn;

use crate::error::{BoundKind, ScoreAssertionFailure, ScoreError, ScoreResult};
use crate::metrics::ScoreType;

/// Narrowest tolerance that does not trigger a warning for single-shot assertions.
pub const MINIMAL_EXPECTED_MAX_DELTA: f64 = 0.05;

/// Narrowest tolerance that does not trigger a warning for aggregated assertions.
pub const MINIMAL_EXPECTED_AGG_MAX_DELTA: f64 = 0.1;

/// Total runs above which an aggregated assertion is flagged as expensive.
pub const MAX_RECOMMENDED_TOTAL_RUNS: u32 = 50;

/// A statistically weak, but valid, configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum AdvisoryWarning {
    /// The accepted window is all of [0, 1]; the assertion cannot fail.
    FullRange,
    /// `max_delta` is below the suggested minimum.
    StrictDelta { max_delta: f64, minimal: f64 },
    /// The range width is below the suggested minimum.
    StrictRange { width: f64, minimal: f64 },
    /// `full_runs * each_question_runs` is high.
    ManyRuns { total: u32 },
}

impl fmt::Display for AdvisoryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FullRange => write!(
                f,
                "the score range covers all possible values ([0, 1]) and may not be a meaningful test"
            ),
            Self::StrictDelta { max_delta, minimal } => write!(
                f,
                "given max_delta ({}) is strict; consider at least {}",
                max_delta, minimal
            ),
            Self::StrictRange { width, minimal } => write!(
                f,
                "range ({:.3}) is strict; consider at least {}",
                width, minimal
            ),
            Self::ManyRuns { total } => write!(
                f,
                "the total number of runs ({}) is high, which may result in a long test execution time and increased cost",
                total
            ),
        }
    }
}

fn emit(warnings: Vec<AdvisoryWarning>) -> Vec<AdvisoryWarning> {
    for w in &warnings {
        warn!(advisory = %w, "weak score assertion");
    }
    warnings
}

/// Accepted window `[target - max_delta, target + max_delta]` clamped to [0, 1], as `(min, max)`.
pub fn target_window(target: f64, max_delta: f64) -> (f64, f64) {
    ((target - max_delta).max(0.0), (target + max_delta).min(1.0))
}

pub fn check_target(
    target: f64,
    max_delta: f64,
    minimal_expected_max_delta: f64,
    skip_warnings: bool,
) -> ScoreResult<Vec<AdvisoryWarning>> {
    if !(0.0..=1.0).contains(&target) {
        return Err(ScoreError::config(format!(
            "`target` value must be in range 0 to 1; {} given.",
            target
        )));
    }
    if !(0.0..=1.0).contains(&max_delta) {
        return Err(ScoreError::config(format!(
            "`max_delta` value must be in range 0 to 1; {} given.",
            max_delta
        )));
    }
    if skip_warnings {
        return Ok(Vec::new());
    }

    let mut warnings = Vec::new();
    if target - max_delta <= 0.0 && target + max_delta >= 1.0 {
        warnings.push(AdvisoryWarning::FullRange);
    }
    if max_delta < minimal_expected_max_delta {
        warnings.push(AdvisoryWarning::StrictDelta {
            max_delta,
            minimal: minimal_expected_max_delta,
        });
    }
    Ok(emit(warnings))
}

pub fn check_range(
    max_score: f64,
    min_score: f64,
    minimal_expected_max_delta: f64,
    skip_warnings: bool,
) -> ScoreResult<Vec<AdvisoryWarning>> {
    if max_score.is_nan() || max_score > 1.0 {
        return Err(ScoreError::config(format!(
            "`max_score` value must be in range 0 to 1; {} given.",
            max_score
        )));
    }
    if min_score.is_nan() || min_score < 0.0 {
        return Err(ScoreError::config(format!(
            "`min_score` value must be in range 0 to 1; {} given.",
            min_score
        )));
    }
    if max_score < min_score {
        return Err(ScoreError::config(format!(
            "`max_score` ({}) cannot be smaller than `min_score` ({})",
            max_score, min_score
        )));
    }
    if skip_warnings {
        return Ok(Vec::new());
    }

    let mut warnings = Vec::new();
    let width = max_score - min_score;
    if max_score >= 1.0 && min_score <= 0.0 {
        warnings.push(AdvisoryWarning::FullRange);
    } else if width < minimal_expected_max_delta {
        warnings.push(AdvisoryWarning::StrictRange {
            width,
            minimal: minimal_expected_max_delta,
        });
    }
    Ok(emit(warnings))
}

pub fn check_runs(full_runs: u32, each_question_runs: u32) -> ScoreResult<Vec<AdvisoryWarning>> {
    if full_runs == 0 {
        return Err(ScoreError::config(format!(
            "`full_runs` must be a positive integer; {} given.",
            full_runs
        )));
    }
    if each_question_runs == 0 {
        return Err(ScoreError::config(format!(
            "`each_question_runs` must be a positive integer; {} given.",
            each_question_runs
        )));
    }

    let total = full_runs.saturating_mul(each_question_runs);
    let mut warnings = Vec::new();
    if total > MAX_RECOMMENDED_TOTAL_RUNS {
        warnings.push(AdvisoryWarning::ManyRuns { total });
    }
    Ok(emit(warnings))
}

/// Fail unless `min_score <= score <= max_score`.
pub fn assert_score(
    score: f64,
    max_score: f64,
    min_score: f64,
    expected: &str,
    given: &str,
    score_type: ScoreType,
) -> ScoreResult<()> {
    let violated = if score < min_score {
        Some((min_score, BoundKind::Minimum))
    } else if score > max_score {
        Some((max_score, BoundKind::Maximum))
    } else {
        None
    };

    match violated {
        None => Ok(()),
        Some((bound, kind)) => Err(ScoreError::Assertion(ScoreAssertionFailure {
            score_type,
            score,
            bound,
            kind,
            expected: expected.to_string(),
            given: given.to_string(),
        })),
    }
}
