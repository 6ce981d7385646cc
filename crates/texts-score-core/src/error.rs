//! Error types for text scoring.

use std::fmt;

use crate::metrics::ScoreType;

/// Which side of the accepted window a score fell out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundKind {
    Minimum,
    Maximum,
}

/// A computed score lies outside the declared bounds.
///
/// The rendered message carries the score, the violated bound and both texts
/// so a failing test explains itself without re-running the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreAssertionFailure {
    pub score_type: ScoreType,
    pub score: f64,
    pub bound: f64,
    pub kind: BoundKind,
    pub expected: String,
    pub given: String,
}

impl fmt::Display for ScoreAssertionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (side, op) = match self.kind {
            BoundKind::Minimum => ("below minimum", "<"),
            BoundKind::Maximum => ("above maximum", ">"),
        };
        write!(
            f,
            "Text {} {}: {:.2} {} {}.\n`expected`: '{}'\n`given`: '{}'",
            self.score_type, side, self.score, op, self.bound, self.expected, self.given
        )
    }
}

/// Scoring errors.
#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    /// Invalid target, range or run-count input. Raised before any model call.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// The generation collaborator failed to produce a response.
    #[error("provider error during {stage}: {message}")]
    Provider { stage: String, message: String },

    /// The model response could not be read as the expected structure.
    #[error("malformed {stage} payload: {message}")]
    Parse { stage: String, message: String },

    /// The evaluation listed a different number of judgments than questions asked.
    #[error("evaluation returned {judgments} judgments for {questions} questions")]
    JudgmentCountMismatch { questions: usize, judgments: usize },

    /// The evaluation produced no judgments, so no mean exists.
    #[error("evaluation returned no judgments; score is undefined")]
    EmptyJudgments,

    /// Aggregation was asked to reduce an empty score list.
    #[error("no scores to aggregate")]
    EmptyScores,

    #[error("unknown aggregation type: '{0}' (expected minimum, maximum, median, average or mean)")]
    UnknownAggregation(String),

    #[error("unknown score type: '{0}' (expected f1, precision or recall)")]
    UnknownScoreType(String),

    /// Retries were exhausted; wraps the last transient error.
    #[error("operation failed after {attempts} attempts ({retries} retries). Last error: {last}")]
    RetryExhausted {
        attempts: u32,
        retries: u32,
        #[source]
        last: Box<ScoreError>,
    },

    /// The score fell outside the accepted window.
    #[error("{0}")]
    Assertion(ScoreAssertionFailure),
}

impl ScoreError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub(crate) fn provider(stage: impl fmt::Display, err: &anyhow::Error) -> Self {
        Self::Provider {
            stage: stage.to_string(),
            message: format!("{:#}", err),
        }
    }

    pub(crate) fn parse(stage: impl fmt::Display, message: impl Into<String>) -> Self {
        Self::Parse {
            stage: stage.to_string(),
            message: message.into(),
        }
    }

    /// Whether a scoring round that hit this error may be restarted.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Provider { .. }
                | Self::Parse { .. }
                | Self::JudgmentCountMismatch { .. }
                | Self::EmptyJudgments
        )
    }

    /// Whether this is a configuration error (bad target, range or runs).
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::Config { .. } | Self::UnknownAggregation(_) | Self::UnknownScoreType(_)
        )
    }

    /// The assertion failure carried by this error, if it is one.
    pub fn as_assertion(&self) -> Option<&ScoreAssertionFailure> {
        match self {
            Self::Assertion(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Result type for scoring operations.
pub type ScoreResult<T> = Result<T, ScoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_are_retryable() {
        assert!(ScoreError::EmptyJudgments.is_retryable());
        assert!(ScoreError::parse("questions", "bad").is_retryable());
        assert!(ScoreError::JudgmentCountMismatch {
            questions: 3,
            judgments: 2
        }
        .is_retryable());
        assert!(!ScoreError::config("bad target").is_retryable());
        assert!(!ScoreError::EmptyScores.is_retryable());
    }

    #[test]
    fn exhausted_message_names_attempts_and_cause() {
        let err = ScoreError::RetryExhausted {
            attempts: 6,
            retries: 5,
            last: Box::new(ScoreError::EmptyJudgments),
        };
        let msg = err.to_string();
        assert!(msg.contains("6 attempts"));
        assert!(msg.contains("no judgments"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn assertion_message_shape() {
        let failure = ScoreAssertionFailure {
            score_type: ScoreType::F1,
            score: 2.0 / 3.0,
            bound: 0.7,
            kind: BoundKind::Minimum,
            expected: "a".into(),
            given: "b".into(),
        };
        assert_eq!(
            failure.to_string(),
            "Text f1 below minimum: 0.67 < 0.7.\n`expected`: 'a'\n`given`: 'b'"
        );
    }
}
