//! Process exit codes. Part of the CLI contract for CI pipelines.

pub const SUCCESS: i32 = 0;
pub const ASSERTION_FAILED: i32 = 1; // Score outside the accepted window
pub const CONFIG_ERROR: i32 = 2; // Bad bounds, run counts, settings or usage
pub const RUNTIME_ERROR: i32 = 3; // Provider, payload or retry exhaustion

use std::fmt;

use texts_score_core::ScoreError;

/// Command-line misuse that clap cannot reject on its own.
#[derive(Debug)]
pub struct UsageError(pub String);

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for UsageError {}

/// Map a command failure to its exit code.
///
/// Unreadable input files and usage mistakes are the caller's to fix (2);
/// anything else outside `ScoreError` is a runtime failure (3).
pub fn for_error(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<ScoreError>() {
        Some(e) if e.as_assertion().is_some() => ASSERTION_FAILED,
        Some(e) if e.is_config() => CONFIG_ERROR,
        Some(_) => RUNTIME_ERROR,
        None if err
            .chain()
            .any(|cause| cause.is::<std::io::Error>() || cause.is::<UsageError>()) =>
        {
            CONFIG_ERROR
        }
        None => RUNTIME_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_errors_map_to_codes() {
        let unknown = anyhow::Error::new(ScoreError::UnknownScoreType("bleu".into()));
        assert_eq!(for_error(&unknown), CONFIG_ERROR);

        let empty = anyhow::Error::new(ScoreError::EmptyJudgments);
        assert_eq!(for_error(&empty), RUNTIME_ERROR);

        let io = anyhow::Error::new(std::io::Error::from(std::io::ErrorKind::NotFound))
            .context("failed to read expected text");
        assert_eq!(for_error(&io), CONFIG_ERROR);

        let usage = anyhow::Error::new(UsageError("missing --given".into()));
        assert_eq!(for_error(&usage), CONFIG_ERROR);
    }

    #[test]
    fn serialization_failure_is_runtime_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = anyhow::Error::new(json_err).context("failed to render samples");
        assert_eq!(for_error(&err), RUNTIME_ERROR);
    }
}
