//! Bounded restart of a whole scoring round.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::config::RetryPolicy;
use crate::error::{ScoreError, ScoreResult};

/// Run `round` until it succeeds, restarting it from scratch on retryable errors.
///
/// With `retry_on_error` off the first error is returned untouched. Otherwise up
/// to `policy.max_retries` restarts are made, after which the last error is
/// wrapped in `RetryExhausted`. Non-retryable errors always return at once.
pub(crate) async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    retry_on_error: bool,
    scope: &str,
    mut round: F,
) -> ScoreResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ScoreResult<T>>,
{
    let mut retries = 0;

    loop {
        match round().await {
            Ok(value) => return Ok(value),
            Err(e) if !retry_on_error || !e.is_retryable() => return Err(e),
            Err(e) => {
                retries += 1;
                if retries > policy.max_retries {
                    return Err(ScoreError::RetryExhausted {
                        attempts: retries,
                        retries: policy.max_retries,
                        last: Box::new(e),
                    });
                }

                let backoff = jittered(policy.backoff_ceiling(retries));
                warn!(
                    error = %e,
                    scope = scope,
                    retry = retries,
                    max_retries = policy.max_retries,
                    backoff_ms = backoff.as_millis() as u64,
                    "scoring round failed; retrying"
                );
                if !backoff.is_zero() {
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

fn jittered(ceiling: Duration) -> Duration {
    if ceiling.is_zero() {
        return Duration::ZERO;
    }
    let ceiling_ms = ceiling.as_millis() as u64;
    let jittered_ms = rand::thread_rng().gen_range(ceiling_ms / 2..=ceiling_ms);
    Duration::from_millis(jittered_ms.max(10).min(ceiling_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test]
    async fn recovers_after_transient_failures() {
        let calls = Cell::new(0);
        let result = with_retry(&RetryPolicy::immediate(), true, "test", || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move {
                if n < 3 {
                    Err(ScoreError::EmptyJudgments)
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn exhausts_after_cap() {
        let calls = Cell::new(0u32);
        let result: ScoreResult<()> =
            with_retry(&RetryPolicy::immediate(), true, "test", || {
                calls.set(calls.get() + 1);
                async { Err(ScoreError::EmptyJudgments) }
            })
            .await;
        assert_eq!(calls.get(), 6);
        match result {
            Err(ScoreError::RetryExhausted {
                attempts, retries, ..
            }) => {
                assert_eq!(attempts, 6);
                assert_eq!(retries, 5);
            }
            other => panic!("expected RetryExhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn terminal_errors_skip_retry() {
        let calls = Cell::new(0u32);
        let result: ScoreResult<()> =
            with_retry(&RetryPolicy::immediate(), true, "test", || {
                calls.set(calls.get() + 1);
                async { Err(ScoreError::EmptyScores) }
            })
            .await;
        assert!(matches!(result, Err(ScoreError::EmptyScores)));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn jitter_stays_under_ceiling() {
        for _ in 0..50 {
            let d = jittered(Duration::from_millis(400));
            assert!(d >= Duration::from_millis(200) && d <= Duration::from_millis(400));
        }
        assert_eq!(jittered(Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn floor_never_exceeds_small_ceiling() {
        for _ in 0..50 {
            let d = jittered(Duration::from_millis(6));
            assert!(d >= Duration::from_millis(3) && d <= Duration::from_millis(6), "{d:?}");
        }
        for _ in 0..50 {
            let d = jittered(Duration::from_millis(16));
            assert!(d >= Duration::from_millis(10) && d <= Duration::from_millis(16), "{d:?}");
        }
    }
}
