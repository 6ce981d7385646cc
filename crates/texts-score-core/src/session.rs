//! Process-wide default context for callers that cannot thread one through.
//!
//! Library code always takes a `&ScoringContext`; this is a convenience for
//! test harnesses that configure the client once per process.

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::context::ScoringContext;
use crate::error::{ScoreError, ScoreResult};

static SESSION: OnceCell<Arc<ScoringContext>> = OnceCell::new();

/// Install `ctx` as the session context. Fails if one is already set.
pub fn install(ctx: ScoringContext) -> ScoreResult<()> {
    SESSION
        .set(Arc::new(ctx))
        .map_err(|_| ScoreError::config("a session scoring context is already installed"))
}

/// The installed context, or one built from the environment on first use.
pub fn context() -> ScoreResult<Arc<ScoringContext>> {
    SESSION
        .get_or_try_init(|| ScoringContext::from_env().map(Arc::new))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LlmConfig, RetryPolicy};
    use crate::providers::llm::fake::FakeClient;

    #[test]
    fn install_once_then_reuse() {
        let ctx = ScoringContext::new(
            Arc::new(FakeClient::new("session-model")),
            LlmConfig::default().with_model("session-model"),
            RetryPolicy::immediate(),
        );
        install(ctx.clone()).unwrap();

        let err = install(ctx).unwrap_err();
        assert!(err.is_config());

        let current = context().unwrap();
        assert_eq!(current.llm().model, "session-model");
        assert!(Arc::ptr_eq(&current, &context().unwrap()));
    }
}
