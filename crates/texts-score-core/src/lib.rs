//! Question-based text similarity scoring.
//!
//! Two texts are compared by asking a language model to derive yes/no
//! questions from one of them and to answer those questions from the other.
//! The share of questions answered "yes" is a directional score:
//!
//! - **precision**: questions from the given text, answered by the expected text
//! - **recall**: questions from the expected text, answered by the given text
//! - **f1**: harmonic mean of the two
//!
//! On top of single scores the crate offers repeated runs with aggregation
//! (min, max, median, mean) and assertion helpers that fail with a readable
//! message when a score leaves its accepted window.
//!
//! # Quick Start
//!
//! ```no_run
//! use texts_score_core::{expect_f1_range, RangeOptions, ScoringContext};
//!
//! # async fn example() -> Result<(), texts_score_core::ScoreError> {
//! let ctx = ScoringContext::from_env()?;
//! let score = expect_f1_range(
//!     &ctx,
//!     "The cat sat on the mat.",
//!     "A cat was sitting on a mat.",
//!     0.6,
//!     1.0,
//!     &RangeOptions::default(),
//! )
//! .await?;
//! println!("f1 = {score:.2}");
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `TEXTS_SCORE_LLM_MODEL` | Model id (default: `gpt-4o-mini`) |
//! | `TEXTS_SCORE_LLM_API_KEY` | API key (falls back to `OPENAI_API_KEY`) |
//! | `TEXTS_SCORE_LLM_ENDPOINT` | Azure or OpenAI-compatible endpoint |
//! | `TEXTS_SCORE_LLM_DEPLOYMENT` | Azure deployment name |
//! | `TEXTS_SCORE_LLM_API_VERSION` | Azure API version (default: `2024-06-01`) |
//! | `TEXTS_SCORE_LLM_TEMPERATURE` | Sampling temperature (default: 0) |
//! | `TEXTS_SCORE_LLM_MAX_TOKENS` | Max output tokens (default: 1024) |
//! | `TEXTS_SCORE_LLM_TIMEOUT` | Request timeout in seconds (default: 60) |
//! | `TEXTS_SCORE_MAX_RETRIES` | Retries per scoring round (default: 5) |
//! | `TEXTS_SCORE_RETRY_BASE_MS` | Backoff base delay, 0 disables sleeping (default: 250) |

pub mod aggregate;
pub mod assertions;
pub mod bounds;
pub mod config;
pub mod context;
pub mod error;
pub mod evaluate;
pub mod metrics;
mod payload;
mod prompt;
pub mod providers;
pub mod questions;
mod retry;
pub mod scorer;
pub mod session;

// Re-export main types
pub use aggregate::{
    scores_agg, texts_agg, texts_multiple, texts_multiple_f1, texts_multiple_precision,
    texts_multiple_recall, AggType, RunResult, RunSample,
};
pub use assertions::{
    agg_f1_max, agg_f1_mean, agg_f1_median, agg_f1_min, agg_precision_max, agg_precision_mean,
    agg_precision_median, agg_precision_min, agg_recall_max, agg_recall_mean, agg_recall_median,
    agg_recall_min, expect_aggregated, expect_equal, expect_f1_equal, expect_f1_range,
    expect_precision_equal, expect_precision_range, expect_range, expect_recall_equal,
    expect_recall_range, AggBound, AggOptions, EqualOptions, RangeOptions,
};
pub use bounds::AdvisoryWarning;
pub use config::{LlmConfig, RetryPolicy, Settings, MAX_RETRY_ON_ERROR};
pub use context::ScoringContext;
pub use error::{BoundKind, ScoreAssertionFailure, ScoreError, ScoreResult};
pub use evaluate::Judgment;
pub use metrics::{
    f1_score, texts_evaluate, texts_evaluate_f1, texts_evaluate_precision, texts_evaluate_recall,
    ScoreType,
};
pub use providers::llm::LlmClient;
pub use questions::{Question, QuestionSet};
pub use scorer::score_one_side;
