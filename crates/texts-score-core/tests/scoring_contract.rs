//! End-to-end scoring against the scripted fake client.
//!
//! Every test scripts the question and answer stages separately and checks
//! both the returned score and how many model calls each stage saw.

use std::sync::Arc;

use texts_score_core::providers::llm::fake::{FakeClient, FakeReply};
use texts_score_core::providers::llm::Stage;
use texts_score_core::{
    agg_f1_min, agg_precision_mean, agg_recall_mean, expect_f1_equal, expect_f1_range,
    expect_recall_equal, score_one_side, texts_evaluate_f1, texts_multiple, AggOptions,
    BoundKind, EqualOptions, LlmConfig, RangeOptions, RetryPolicy, ScoreError, ScoreType,
    ScoringContext,
};

const EXPECTED: &str = "The Eiffel Tower is in Paris and was finished in 1889.";
const GIVEN: &str = "The Eiffel Tower, located in Paris, opened in 1901.";

const THREE_QUESTIONS: &str =
    r#"{"1": "Is the tower in Paris?", "2": "Is it called the Eiffel Tower?", "3": "Was it finished in 1889?"}"#;
const TWO_OF_THREE: &str = r#"{"list": [
    {"question": "Is the tower in Paris?", "answer": 1},
    {"question": "Is it called the Eiffel Tower?", "answer": 1},
    {"question": "Was it finished in 1889?", "answer": 0}
]}"#;

fn scripted() -> FakeClient {
    FakeClient::new("fake-model")
        .with_questions(FakeReply::text(THREE_QUESTIONS))
        .with_answers(FakeReply::text(TWO_OF_THREE))
}

fn context(client: &Arc<FakeClient>) -> ScoringContext {
    ScoringContext::new(
        client.clone(),
        LlmConfig::default().with_model("fake-model"),
        RetryPolicy::immediate(),
    )
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[tokio::test]
async fn test_one_side_is_fraction_of_yes_answers() {
    let client = Arc::new(scripted());
    let ctx = context(&client);

    let score = score_one_side(&ctx, EXPECTED, GIVEN, true).await.unwrap();

    assert!(approx(score, 2.0 / 3.0), "got {score}");
    assert_eq!(client.calls(Stage::Questions), 1);
    assert_eq!(client.calls(Stage::Answers), 1);
}

#[tokio::test]
async fn test_perfect_answers_score_one() {
    let all_yes = r#"{"list": [
        {"question": "a", "answer": true},
        {"question": "b", "answer": true},
        {"question": "c", "answer": 1}
    ]}"#;
    let client = Arc::new(
        FakeClient::new("fake-model")
            .with_questions(FakeReply::text(THREE_QUESTIONS))
            .with_answers(FakeReply::text(all_yes)),
    );
    let ctx = context(&client);

    assert_eq!(score_one_side(&ctx, EXPECTED, EXPECTED, true).await.unwrap(), 1.0);
    assert_eq!(texts_evaluate_f1(&ctx, EXPECTED, EXPECTED, true).await.unwrap(), 1.0);
}

#[tokio::test]
async fn test_f1_scores_both_directions() {
    let client = Arc::new(scripted());
    let ctx = context(&client);

    let score = texts_evaluate_f1(&ctx, EXPECTED, GIVEN, true).await.unwrap();

    assert!(approx(score, 2.0 / 3.0), "got {score}");
    assert_eq!(client.calls(Stage::Questions), 2);
    assert_eq!(client.calls(Stage::Answers), 2);
}

#[tokio::test]
async fn test_range_assertion_passes_and_fails() {
    let client = Arc::new(scripted());
    let ctx = context(&client);

    let score = expect_f1_range(&ctx, EXPECTED, GIVEN, 0.5, 0.9, &RangeOptions::default())
        .await
        .expect("2/3 is inside [0.5, 0.9]");
    assert!(approx(score, 2.0 / 3.0));

    let err = expect_f1_range(&ctx, EXPECTED, GIVEN, 0.7, 0.9, &RangeOptions::default())
        .await
        .unwrap_err();
    let failure = err.as_assertion().expect("assertion failure");
    assert_eq!(failure.kind, BoundKind::Minimum);
    assert_eq!(failure.bound, 0.7);

    let message = err.to_string();
    assert!(message.starts_with("Text f1 below minimum: 0.67 < 0.7."), "{message}");
    assert!(message.contains(EXPECTED));
    assert!(message.contains(GIVEN));
}

#[tokio::test]
async fn test_equal_assertion_uses_default_window() {
    let client = Arc::new(scripted());
    let ctx = context(&client);

    // Default target 1.0 with max_delta 0.2 accepts [0.8, 1.0].
    let err = expect_recall_equal(&ctx, EXPECTED, GIVEN, &EqualOptions::default())
        .await
        .unwrap_err();
    let failure = err.as_assertion().expect("assertion failure");
    assert_eq!(failure.score_type, ScoreType::Recall);
    assert_eq!(failure.bound, 0.8);

    let score = expect_f1_equal(
        &ctx,
        EXPECTED,
        GIVEN,
        &EqualOptions::target(0.6).with_max_delta(0.1),
    )
    .await
    .unwrap();
    assert!(approx(score, 2.0 / 3.0));
}

#[tokio::test]
async fn test_retry_recovers_with_fresh_questions() {
    let client = Arc::new(
        scripted()
            .queue(Stage::Questions, FakeReply::error("rate limited"))
            .queue(Stage::Questions, FakeReply::text("not json at all")),
    );
    let ctx = context(&client);

    let score = score_one_side(&ctx, EXPECTED, GIVEN, true).await.unwrap();

    assert!(approx(score, 2.0 / 3.0));
    assert_eq!(client.calls(Stage::Questions), 3);
    assert_eq!(client.calls(Stage::Answers), 1);
}

#[tokio::test]
async fn test_judgment_count_mismatch_restarts_round() {
    let short = r#"{"list": [{"question": "Is the tower in Paris?", "answer": true}]}"#;
    let client = Arc::new(scripted().queue(Stage::Answers, FakeReply::text(short)));
    let ctx = context(&client);

    let score = score_one_side(&ctx, EXPECTED, GIVEN, true).await.unwrap();

    assert!(approx(score, 2.0 / 3.0));
    assert_eq!(client.calls(Stage::Questions), 2);
    assert_eq!(client.calls(Stage::Answers), 2);
}

#[tokio::test]
async fn test_fenced_payloads_are_accepted() {
    let client = Arc::new(
        FakeClient::new("fake-model")
            .with_questions(FakeReply::text(format!("```json\n{THREE_QUESTIONS}\n```")))
            .with_answers(FakeReply::text(format!("```\n{TWO_OF_THREE}\n```"))),
    );
    let ctx = context(&client);

    let score = score_one_side(&ctx, EXPECTED, GIVEN, false).await.unwrap();
    assert!(approx(score, 2.0 / 3.0));
}

#[tokio::test]
async fn test_without_retry_first_error_propagates() {
    let client = Arc::new(scripted().queue(Stage::Questions, FakeReply::error("boom")));
    let ctx = context(&client);

    let err = score_one_side(&ctx, EXPECTED, GIVEN, false).await.unwrap_err();

    assert!(matches!(err, ScoreError::Provider { .. }), "{err:?}");
    assert!(err.to_string().contains("boom"));
    assert_eq!(client.calls(Stage::Questions), 1);
    assert_eq!(client.calls(Stage::Answers), 0);
}

#[tokio::test]
async fn test_retry_exhaustion_wraps_last_error() {
    let client = Arc::new(
        FakeClient::new("fake-model")
            .with_questions(FakeReply::error("service unavailable"))
            .with_answers(FakeReply::text(TWO_OF_THREE)),
    );
    let ctx = context(&client);

    let err = score_one_side(&ctx, EXPECTED, GIVEN, true).await.unwrap_err();

    match &err {
        ScoreError::RetryExhausted { attempts, retries, last } => {
            assert_eq!(*attempts, 6);
            assert_eq!(*retries, 5);
            assert!(matches!(**last, ScoreError::Provider { .. }));
        }
        other => panic!("expected RetryExhausted, got {other:?}"),
    }
    assert!(err.to_string().contains("service unavailable"));
    assert_eq!(client.calls(Stage::Questions), 6);
    assert_eq!(client.calls(Stage::Answers), 0);
}

#[tokio::test]
async fn test_retry_cap_follows_policy() {
    let client = Arc::new(FakeClient::new("fake-model").with_questions(FakeReply::error("down")));
    let ctx = context(&client).with_retry(RetryPolicy::immediate().with_max_retries(1));

    let err = score_one_side(&ctx, EXPECTED, GIVEN, true).await.unwrap_err();

    assert!(matches!(err, ScoreError::RetryExhausted { attempts: 2, .. }));
    assert_eq!(client.calls(Stage::Questions), 2);
}

#[tokio::test]
async fn test_multiple_runs_generate_once_per_round() {
    let client = Arc::new(scripted());
    let ctx = context(&client);

    let result = texts_multiple(&ctx, ScoreType::Precision, EXPECTED, GIVEN, 3, 2, true)
        .await
        .unwrap();

    assert_eq!(result.samples.len(), 6);
    assert_eq!(client.calls(Stage::Questions), 3);
    assert_eq!(client.calls(Stage::Answers), 6);
    assert!(result.samples.iter().all(|s| s.recall.is_none()));
    assert_eq!(
        result
            .samples
            .iter()
            .map(|s| (s.round, s.repetition))
            .collect::<Vec<_>>(),
        vec![(0, 0), (0, 1), (1, 0), (1, 1), (2, 0), (2, 1)]
    );
}

#[tokio::test]
async fn test_multiple_f1_scores_both_directions_per_repetition() {
    let client = Arc::new(scripted());
    let ctx = context(&client);

    let result = texts_multiple(&ctx, ScoreType::F1, EXPECTED, GIVEN, 2, 3, true)
        .await
        .unwrap();

    assert_eq!(result.samples.len(), 6);
    assert_eq!(client.calls(Stage::Questions), 4);
    assert_eq!(client.calls(Stage::Answers), 12);
    for sample in &result.samples {
        assert!(sample.precision.is_some() && sample.recall.is_some());
    }
}

#[tokio::test]
async fn test_failed_round_drops_partial_samples() {
    let all_yes = r#"{"list": [
        {"question": "a", "answer": 1},
        {"question": "b", "answer": 1},
        {"question": "c", "answer": 1}
    ]}"#;
    // Round 0: first repetition answers all yes, second fails; the retry
    // restarts the round and only its two fresh samples are kept.
    let client = Arc::new(
        scripted()
            .queue(Stage::Answers, FakeReply::text(all_yes))
            .queue(Stage::Answers, FakeReply::error("timeout")),
    );
    let ctx = context(&client);

    let result = texts_multiple(&ctx, ScoreType::Recall, EXPECTED, GIVEN, 1, 2, true)
        .await
        .unwrap();

    assert_eq!(result.samples.len(), 2);
    assert!(result.scores().iter().all(|s| approx(*s, 2.0 / 3.0)));
    assert_eq!(client.calls(Stage::Questions), 2);
    assert_eq!(client.calls(Stage::Answers), 4);
}

#[tokio::test]
async fn test_retry_budget_resets_each_round() {
    // One retry allowed per round; both rounds spend it and still succeed.
    let client = Arc::new(
        scripted()
            .queue(Stage::Questions, FakeReply::error("rate limited"))
            .queue(Stage::Questions, FakeReply::text(THREE_QUESTIONS))
            .queue(Stage::Questions, FakeReply::error("rate limited")),
    );
    let ctx = context(&client).with_retry(RetryPolicy::immediate().with_max_retries(1));

    let result = texts_multiple(&ctx, ScoreType::Precision, EXPECTED, GIVEN, 2, 1, true)
        .await
        .unwrap();

    assert_eq!(result.samples.len(), 2);
    assert_eq!(
        result.samples.iter().map(|s| s.round).collect::<Vec<_>>(),
        vec![0, 1]
    );
    assert_eq!(client.calls(Stage::Questions), 4);
    assert_eq!(client.calls(Stage::Answers), 2);
}

#[tokio::test]
async fn test_exhausted_round_aborts_aggregation() {
    let client = Arc::new(
        FakeClient::new("fake-model")
            .queue(Stage::Questions, FakeReply::text(THREE_QUESTIONS))
            .with_questions(FakeReply::error("down"))
            .with_answers(FakeReply::text(TWO_OF_THREE)),
    );
    let ctx = context(&client);

    let err = agg_recall_mean(&ctx, EXPECTED, GIVEN, 0.6, &AggOptions::runs(3, 1))
        .await
        .unwrap_err();

    match &err {
        ScoreError::RetryExhausted { attempts, last, .. } => {
            assert_eq!(*attempts, 6);
            assert!(matches!(**last, ScoreError::Provider { .. }));
        }
        other => panic!("expected RetryExhausted, got {other:?}"),
    }
    assert!(err.as_assertion().is_none());
    // Round 0 once, round 1 six times, round 2 never.
    assert_eq!(client.calls(Stage::Questions), 7);
    assert_eq!(client.calls(Stage::Answers), 1);
}

#[tokio::test]
async fn test_aggregated_assertions() {
    let client = Arc::new(scripted());
    let ctx = context(&client);

    let score = agg_f1_min(&ctx, EXPECTED, GIVEN, 0.5, &AggOptions::runs(2, 1))
        .await
        .unwrap();
    assert!(approx(score, 2.0 / 3.0));

    let err = agg_precision_mean(&ctx, EXPECTED, GIVEN, 0.5, &AggOptions::runs(2, 1))
        .await
        .unwrap_err();
    let failure = err.as_assertion().expect("assertion failure");
    assert_eq!(failure.kind, BoundKind::Maximum);
    assert_eq!(failure.bound, 0.6);
}

#[tokio::test]
async fn test_invalid_bounds_fail_before_any_model_call() {
    let client = Arc::new(scripted());
    let ctx = context(&client);

    let err = expect_f1_range(&ctx, EXPECTED, GIVEN, 0.9, 0.5, &RangeOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_config());

    let err = expect_f1_equal(&ctx, EXPECTED, GIVEN, &EqualOptions::target(1.5))
        .await
        .unwrap_err();
    assert!(err.is_config());

    let err = agg_f1_min(&ctx, EXPECTED, GIVEN, 0.5, &AggOptions::runs(0, 1))
        .await
        .unwrap_err();
    assert!(err.is_config());

    let err = agg_f1_min(&ctx, EXPECTED, GIVEN, -0.2, &AggOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_config());

    assert_eq!(client.calls(Stage::Questions), 0);
    assert_eq!(client.calls(Stage::Answers), 0);
}

#[tokio::test]
async fn test_empty_question_set_is_retried_then_exhausted() {
    let client = Arc::new(
        FakeClient::new("fake-model")
            .with_questions(FakeReply::text("{}"))
            .with_answers(FakeReply::text(TWO_OF_THREE)),
    );
    let ctx = context(&client).with_retry(RetryPolicy::immediate().with_max_retries(2));

    let err = score_one_side(&ctx, EXPECTED, GIVEN, true).await.unwrap_err();

    match err {
        ScoreError::RetryExhausted { last, .. } => {
            assert!(matches!(*last, ScoreError::EmptyJudgments));
        }
        other => panic!("expected RetryExhausted, got {other:?}"),
    }
    assert_eq!(client.calls(Stage::Questions), 3);
    assert_eq!(client.calls(Stage::Answers), 0);
}
