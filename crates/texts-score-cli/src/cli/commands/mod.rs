pub mod settings;

use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use texts_score_core::providers::llm::fake::{FakeClient, FakeReply};
use texts_score_core::{
    expect_aggregated, expect_equal, expect_range, texts_evaluate, texts_multiple, AggBound,
    AggOptions, AggType, EqualOptions, RangeOptions, ScoringContext, Settings,
};
use tracing::debug;

use super::args::{
    AggArgs, Cli, Command, ExpectArgs, LlmArgs, MultipleArgs, Provider, ScoreArgs, TextPair,
};
use crate::exit_codes::{UsageError, SUCCESS};

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let settings = settings::resolve(&cli.llm)?;
    let ctx = match cli.llm.provider {
        Provider::Openai => ScoringContext::from_settings(settings)?,
        Provider::Fake => fake_context(&cli.llm, settings)?,
    };
    debug!(context = ?ctx, "scoring context ready");

    match cli.cmd {
        Command::Score(args) => cmd_score(&ctx, args).await,
        Command::Multiple(args) => cmd_multiple(&ctx, args).await,
        Command::Expect(args) => cmd_expect(&ctx, args).await,
        Command::Agg(args) => cmd_agg(&ctx, args).await,
    }
}

async fn cmd_score(ctx: &ScoringContext, args: ScoreArgs) -> anyhow::Result<i32> {
    let (expected, given) = read_texts(&args.texts)?;
    let score = texts_evaluate(ctx, args.score_type, &expected, &given, !args.no_retry).await?;
    if args.json {
        let out = serde_json::json!({ "score_type": args.score_type, "score": score });
        println!("{}", serde_json::to_string(&out)?);
    } else {
        println!("{:.4}", score);
    }
    Ok(SUCCESS)
}

async fn cmd_multiple(ctx: &ScoringContext, args: MultipleArgs) -> anyhow::Result<i32> {
    let (expected, given) = read_texts(&args.texts)?;
    texts_score_core::bounds::check_runs(args.full_runs, args.each_question_runs)?;
    let result = texts_multiple(
        ctx,
        args.score_type,
        &expected,
        &given,
        args.full_runs,
        args.each_question_runs,
        !args.no_retry,
    )
    .await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(SUCCESS)
}

async fn cmd_expect(ctx: &ScoringContext, args: ExpectArgs) -> anyhow::Result<i32> {
    let (expected, given) = read_texts(&args.texts)?;
    let score = match args.target {
        Some(target) => {
            let opts = EqualOptions {
                target,
                max_delta: args.max_delta,
                skip_warnings: args.skip_warnings,
                retry_on_error: !args.no_retry,
            };
            expect_equal(ctx, args.score_type, &expected, &given, &opts).await?
        }
        None => {
            let opts = RangeOptions {
                skip_warnings: args.skip_warnings,
                retry_on_error: !args.no_retry,
            };
            let min = args.min.unwrap_or(0.0);
            let max = args.max.unwrap_or(1.0);
            expect_range(ctx, args.score_type, &expected, &given, min, max, &opts).await?
        }
    };
    println!("ok: {} {:.4}", args.score_type, score);
    Ok(SUCCESS)
}

async fn cmd_agg(ctx: &ScoringContext, args: AggArgs) -> anyhow::Result<i32> {
    let (expected, given) = read_texts(&args.texts)?;
    let bound = match args.agg_type {
        AggType::Minimum => AggBound::Lower(args.bound),
        AggType::Maximum => AggBound::Upper(args.bound),
        AggType::Median | AggType::Mean => AggBound::Target(args.bound),
    };
    let opts = AggOptions {
        full_runs: args.full_runs,
        each_question_runs: args.each_question_runs,
        max_delta: args.max_delta,
        skip_warnings: args.skip_warnings,
        retry_on_error: !args.no_retry,
    };
    let score = expect_aggregated(
        ctx,
        args.score_type,
        args.agg_type,
        &expected,
        &given,
        bound,
        &opts,
    )
    .await?;
    println!("ok: {} {} {:.4}", args.agg_type, args.score_type, score);
    Ok(SUCCESS)
}

fn fake_context(args: &LlmArgs, settings: Settings) -> anyhow::Result<ScoringContext> {
    let (Some(questions), Some(answers)) = (&args.fake_questions, &args.fake_answers) else {
        return Err(UsageError(
            "--provider fake needs both --fake-questions and --fake-answers".into(),
        )
        .into());
    };
    let client = FakeClient::new(settings.llm.model.clone())
        .with_questions(FakeReply::text(questions.clone()))
        .with_answers(FakeReply::text(answers.clone()));
    Ok(ScoringContext::new(Arc::new(client), settings.llm, settings.retry))
}

fn read_texts(pair: &TextPair) -> anyhow::Result<(String, String)> {
    let expected = read_text("expected", pair.expected.as_deref(), pair.expected_file.as_deref())?;
    let given = read_text("given", pair.given.as_deref(), pair.given_file.as_deref())?;
    Ok((expected, given))
}

fn read_text(name: &str, inline: Option<&str>, file: Option<&Path>) -> anyhow::Result<String> {
    match (inline, file) {
        (Some(text), _) => Ok(text.to_string()),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {} text from {}", name, path.display())),
        (None, None) => Err(UsageError(format!("missing --{name} or --{name}-file")).into()),
    }
}
