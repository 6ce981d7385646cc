use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use texts_score_core::{AggType, ScoreType};

#[derive(Parser, Debug)]
#[command(
    name = "texts-score",
    version,
    about = "Question-based similarity scoring for expected/given text pairs"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,

    #[command(flatten)]
    pub llm: LlmArgs,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute one score and print it
    Score(ScoreArgs),
    /// Run repeated rounds and print every sample as JSON
    Multiple(MultipleArgs),
    /// Assert a score lies within bounds (exit 1 if not)
    Expect(ExpectArgs),
    /// Assert an aggregated score over repeated rounds (exit 1 if not)
    Agg(AggArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Provider {
    /// OpenAI, or Azure OpenAI when endpoint and deployment are set
    #[default]
    Openai,
    /// Offline client replaying `--fake-questions` / `--fake-answers`
    Fake,
}

/// Generation client settings. Flags override env, env overrides `--config`.
#[derive(Args, Debug, Clone, Default)]
pub struct LlmArgs {
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = Provider::Openai,
        env = "TEXTS_SCORE_PROVIDER"
    )]
    pub provider: Provider,

    /// Question-generation reply for `--provider fake`
    #[arg(long, global = true)]
    pub fake_questions: Option<String>,

    /// Answer-evaluation reply for `--provider fake`
    #[arg(long, global = true)]
    pub fake_answers: Option<String>,

    /// YAML settings file (llm + retry sections)
    #[arg(long, global = true, env = "TEXTS_SCORE_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, env = "TEXTS_SCORE_LLM_API_KEY", hide_env_values = true)]
    pub llm_api_key: Option<String>,

    /// Azure resource or OpenAI-compatible base URL
    #[arg(long, global = true, env = "TEXTS_SCORE_LLM_ENDPOINT")]
    pub llm_endpoint: Option<String>,

    /// Azure deployment name
    #[arg(long, global = true, env = "TEXTS_SCORE_LLM_DEPLOYMENT")]
    pub llm_deployment: Option<String>,

    #[arg(long, global = true, env = "TEXTS_SCORE_LLM_MODEL")]
    pub llm_model: Option<String>,

    #[arg(long, global = true, env = "TEXTS_SCORE_LLM_API_VERSION")]
    pub llm_api_version: Option<String>,

    #[arg(long, global = true, env = "TEXTS_SCORE_LLM_TEMPERATURE")]
    pub llm_temperature: Option<f32>,

    #[arg(long, global = true, env = "TEXTS_SCORE_LLM_MAX_TOKENS")]
    pub llm_max_tokens: Option<u32>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "TEXTS_SCORE_LLM_TIMEOUT")]
    pub llm_timeout: Option<u64>,

    /// Retries per scoring round
    #[arg(long, global = true, env = "TEXTS_SCORE_MAX_RETRIES")]
    pub max_retries: Option<u32>,

    /// Backoff base delay in milliseconds (0 disables sleeping)
    #[arg(long, global = true, env = "TEXTS_SCORE_RETRY_BASE_MS")]
    pub retry_base_ms: Option<u64>,
}

/// The text pair, inline or from files.
#[derive(Args, Debug, Clone)]
pub struct TextPair {
    /// Reference text
    #[arg(long, required_unless_present = "expected_file", conflicts_with = "expected_file")]
    pub expected: Option<String>,

    #[arg(long)]
    pub expected_file: Option<PathBuf>,

    /// Text under test
    #[arg(long, required_unless_present = "given_file", conflicts_with = "given_file")]
    pub given: Option<String>,

    #[arg(long)]
    pub given_file: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ScoreArgs {
    #[command(flatten)]
    pub texts: TextPair,

    /// f1 | precision | recall
    #[arg(long = "type", default_value = "f1")]
    pub score_type: ScoreType,

    /// Fail on the first transient error instead of retrying the round
    #[arg(long)]
    pub no_retry: bool,

    /// Print `{"score_type": .., "score": ..}` instead of the bare value
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct MultipleArgs {
    #[command(flatten)]
    pub texts: TextPair,

    #[arg(long = "type", default_value = "f1")]
    pub score_type: ScoreType,

    /// Rounds, each with freshly generated questions
    #[arg(long, default_value_t = 5)]
    pub full_runs: u32,

    /// Evaluations per round against the same questions
    #[arg(long, default_value_t = 1)]
    pub each_question_runs: u32,

    #[arg(long)]
    pub no_retry: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExpectArgs {
    #[command(flatten)]
    pub texts: TextPair,

    #[arg(long = "type", default_value = "f1")]
    pub score_type: ScoreType,

    /// Target score; accepted window is target ± max-delta
    #[arg(long, conflicts_with_all = ["min", "max"])]
    pub target: Option<f64>,

    #[arg(long, default_value_t = 0.2)]
    pub max_delta: f64,

    /// Lower bound of the accepted range
    #[arg(long)]
    pub min: Option<f64>,

    /// Upper bound of the accepted range
    #[arg(long)]
    pub max: Option<f64>,

    /// Do not log advisory warnings about weak bounds
    #[arg(long)]
    pub skip_warnings: bool,

    #[arg(long)]
    pub no_retry: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AggArgs {
    #[command(flatten)]
    pub texts: TextPair,

    #[arg(long = "type", default_value = "f1")]
    pub score_type: ScoreType,

    /// minimum | maximum | median | mean (average)
    #[arg(long = "agg")]
    pub agg_type: AggType,

    /// Lower bound for minimum, upper bound for maximum, target for median/mean
    #[arg(long)]
    pub bound: f64,

    /// Tolerance around the target of median/mean
    #[arg(long, default_value_t = 0.1)]
    pub max_delta: f64,

    #[arg(long, default_value_t = 5)]
    pub full_runs: u32,

    #[arg(long, default_value_t = 1)]
    pub each_question_runs: u32,

    #[arg(long)]
    pub skip_warnings: bool,

    #[arg(long)]
    pub no_retry: bool,
}
