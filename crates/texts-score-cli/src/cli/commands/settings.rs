//! Layering of `--config` file, environment and flags into `Settings`.

use texts_score_core::Settings;

use crate::cli::args::LlmArgs;

/// File first, then flags (clap has already folded `TEXTS_SCORE_*` env into them).
/// `OPENAI_API_KEY` is the last resort for the key.
pub fn resolve(args: &LlmArgs) -> anyhow::Result<Settings> {
    let mut settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    let llm = &mut settings.llm;
    if let Some(key) = &args.llm_api_key {
        llm.api_key = Some(key.clone());
    }
    if let Some(endpoint) = &args.llm_endpoint {
        llm.endpoint = Some(endpoint.clone());
    }
    if let Some(deployment) = &args.llm_deployment {
        llm.deployment = Some(deployment.clone());
    }
    if let Some(model) = &args.llm_model {
        llm.model = model.clone();
    }
    if let Some(version) = &args.llm_api_version {
        llm.api_version = version.clone();
    }
    if let Some(temperature) = args.llm_temperature {
        llm.temperature = temperature;
    }
    if let Some(max_tokens) = args.llm_max_tokens {
        llm.max_tokens = max_tokens;
    }
    if let Some(timeout) = args.llm_timeout {
        llm.timeout_secs = timeout;
    }
    if llm.api_key.is_none() {
        llm.api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());
    }

    if let Some(max_retries) = args.max_retries {
        settings.retry.max_retries = max_retries;
    }
    if let Some(base) = args.retry_base_ms {
        settings.retry.base_delay_ms = base;
    }

    Ok(settings)
}
