//! Extraction of the JSON payload from a model response.
//!
//! Responses wrapped in a markdown code fence (```` ```json ... ``` ````) are
//! unwrapped and parsed, with a warning. Anything else that fails to parse is
//! a `Parse` error for the caller's retry loop.

use tracing::warn;

use crate::error::{ScoreError, ScoreResult};
use crate::providers::llm::Stage;

/// Strip a surrounding code fence, if any. Returns the inner text and whether a fence was found.
pub(crate) fn strip_code_fence(text: &str) -> (&str, bool) {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return (trimmed, false);
    };
    // Drop the info string (`json`, `JSON`, ...) up to the first newline.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };
    let body = body.trim_end();
    let body = body.strip_suffix("```").unwrap_or(body);
    (body.trim(), true)
}

pub(crate) fn parse_json(stage: Stage, text: &str) -> ScoreResult<serde_json::Value> {
    let (body, fenced) = strip_code_fence(text);
    if fenced {
        warn!(stage = %stage, "model wrapped its JSON payload in a code fence; stripping it");
    }
    if body.is_empty() {
        return Err(ScoreError::parse(stage, "empty response"));
    }
    serde_json::from_str(body).map_err(|e| ScoreError::parse(stage, format!("invalid JSON: {}", e)))
}
