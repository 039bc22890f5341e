//! Cycle 5: the optional second-opinion verifier.
//!
//! Strictly opt-in. When enabled and the finalized response is long enough,
//! a short verification prompt goes to the configured model with a 10 s
//! deadline. Every failure mode (network, status, timeout, unparseable
//! reply) maps to a passing fail-open verdict; this path can annotate a
//! stop prompt but can never block, and the system's correctness never
//! depends on it.

use qv_config::Cycle5Config;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_EXCERPT_CHARS: usize = 500;
const RESPONSE_EXCERPT_CHARS: usize = 2_000;

/// Outcome of a cycle-5 check. `pass` is `true` on every failure path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceVerdict {
    pub pass: bool,
    pub skipped: bool,
    pub reasoning: String,
}

impl InferenceVerdict {
    fn skipped(reasoning: impl Into<String>) -> Self {
        Self {
            pass: true,
            skipped: true,
            reasoning: reasoning.into(),
        }
    }

    fn fail_open(cause: impl std::fmt::Display) -> Self {
        Self {
            pass: true,
            skipped: false,
            reasoning: format!("fail-open: {cause}"),
        }
    }
}

fn excerpt(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Same deterministic heuristic the budget manager uses.
fn estimate_tokens(text: &str) -> u32 {
    (text.len().div_ceil(4)) as u32
}

fn verification_prompt(request: &str, response: &str) -> String {
    format!(
        "You are reviewing a coding assistant's finalized answer.\n\
         User request (excerpt):\n{}\n\n\
         Assistant response (excerpt):\n{}\n\n\
         Did the response fully and correctly address the request? Reply with \
         JSON only: {{\"pass\": true|false, \"reasoning\": \"one sentence\"}}",
        excerpt(request, REQUEST_EXCERPT_CHARS),
        excerpt(response, RESPONSE_EXCERPT_CHARS),
    )
}

/// Parse the model's reply, tolerating markdown code fences around the JSON.
fn parse_verdict(content: &str) -> Option<InferenceVerdict> {
    let trimmed = content.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix("```").unwrap_or(trimmed).trim();

    #[derive(Deserialize)]
    struct RawVerdict {
        pass: bool,
        #[serde(default)]
        reasoning: String,
    }
    let raw: RawVerdict = serde_json::from_str(trimmed).ok()?;
    Some(InferenceVerdict {
        pass: raw.pass,
        skipped: false,
        reasoning: raw.reasoning,
    })
}

/// Score a finalized response against the original request.
pub async fn verify_response(
    config: &Cycle5Config,
    request: &str,
    response: &str,
) -> InferenceVerdict {
    if !config.enabled {
        return InferenceVerdict::skipped("cycle5 disabled");
    }
    if estimate_tokens(response) < config.min_response_tokens {
        return InferenceVerdict::skipped("response below minResponseTokens");
    }
    let Some(api_key) = config.api_key.as_deref().filter(|key| !key.is_empty()) else {
        return InferenceVerdict::fail_open("no API key configured");
    };

    let client = match reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build() {
        Ok(client) => client,
        Err(err) => return InferenceVerdict::fail_open(err),
    };

    let body = serde_json::json!({
        "model": config.model,
        "temperature": 0,
        "messages": [{"role": "user", "content": verification_prompt(request, response)}],
    });

    let reply = match client
        .post(ENDPOINT)
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .await
    {
        Ok(reply) => reply,
        Err(err) if err.is_timeout() => return InferenceVerdict::fail_open("request timed out"),
        Err(err) => return InferenceVerdict::fail_open(err),
    };
    if !reply.status().is_success() {
        return InferenceVerdict::fail_open(format!("endpoint returned {}", reply.status()));
    }

    let payload: serde_json::Value = match reply.json().await {
        Ok(payload) => payload,
        Err(err) => return InferenceVerdict::fail_open(err),
    };
    let Some(content) = payload["choices"][0]["message"]["content"].as_str() else {
        return InferenceVerdict::fail_open("malformed completion payload");
    };
    parse_verdict(content)
        .unwrap_or_else(|| InferenceVerdict::fail_open("verdict was not valid JSON"))
}

/// Synchronous wrapper for the hook process, which is single-threaded and
/// only suspends for this one call.
pub fn verify_response_blocking(
    config: &Cycle5Config,
    request: &str,
    response: &str,
) -> InferenceVerdict {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => return InferenceVerdict::fail_open(err),
    };
    runtime.block_on(verify_response(config, request, response))
}
