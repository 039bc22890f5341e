//! Verification prompt budget.
//!
//! Every piece of text the verifier injects back at the agent (block
//! reasons, stop prompts, behavioral warnings, correction hints) costs the
//! agent context. The budget tracks an estimate per session and condenses
//! violation messages once the configured ceiling is crossed.

use crate::state::BudgetState;
use qv_core::Violation;

/// Injection sources tracked by the budget.
pub const SOURCE_BLOCK_MESSAGE: &str = "block-message";
pub const SOURCE_STOP_PROMPT: &str = "stop-prompt";
pub const SOURCE_BEHAVIORAL_WARNING: &str = "behavioral-warning";
pub const SOURCE_CORRECTION_HINT: &str = "correction-hint";

/// Condensed messages are cut to this many characters, ellipsis included.
const CONDENSED_MESSAGE_CHARS: usize = 80;

/// Deterministic token estimate: one token per four bytes, rounded up.
pub fn estimate_tokens(text: &str) -> u32 {
    (text.len().div_ceil(4)) as u32
}

/// Record an injection against the session budget.
pub fn record(budget: &mut BudgetState, source: &str, text: &str) {
    let tokens = estimate_tokens(text);
    budget.total_tokens = budget.total_tokens.saturating_add(tokens);
    let usage = budget.sources.entry(source.to_string()).or_default();
    usage.tokens = usage.tokens.saturating_add(tokens);
    usage.count += 1;
}

/// When the session total exceeds `max_tokens`, condense the pending
/// violation messages: anything longer than 80 characters is truncated with
/// an ellipsis, and every message is flagged `condensed`. Returns whether
/// condensation ran.
pub fn condense_if_over_budget(
    budget: &BudgetState,
    max_tokens: u32,
    violations: &mut [Violation],
) -> bool {
    if budget.total_tokens <= max_tokens {
        return false;
    }
    for violation in violations.iter_mut() {
        if violation.message.chars().count() > CONDENSED_MESSAGE_CHARS {
            let kept: String = violation
                .message
                .chars()
                .take(CONDENSED_MESSAGE_CHARS - 3)
                .collect();
            violation.message = format!("{kept}...");
        }
        violation.condensed = true;
    }
    true
}
