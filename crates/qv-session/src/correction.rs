//! Self-correction tracking.
//!
//! Each blocked write against a path bumps that path's attempt counter and
//! appends the violation set to its history. Remediation hints ride along
//! with every block; after the third block on the same path an escalation
//! block recommends a different approach, listing every rule involved so
//! far.

use crate::state::{CorrectionAttempt, SessionState};
use qv_core::Violation;
use std::collections::BTreeSet;

/// Blocks on one path before escalation triggers.
pub const ESCALATION_THRESHOLD: u32 = 3;

/// Record a block against `path`. Returns the updated attempt count.
pub fn record_block(
    state: &mut SessionState,
    path: &str,
    violations: &[Violation],
    now_ms: i64,
) -> u32 {
    let correction = state.correction.entry(path.to_string()).or_default();
    correction.attempts += 1;
    correction.history.push_back(CorrectionAttempt {
        ts: now_ms,
        violations: violations.iter().map(|v| v.rule_id.clone()).collect(),
    });
    let attempts = correction.attempts;

    for violation in violations {
        let counters = state
            .effectiveness
            .entry(violation.rule_id.clone())
            .or_default();
        counters.total += 1;
        // A repeat block on the same path means the previous hint was
        // ignored.
        if attempts > 1 {
            counters.ignored += 1;
        }
    }

    attempts
}

/// Record a clean (non-blocked) write to a path that was previously
/// blocked: credit the rules from the last attempt as fixed.
pub fn record_clean_write(state: &mut SessionState, path: &str) {
    let Some(correction) = state.correction.get(path) else {
        return;
    };
    let Some(last_attempt) = correction.history.back() else {
        return;
    };
    for rule_id in last_attempt.violations.clone() {
        if let Some(counters) = state.effectiveness.get_mut(&rule_id) {
            counters.fixed += 1;
        }
    }
}

/// Numbered remediation hints, one per violation, appended after the block
/// reason.
pub fn compose_hints(violations: &[Violation]) -> String {
    let lines: Vec<String> = violations
        .iter()
        .enumerate()
        .map(|(i, v)| format!("{}. [{}] {}", i + 1, v.rule_id, v.remediation))
        .collect();
    lines.join("\n")
}

/// The escalation block, once a path has been blocked
/// [`ESCALATION_THRESHOLD`] times. Lists the union of rule ids across every
/// prior attempt.
pub fn escalation_block(state: &SessionState, path: &str) -> Option<String> {
    let correction = state.correction.get(path)?;
    if correction.attempts < ESCALATION_THRESHOLD {
        return None;
    }
    let rule_ids: BTreeSet<&str> = correction
        .history
        .iter()
        .flat_map(|attempt| attempt.violations.iter().map(String::as_str))
        .collect();
    let rule_list: Vec<&str> = rule_ids.into_iter().collect();
    Some(format!(
        "ESCALATION: {path} has been blocked {} times (rules: {}). Repeating the same edit \
         is not converging; step back and take a different approach to this file.",
        correction.attempts,
        rule_list.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use qv_core::Severity;

    fn violation(rule_id: &str) -> Violation {
        Violation {
            rule_id: rule_id.into(),
            cycle: 2,
            priority: 200,
            severity: Severity::Critical,
            code: format!("security.{rule_id}"),
            remediation: format!("fix {rule_id}"),
            message: format!("{rule_id} fired"),
            condensed: false,
        }
    }

    #[test]
    fn test_attempts_accumulate_per_path() {
        let mut state = SessionState::default();
        assert_eq!(record_block(&mut state, "a.py", &[violation("no-eval")], 0), 1);
        assert_eq!(record_block(&mut state, "a.py", &[violation("no-eval")], 1), 2);
        assert_eq!(record_block(&mut state, "b.py", &[violation("no-exec")], 2), 1);
    }

    #[test]
    fn test_no_escalation_below_threshold() {
        let mut state = SessionState::default();
        record_block(&mut state, "src/a.py", &[violation("no-eval")], 0);
        record_block(&mut state, "src/a.py", &[violation("no-eval")], 1);
        assert!(escalation_block(&state, "src/a.py").is_none());
    }

    #[test]
    fn test_escalation_at_three_blocks_lists_rule_union() {
        let mut state = SessionState::default();
        record_block(&mut state, "src/a.py", &[violation("no-eval")], 0);
        record_block(&mut state, "src/a.py", &[violation("no-eval")], 1);
        record_block(&mut state, "src/a.py", &[violation("no-exec")], 2);

        let block = escalation_block(&state, "src/a.py").expect("escalates");
        assert!(block.contains("blocked 3 times"));
        assert!(block.contains("no-eval"));
        assert!(block.contains("no-exec"));
        assert!(block.contains("src/a.py"));
    }

    #[test]
    fn test_escalation_for_unknown_path_is_none() {
        let state = SessionState::default();
        assert!(escalation_block(&state, "never-blocked.py").is_none());
    }

    #[test]
    fn test_hints_are_numbered_with_rule_ids() {
        let hints = compose_hints(&[violation("no-eval"), violation("no-exec")]);
        assert_eq!(hints, "1. [no-eval] fix no-eval\n2. [no-exec] fix no-exec");
    }

    #[test]
    fn test_effectiveness_counters() {
        let mut state = SessionState::default();
        record_block(&mut state, "a.py", &[violation("no-eval")], 0);
        assert_eq!(state.effectiveness["no-eval"].total, 1);
        assert_eq!(state.effectiveness["no-eval"].ignored, 0);

        record_block(&mut state, "a.py", &[violation("no-eval")], 1);
        assert_eq!(state.effectiveness["no-eval"].total, 2);
        assert_eq!(state.effectiveness["no-eval"].ignored, 1);

        record_clean_write(&mut state, "a.py");
        assert_eq!(state.effectiveness["no-eval"].fixed, 1);
    }

    #[test]
    fn test_clean_write_without_prior_block_is_a_no_op() {
        let mut state = SessionState::default();
        record_clean_write(&mut state, "fresh.py");
        assert!(state.effectiveness.is_empty());
    }
}
