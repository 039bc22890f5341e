//! Rule evaluation and the blocking decision.

use crate::context::{SourceFamily, is_masked};
use crate::router::RouteMode;
use crate::rule::{Rule, ToolContext};
use crate::rules_quality::CYCLE1_RULES;
use crate::rules_research::CYCLE4_RULES;
use crate::rules_security::CYCLE2_RULES;
use qv_config::{ResolvedConfig, TrustLevel};
use qv_core::{Severity, Violation, violation::sort_by_priority};

/// Everything the engine needs for one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct EvalInput<'a> {
    pub content: &'a str,
    /// Lower-cased file extension, when the invocation targets a file.
    pub extension: Option<&'a str>,
    pub tool_context: ToolContext,
    pub route: RouteMode,
}

/// Run Cycles 1 and 2 over extracted tool content. Violations come back
/// sorted by priority descending, declaration order within ties.
pub fn evaluate_code(input: EvalInput<'_>, config: &ResolvedConfig) -> Vec<Violation> {
    let rules = CYCLE1_RULES.iter().chain(CYCLE2_RULES.iter());
    run_rules(rules, input, config)
}

/// Run Cycle 4 over a research artifact.
pub fn evaluate_research(content: &str, config: &ResolvedConfig) -> Vec<Violation> {
    let input = EvalInput {
        content,
        extension: Some("md"),
        tool_context: ToolContext::FileWrite,
        route: RouteMode::Standard,
    };
    run_rules(CYCLE4_RULES.iter(), input, config)
}

fn run_rules<'r>(
    rules: impl Iterator<Item = &'r Rule>,
    input: EvalInput<'_>,
    config: &ResolvedConfig,
) -> Vec<Violation> {
    let family = input.extension.and_then(SourceFamily::from_extension);
    // Stripped lazily: most evaluations never reach a context-aware rule.
    let mut stripped: Option<String> = None;

    let mut violations = Vec::new();
    for rule in rules {
        // Strict routing ignores the disabled list for this invocation.
        if input.route != RouteMode::Strict && config.disabled_rules.contains(rule.id) {
            continue;
        }
        if input.route == RouteMode::Light && rule.severity != Severity::Critical {
            continue;
        }
        if !rule.applies_to.covers(input.tool_context) {
            continue;
        }
        if !rule.matches_extension(input.extension) {
            continue;
        }

        let fired = rule.pattern.find_iter(input.content).any(|m| {
            if rule.context_aware {
                if let Some(family) = family {
                    let stripped = stripped.get_or_insert_with(|| family.strip(input.content));
                    if is_masked(input.content, stripped, m.start()) {
                        return false;
                    }
                }
            }
            if let Some(skip) = rule.skip_if {
                if skip(input.content, m.range()) {
                    return false;
                }
            }
            true
        });
        if fired {
            violations.push(rule.to_violation());
        }
    }

    sort_by_priority(&mut violations);
    if !violations.is_empty() {
        tracing::debug!(count = violations.len(), "rules fired");
    }
    violations
}

/// Severity after the trust-level adjustment: `strict` upgrades `info` to
/// `warn` for the blocking decision.
pub fn effective_severity(severity: Severity, trust: TrustLevel) -> Severity {
    if trust == TrustLevel::Strict && severity == Severity::Info {
        Severity::Warn
    } else {
        severity
    }
}

/// Whether this violation set produces a blocking decision.
pub fn decide_blocks(violations: &[Violation], trust: TrustLevel) -> bool {
    violations
        .iter()
        .any(|v| effective_severity(v.severity, trust).is_blocking())
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
