//! Rule violations and severity semantics.

use serde::{Deserialize, Serialize};

/// Severity of a fired rule.
///
/// `Critical` and `Warn` both produce a blocking decision on the pre-tool
/// hook; `Info` is reported in the audit trail but approved. Trust level
/// `strict` upgrades `Info` to `Warn` for the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
    Critical,
}

impl Severity {
    /// Whether a violation at this severity blocks the tool call.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Severity::Critical | Severity::Warn)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warn => write!(f, "warn"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// A single rule violation produced by the engine.
///
/// `priority` drives ordering (200 is reserved for critical security rules,
/// 100 is the default); `code` is the namespace-qualified stable identifier
/// (`quality.*`, `security.*`, `research.*`, `behavior.*`) while `rule_id`
/// is the short human name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub rule_id: String,
    pub cycle: u8,
    pub priority: i32,
    pub severity: Severity,
    pub code: String,
    pub remediation: String,
    pub message: String,
    #[serde(default)]
    pub condensed: bool,
}

/// Sort violations by priority descending. `sort_by` is stable, so items
/// with equal priority keep their rule declaration order.
pub fn sort_by_priority(violations: &mut [Violation]) {
    violations.sort_by(|a, b| b.priority.cmp(&a.priority));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violation(rule_id: &str, priority: i32, severity: Severity) -> Violation {
        Violation {
            rule_id: rule_id.to_string(),
            cycle: 1,
            priority,
            severity,
            code: format!("quality.{rule_id}"),
            remediation: String::new(),
            message: String::new(),
            condensed: false,
        }
    }

    #[test]
    fn test_blocking_severities() {
        assert!(Severity::Critical.is_blocking());
        assert!(Severity::Warn.is_blocking());
        assert!(!Severity::Info.is_blocking());
    }

    #[test]
    fn test_sort_is_descending_by_priority() {
        let mut violations = vec![
            violation("a", 100, Severity::Warn),
            violation("b", 200, Severity::Critical),
            violation("c", 100, Severity::Info),
        ];
        sort_by_priority(&mut violations);
        let ids: Vec<_> = violations.iter().map(|v| v.rule_id.as_str()).collect();
        assert_eq!(ids, ["b", "a", "c"]);
    }

    #[test]
    fn test_sort_preserves_declaration_order_within_equal_priority() {
        let mut violations = vec![
            violation("first", 100, Severity::Warn),
            violation("second", 100, Severity::Warn),
            violation("third", 100, Severity::Warn),
        ];
        sort_by_priority(&mut violations);
        let ids: Vec<_> = violations.iter().map(|v| v.rule_id.as_str()).collect();
        assert_eq!(ids, ["first", "second", "third"]);
    }

    #[test]
    fn test_severity_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::Critical).unwrap(), "\"critical\"");
        assert_eq!(serde_json::to_string(&Severity::Warn).unwrap(), "\"warn\"");
        assert_eq!(serde_json::to_string(&Severity::Info).unwrap(), "\"info\"");
    }

    #[test]
    fn test_violation_serde_roundtrip() {
        let original = violation("no-eval", 200, Severity::Critical);
        let json = serde_json::to_string(&original).unwrap();
        assert!(json.contains("\"ruleId\":\"no-eval\""));
        let back: Violation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, original);
    }
}
