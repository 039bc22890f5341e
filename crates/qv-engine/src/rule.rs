//! The rule type shared by all cycles.

use qv_core::{Severity, Violation};
use regex::Regex;
use std::ops::Range;

/// Default rule priority.
pub const DEFAULT_PRIORITY: i32 = 100;
/// Reserved for critical security rules; sorts them ahead of everything.
pub const SECURITY_PRIORITY: i32 = 200;

/// The kind of content a tool invocation exposes to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolContext {
    FileWrite,
    Bash,
    Mcp,
    Web,
}

/// Which contexts a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applicability {
    FileWrite,
    Bash,
    Mcp,
    Web,
    All,
}

impl Applicability {
    pub fn covers(self, context: ToolContext) -> bool {
        match self {
            Applicability::All => true,
            Applicability::FileWrite => context == ToolContext::FileWrite,
            Applicability::Bash => context == ToolContext::Bash,
            Applicability::Mcp => context == ToolContext::Mcp,
            Applicability::Web => context == ToolContext::Web,
        }
    }
}

/// Suppression predicate: return `true` to discard a match. Receives the
/// full content and the match's byte range.
pub type SkipPredicate = fn(&str, Range<usize>) -> bool;

/// A single pattern rule. The catalogs construct these once, at first use,
/// with every pattern pre-compiled; the set is immutable afterwards.
pub struct Rule {
    pub id: &'static str,
    pub cycle: u8,
    pub pattern: Regex,
    pub applies_to: Applicability,
    /// Restrict the rule to these file extensions. `None` applies anywhere.
    pub file_extensions: Option<&'static [&'static str]>,
    pub priority: i32,
    pub severity: Severity,
    /// Namespace-qualified stable identifier (`quality.*`, `security.*`,
    /// `research.*`). `id` is the short human name.
    pub code: &'static str,
    pub remediation: &'static str,
    /// Require the match offset to fall outside comments and strings.
    pub context_aware: bool,
    pub message: &'static str,
    pub skip_if: Option<SkipPredicate>,
}

impl Rule {
    pub(crate) fn new(
        id: &'static str,
        cycle: u8,
        pattern: &str,
        applies_to: Applicability,
        severity: Severity,
        code: &'static str,
        message: &'static str,
        remediation: &'static str,
    ) -> Self {
        Self {
            id,
            cycle,
            pattern: Regex::new(pattern).expect("valid regex"),
            applies_to,
            file_extensions: None,
            priority: if cycle == 2 { SECURITY_PRIORITY } else { DEFAULT_PRIORITY },
            severity,
            code,
            remediation,
            context_aware: false,
            message,
            skip_if: None,
        }
    }

    pub(crate) fn extensions(mut self, exts: &'static [&'static str]) -> Self {
        self.file_extensions = Some(exts);
        self
    }

    pub(crate) fn context_aware(mut self) -> Self {
        self.context_aware = true;
        self
    }

    pub(crate) fn skip_if(mut self, predicate: SkipPredicate) -> Self {
        self.skip_if = Some(predicate);
        self
    }

    pub fn to_violation(&self) -> Violation {
        Violation {
            rule_id: self.id.to_string(),
            cycle: self.cycle,
            priority: self.priority,
            severity: self.severity,
            code: self.code.to_string(),
            remediation: self.remediation.to_string(),
            message: self.message.to_string(),
            condensed: false,
        }
    }

    /// Whether the rule runs for a file with the given extension. Rules
    /// with an extension filter never run on extension-less content.
    pub fn matches_extension(&self, extension: Option<&str>) -> bool {
        match self.file_extensions {
            None => true,
            Some(exts) => extension.is_some_and(|ext| exts.contains(&ext)),
        }
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("cycle", &self.cycle)
            .field("priority", &self.priority)
            .field("severity", &self.severity)
            .finish_non_exhaustive()
    }
}

/// Common code-file extensions, used by rules that scan any code.
pub(crate) const CODE_EXTENSIONS: &[&str] = &[
    "js", "ts", "jsx", "tsx", "mjs", "cjs", "py", "pyi", "rb", "go", "rs", "java", "c", "cpp",
    "h", "hpp", "cs", "php", "swift", "kt", "sh",
];

/// C-family extensions for rules specific to that syntax.
pub(crate) const C_FAMILY_EXTENSIONS: &[&str] = &["js", "ts", "jsx", "tsx", "mjs", "cjs"];

/// Indentation-family extensions.
pub(crate) const PYTHON_EXTENSIONS: &[&str] = &["py", "pyi"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_applicability_covers() {
        assert!(Applicability::All.covers(ToolContext::Bash));
        assert!(Applicability::All.covers(ToolContext::FileWrite));
        assert!(Applicability::Bash.covers(ToolContext::Bash));
        assert!(!Applicability::Bash.covers(ToolContext::FileWrite));
        assert!(Applicability::FileWrite.covers(ToolContext::FileWrite));
        assert!(!Applicability::Web.covers(ToolContext::Mcp));
    }

    #[test]
    fn test_security_rules_get_priority_200() {
        let rule = Rule::new(
            "r", 2, "x", Applicability::All, Severity::Critical, "security.r", "m", "f",
        );
        assert_eq!(rule.priority, SECURITY_PRIORITY);
    }

    #[test]
    fn test_non_security_rules_get_priority_100() {
        for cycle in [1u8, 4] {
            let rule = Rule::new(
                "r", cycle, "x", Applicability::All, Severity::Warn, "quality.r", "m", "f",
            );
            assert_eq!(rule.priority, DEFAULT_PRIORITY);
        }
    }

    #[test]
    fn test_extension_filtering() {
        let rule = Rule::new(
            "r", 1, "x", Applicability::FileWrite, Severity::Warn, "quality.r", "m", "f",
        )
        .extensions(PYTHON_EXTENSIONS);
        assert!(rule.matches_extension(Some("py")));
        assert!(!rule.matches_extension(Some("js")));
        assert!(!rule.matches_extension(None));

        let unrestricted = Rule::new(
            "r2", 1, "x", Applicability::All, Severity::Warn, "quality.r2", "m", "f",
        );
        assert!(unrestricted.matches_extension(None));
        assert!(unrestricted.matches_extension(Some("anything")));
    }
}
