//! Cycle 1: code-quality and completeness rules.
//!
//! These target file writes: the agent claiming work is done while leaving
//! placeholders, deferred-work markers, or swallowed errors behind.

use crate::rule::{Applicability, C_FAMILY_EXTENSIONS, CODE_EXTENSIONS, PYTHON_EXTENSIONS, Rule};
use qv_core::Severity;
use std::sync::LazyLock;

pub static CYCLE1_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new(
            "no-todo-comment",
            1,
            r"(?i)\b(?:TODO|FIXME|HACK|XXX)\b",
            Applicability::FileWrite,
            Severity::Warn,
            "quality.deferred-work",
            "deferred-work marker (TODO/FIXME/HACK/XXX) in new code",
            "Finish the deferred work now or remove the marker; ship working code, not a note.",
        )
        .extensions(CODE_EXTENSIONS),
        Rule::new(
            "no-empty-pass",
            1,
            r"(?m)^[ \t]*pass[ \t]*$",
            Applicability::FileWrite,
            Severity::Warn,
            "quality.empty-pass",
            "placeholder `pass` body",
            "Implement the body instead of leaving a bare `pass`.",
        )
        .extensions(PYTHON_EXTENSIONS)
        .context_aware(),
        Rule::new(
            "no-raise-not-implemented",
            1,
            r"raise\s+NotImplementedError",
            Applicability::FileWrite,
            Severity::Warn,
            "quality.not-implemented",
            "raises NotImplementedError instead of implementing",
            "Implement the operation; NotImplementedError is a placeholder, not a result.",
        )
        .extensions(PYTHON_EXTENSIONS)
        .context_aware(),
        Rule::new(
            "no-ellipsis-body",
            1,
            r"(?m)^[ \t]*\.\.\.[ \t]*$",
            Applicability::FileWrite,
            Severity::Warn,
            "quality.ellipsis-placeholder",
            "ellipsis placeholder body",
            "Replace `...` with the real implementation.",
        )
        .extensions(PYTHON_EXTENSIONS)
        .context_aware(),
        Rule::new(
            "no-placeholder-stub",
            1,
            r"(?i)\b(?:placeholder|your code here|implementation (?:goes )?here|rest of (?:the|your) code|to be implemented)\b",
            Applicability::FileWrite,
            Severity::Warn,
            "quality.placeholder-stub",
            "placeholder stub text in place of an implementation",
            "Write the actual implementation where the stub text sits.",
        ),
        Rule::new(
            "no-throw-not-implemented",
            1,
            r#"(?i)throw\s+new\s+Error\s*\(\s*["'`]\s*(?:not\s+implemented|unimplemented)"#,
            Applicability::FileWrite,
            Severity::Warn,
            "quality.not-implemented-throw",
            "throws a not-implemented error instead of implementing",
            "Implement the function; a not-implemented throw is a placeholder.",
        )
        .extensions(C_FAMILY_EXTENSIONS)
        .context_aware(),
        Rule::new(
            "no-empty-catch",
            1,
            r"catch\s*(?:\([^)]*\))?\s*\{\s*\}",
            Applicability::FileWrite,
            Severity::Warn,
            "quality.empty-catch",
            "empty catch block swallows errors",
            "Handle the error or rethrow; an empty catch hides failures.",
        )
        .extensions(C_FAMILY_EXTENSIONS)
        .context_aware(),
        Rule::new(
            "no-empty-except",
            1,
            r"(?m)^[ \t]*except\b[^\n:]*:[ \t]*(?:#[^\n]*)?\n[ \t]*pass\b",
            Applicability::FileWrite,
            Severity::Warn,
            "quality.empty-except",
            "except block that only passes",
            "Handle the exception or let it propagate; `except: pass` hides failures.",
        )
        .extensions(PYTHON_EXTENSIONS)
        .context_aware(),
        Rule::new(
            "no-bare-except",
            1,
            r"(?m)^[ \t]*except[ \t]*:",
            Applicability::FileWrite,
            Severity::Warn,
            "quality.bare-except",
            "bare except clause catches everything",
            "Catch the specific exception types the code can actually handle.",
        )
        .extensions(PYTHON_EXTENSIONS)
        .context_aware(),
        Rule::new(
            "no-log-only-catch",
            1,
            r"catch\s*\([^)]*\)\s*\{[ \t\r\n]*console\.(?:log|error|warn)\s*\([^)]*\)\s*;?[ \t\r\n]*\}",
            Applicability::FileWrite,
            Severity::Warn,
            "quality.log-only-catch",
            "catch block that only logs",
            "Recover, rethrow, or surface the error; logging alone loses it.",
        )
        .extensions(C_FAMILY_EXTENSIONS)
        .context_aware(),
        Rule::new(
            "no-empty-function",
            1,
            r"(?:function\s+\w+\s*\([^)]*\)|\)\s*=>)\s*\{\s*\}",
            Applicability::FileWrite,
            Severity::Warn,
            "quality.empty-function",
            "empty function body",
            "Implement the function body or remove the function.",
        )
        .extensions(C_FAMILY_EXTENSIONS)
        .context_aware(),
        // Off by default: enabled by removing it from `disabledRules`.
        Rule::new(
            "no-any-type",
            1,
            r":\s*any\b",
            Applicability::FileWrite,
            Severity::Info,
            "quality.any-type",
            "`any` type erases type checking",
            "Give the value a concrete type.",
        )
        .extensions(&["ts", "tsx"])
        .context_aware(),
    ]
});

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: &str) -> &'static Rule {
        CYCLE1_RULES
            .iter()
            .find(|r| r.id == id)
            .unwrap_or_else(|| panic!("rule {id} missing"))
    }

    #[test]
    fn test_ids_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for rule in CYCLE1_RULES.iter() {
            assert!(seen.insert(rule.id), "duplicate rule id {}", rule.id);
            assert_eq!(rule.cycle, 1);
            assert!(rule.code.starts_with("quality."), "bad namespace: {}", rule.code);
        }
    }

    #[test]
    fn test_empty_pass_matches() {
        assert!(rule("no-empty-pass").pattern.is_match("def f():\n    pass\n"));
        assert!(!rule("no-empty-pass").pattern.is_match("passport = 1\n"));
    }

    #[test]
    fn test_todo_marker_matches() {
        let re = &rule("no-todo-comment").pattern;
        assert!(re.is_match("// TODO: finish this"));
        assert!(re.is_match("# fixme later"));
        assert!(!re.is_match("let todos = list()")); // `todos` is not a marker
    }

    #[test]
    fn test_not_implemented_patterns() {
        assert!(rule("no-raise-not-implemented")
            .pattern
            .is_match("raise NotImplementedError(\"later\")"));
        assert!(rule("no-throw-not-implemented")
            .pattern
            .is_match("throw new Error('Not implemented yet')"));
        assert!(rule("no-throw-not-implemented")
            .pattern
            .is_match("throw new Error(\"unimplemented\")"));
    }

    #[test]
    fn test_empty_catch_variants() {
        let re = &rule("no-empty-catch").pattern;
        assert!(re.is_match("try { x() } catch (e) {}"));
        assert!(re.is_match("try { x() } catch {}"));
        assert!(!re.is_match("catch (e) { recover(e) }"));
    }

    #[test]
    fn test_except_rules() {
        assert!(rule("no-empty-except")
            .pattern
            .is_match("try:\n    f()\nexcept ValueError:\n    pass\n"));
        assert!(rule("no-bare-except").pattern.is_match("except:\n"));
        assert!(!rule("no-bare-except").pattern.is_match("except ValueError:\n"));
    }

    #[test]
    fn test_log_only_catch() {
        let re = &rule("no-log-only-catch").pattern;
        assert!(re.is_match("catch (e) { console.error(e); }"));
        assert!(re.is_match("catch (err) {\n  console.log(err)\n}"));
        assert!(!re.is_match("catch (e) { console.error(e); throw e; }"));
    }

    #[test]
    fn test_empty_function() {
        let re = &rule("no-empty-function").pattern;
        assert!(re.is_match("function handler() {}"));
        assert!(re.is_match("const f = (a, b) => {}"));
        assert!(!re.is_match("function g() { return 1; }"));
    }

    #[test]
    fn test_any_type_is_info_and_ts_only() {
        let any_rule = rule("no-any-type");
        assert_eq!(any_rule.severity, Severity::Info);
        assert!(any_rule.matches_extension(Some("ts")));
        assert!(!any_rule.matches_extension(Some("js")));
        assert!(any_rule.pattern.is_match("function f(x: any) {}"));
    }
}
