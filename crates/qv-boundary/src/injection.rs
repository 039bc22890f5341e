//! Prompt-injection phrase detection.

use crate::homoglyph::fold_homoglyphs;
use regex::Regex;
use std::sync::LazyLock;

struct InjectionPattern {
    id: &'static str,
    description: &'static str,
    pattern: Regex,
}

/// A matched injection phrase. Findings warn; they never block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionFinding {
    pub id: &'static str,
    pub description: &'static str,
}

macro_rules! injection_pattern {
    ($id:literal, $description:literal, $regex:literal) => {
        InjectionPattern {
            id: $id,
            description: $description,
            pattern: Regex::new($regex).expect("valid regex"),
        }
    };
}

static PATTERNS: LazyLock<Vec<InjectionPattern>> = LazyLock::new(|| {
    vec![
        injection_pattern!(
            "ignore-previous",
            "attempts to discard prior instructions",
            r"(?i)ignore\s+(?:all\s+)?previous\s+instructions"
        ),
        injection_pattern!(
            "disregard-above",
            "attempts to discard preceding context",
            r"(?i)disregard\s+(?:the\s+)?(?:above|prior|previous)"
        ),
        injection_pattern!(
            "system-override",
            "fake system-level override marker",
            r"(?i)system\s+override\s*:"
        ),
        injection_pattern!(
            "role-reassignment",
            "attempts to assign the agent a new identity",
            r"(?i)you\s+are\s+now\s+an?\b"
        ),
        injection_pattern!(
            "forget-everything",
            "attempts to reset the agent's context",
            r"(?i)forget\s+everything"
        ),
        injection_pattern!(
            "new-instructions",
            "injects a replacement instruction block",
            r"(?i)new\s+instructions\s*:"
        ),
        injection_pattern!(
            "act-as",
            "roleplay pivot",
            r"(?i)\bact\s+as\b"
        ),
        injection_pattern!(
            "pretend-you-are",
            "roleplay pivot",
            r"(?i)pretend\s+(?:you\s+are|to\s+be)"
        ),
        injection_pattern!(
            "override-safety",
            "attempts to disable safety behavior",
            r"(?i)override\s+safety"
        ),
        injection_pattern!(
            "ignore-all-rules",
            "attempts to discard all rules",
            r"(?i)ignore\s+all\s+rules"
        ),
        injection_pattern!(
            "bypass-restrictions",
            "attempts to bypass restrictions",
            r"(?i)bypass\s+restrictions?"
        ),
        injection_pattern!(
            "jailbreak-keyword",
            "known jailbreak vocabulary",
            r"(?i)\b(?:DAN|do\s+anything\s+now|developer\s+mode|god\s+mode|jailbreak)\b"
        ),
        injection_pattern!(
            "instruction-delimiter",
            "model instruction delimiters embedded in content",
            r"\[(?:INST|/?SYS(?:TEM)?)\]"
        ),
    ]
});

/// Scan content for injection phrases. Homoglyphs are folded first, so a
/// phrase spelled with fullwidth or Cyrillic lookalikes matches the same
/// bank as its ASCII spelling.
pub fn detect_injection_patterns(content: &str) -> Vec<InjectionFinding> {
    let folded = fold_homoglyphs(content);
    PATTERNS
        .iter()
        .filter(|entry| entry.pattern.is_match(&folded))
        .map(|entry| InjectionFinding {
            id: entry.id,
            description: entry.description,
        })
        .collect()
}
