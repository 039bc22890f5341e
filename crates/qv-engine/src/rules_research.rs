//! Cycle 4: research-claim sourcing rules.
//!
//! These apply only to Markdown artifacts recognized as research files. A
//! claim is considered sourced when a markdown link, a bare URL, or a
//! `[Source:/Ref:/Verified:]` tag appears within 300 characters on either
//! side of the match.

use crate::rule::{Applicability, Rule};
use qv_core::Severity;
use regex::Regex;
use std::ops::Range;
use std::path::Path;
use std::sync::LazyLock;

/// How far (in bytes) around a claim we look for a citation.
const SOURCE_WINDOW: usize = 300;

static SOURCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\]\([^)]*\)|https?://\S+|\[(?:source|ref|verified)\s*:").expect("valid regex")
});

fn floor_char_boundary(content: &str, mut index: usize) -> usize {
    if index >= content.len() {
        return content.len();
    }
    while index > 0 && !content.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_char_boundary(content: &str, mut index: usize) -> usize {
    if index >= content.len() {
        return content.len();
    }
    while index < content.len() && !content.is_char_boundary(index) {
        index += 1;
    }
    index
}

/// True when a citation exists near the claim, in which case the rule skips.
fn has_nearby_source(content: &str, range: Range<usize>) -> bool {
    let start = floor_char_boundary(content, range.start.saturating_sub(SOURCE_WINDOW));
    let end = ceil_char_boundary(content, range.end.saturating_add(SOURCE_WINDOW));
    SOURCE_RE.is_match(&content[start..end])
}

/// Markdown artifacts under a research path are eligible for Cycle 4.
pub fn is_research_path(path: &Path) -> bool {
    let is_markdown = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext, "md" | "markdown"));
    if !is_markdown {
        return false;
    }
    let in_research_dir = path
        .components()
        .any(|c| c.as_os_str().eq_ignore_ascii_case("research"));
    let research_file_name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .is_some_and(|stem| stem.to_ascii_lowercase().contains("research"));
    in_research_dir || research_file_name
}

pub static CYCLE4_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new(
            "unsourced-numeric",
            4,
            r"\b\d+(?:\.\d+)?\s*%|\b\d{1,3}(?:,\d{3})+(?:\.\d+)?\b|\b\d+(?:\.\d+)?\s*(?:million|billion|trillion)\b",
            Applicability::FileWrite,
            Severity::Warn,
            "research.unsourced-numeric",
            "numeric claim without a nearby source",
            "Cite the source of the figure: a link or a [Source: …] tag within the paragraph.",
        )
        .skip_if(has_nearby_source),
        Rule::new(
            "vague-quantifier",
            4,
            r"(?i)\b(?:many|most|significant(?:ly)?|leading|countless|numerous|vast\s+majority|overwhelming)\b",
            Applicability::FileWrite,
            Severity::Info,
            "research.vague-quantifier",
            "vague quantifier in place of a figure",
            "Replace the vague quantifier with a sourced number or drop the claim.",
        ),
        Rule::new(
            "unsourced-institution",
            4,
            r"\b(?:[A-Z][A-Za-z]+\s+)?(?:University|Institute|Laboratory|Foundation|Association|Agency|Administration)\b|\b(?:MIT|NASA|WHO|CDC|OECD|IMF|UNESCO)\b",
            Applicability::FileWrite,
            Severity::Warn,
            "research.unsourced-institution",
            "institution named without a source",
            "Link the institution's publication or add a [Source: …] tag.",
        )
        .skip_if(has_nearby_source),
        Rule::new(
            "uncited-year",
            4,
            r"\b(?:19|20)\d{2}\b",
            Applicability::FileWrite,
            Severity::Info,
            "research.uncited-year",
            "year reference without a citation",
            "Cite where the dated claim comes from.",
        )
        .skip_if(has_nearby_source),
        Rule::new(
            "uncited-currency",
            4,
            r"[$€£¥]\s*\d[\d,]*(?:\.\d+)?(?:\s*(?:million|billion|trillion|[MBK]))?",
            Applicability::FileWrite,
            Severity::Warn,
            "research.uncited-currency",
            "currency amount without a citation",
            "Cite the source of the amount.",
        )
        .skip_if(has_nearby_source),
    ]
});

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: &str) -> &'static Rule {
        CYCLE4_RULES
            .iter()
            .find(|r| r.id == id)
            .unwrap_or_else(|| panic!("rule {id} missing"))
    }

    #[test]
    fn test_namespace_and_cycle() {
        for rule in CYCLE4_RULES.iter() {
            assert_eq!(rule.cycle, 4);
            assert!(rule.code.starts_with("research."), "bad namespace: {}", rule.code);
        }
    }

    #[test]
    fn test_research_path_heuristic() {
        assert!(is_research_path(Path::new("docs/research/llm-costs.md")));
        assert!(is_research_path(Path::new("notes/market-research.md")));
        assert!(is_research_path(Path::new("Research/summary.markdown")));
        assert!(!is_research_path(Path::new("docs/research/data.csv")));
        assert!(!is_research_path(Path::new("README.md")));
        assert!(!is_research_path(Path::new("src/research.py")));
    }

    #[test]
    fn test_numeric_claim_patterns() {
        let re = &rule("unsourced-numeric").pattern;
        assert!(re.is_match("adoption grew 45% in a year"));
        assert!(re.is_match("the dataset has 1,200,000 rows"));
        assert!(re.is_match("about 3 billion devices"));
        assert!(!re.is_match("see figure two"));
    }

    #[test]
    fn test_nearby_source_suppresses() {
        let sourced = "Adoption grew 45% last year ([report](https://example.com/r)).";
        let m = rule("unsourced-numeric").pattern.find(sourced).expect("match");
        assert!(has_nearby_source(sourced, m.range()));

        let tagged = "Adoption grew 45% last year. [Source: ACM survey 2024]";
        let m = rule("unsourced-numeric").pattern.find(tagged).expect("match");
        assert!(has_nearby_source(tagged, m.range()));

        let bare = "Adoption grew 45% last year according to our gut feeling.";
        let m = rule("unsourced-numeric").pattern.find(bare).expect("match");
        assert!(!has_nearby_source(bare, m.range()));
    }

    #[test]
    fn test_source_outside_window_does_not_count() {
        let filler = "x".repeat(SOURCE_WINDOW + 50);
        let content = format!("Growth hit 45% this year. {filler} https://example.com/far-away");
        let m = rule("unsourced-numeric").pattern.find(&content).expect("match");
        assert!(!has_nearby_source(&content, m.range()));
    }

    #[test]
    fn test_vague_quantifiers() {
        let re = &rule("vague-quantifier").pattern;
        assert!(re.is_match("Many companies report savings"));
        assert!(re.is_match("the leading provider"));
        assert!(re.is_match("a significant improvement"));
        assert!(!re.is_match("forty companies report savings"));
    }

    #[test]
    fn test_institution_names() {
        let re = &rule("unsourced-institution").pattern;
        assert!(re.is_match("a Stanford University study"));
        assert!(re.is_match("according to NASA"));
        assert!(re.is_match("the World Health Organization and WHO"));
        assert!(!re.is_match("our in-house team measured it"));
    }

    #[test]
    fn test_year_and_currency() {
        assert!(rule("uncited-year").pattern.is_match("as of 2024, the market"));
        assert!(!rule("uncited-year").pattern.is_match("room 12345 was busy"));
        let currency = &rule("uncited-currency").pattern;
        assert!(currency.is_match("raised $4.5 million"));
        assert!(currency.is_match("spent €300"));
        assert!(!currency.is_match("the price varies"));
    }

    #[test]
    fn test_window_clamps_to_char_boundaries() {
        // Multibyte padding around the claim must not panic the window slice.
        let pad = "é".repeat(SOURCE_WINDOW);
        let content = format!("{pad} 45% {pad}");
        let m = rule("unsourced-numeric").pattern.find(&content).expect("match");
        let _ = has_nearby_source(&content, m.range());
    }
}
