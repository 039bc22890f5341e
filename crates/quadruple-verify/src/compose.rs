//! The Cycle-3 self-review prompt.
//!
//! The prompt frames the four-dimension self-check as rules for the check
//! itself. The failure mode it exists to prevent: a model that *describes*
//! a fix and moves on. Every rule pushes toward produced output.

use qv_core::Violation;

/// The pre-finalize self-review prompt.
pub fn review_prompt() -> String {
    [
        "Before finalizing, run a self-review across four dimensions: completeness, \
         correctness, security, quality.",
        "",
        "Rules for this check:",
        "1. Completeness: every part of the request has produced output. If you already \
           produced the code, this dimension passes; if you only described code, produce \
           the code now.",
        "2. Correctness: the code you produced does what you claimed. Re-read it; if a \
           claim and the code disagree, fix the code, not the claim.",
        "3. Security: no secrets in source, no unsafe execution, no injection sinks. If \
           you spot one, rewrite that code before finalizing.",
        "4. Quality: no placeholders, no deferred-work markers, no swallowed errors left \
           behind.",
        "",
        "Fixing means producing output, not describing output. Do not finalize with a \
         plan for what you would change; make the change.",
    ]
    .join("\n")
}

/// Appendix listing Cycle-4 findings from recently written research files.
pub fn research_appendix(findings: &[(String, Vec<Violation>)]) -> String {
    let mut lines = vec![
        String::new(),
        "Research artifacts you wrote this session have unsourced claims:".to_string(),
    ];
    for (path, violations) in findings {
        for violation in violations {
            lines.push(format!(
                "- {path}: [{}] {}",
                violation.rule_id, violation.message
            ));
        }
    }
    lines.push("Add sources for these claims before finalizing.".to_string());
    lines.join("\n")
}

/// Note appended when the second-opinion reviewer flags the response.
pub fn second_opinion_note(reasoning: &str) -> String {
    format!(
        "\nA second-opinion reviewer flagged this response: {reasoning}\nAddress the gap \
         before finalizing."
    )
}
