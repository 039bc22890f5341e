//! The pre-tool pipeline: gate → extract → route → rules → decision.
//!
//! This is the only hook that may block. The decision state machine, in
//! order: trust-level short-circuit, capability gate, lean-mode
//! short-circuit, content extraction, model routing, rule evaluation
//! (Cycle 4 for research artifacts, Cycles 1+2 otherwise), then budget
//! squeeze, correction hints, and escalation on the blocking path.

use crate::HookContext;
use anyhow::Result;
use chrono::Utc;
use qv_config::TrustLevel;
use qv_core::{Decision, Severity, VerifyError, Violation};
use qv_engine::{
    EvalInput, GateOutcome, ToolContext, check_capabilities, decide_blocks, evaluate_code,
    evaluate_research, extract, is_research_path, route,
};
use qv_session::budget::{SOURCE_BLOCK_MESSAGE, SOURCE_CORRECTION_HINT};
use qv_session::{AuditEntry, AuditWriter, StateStore, budget, correction};
use serde_json::Value;

pub fn run(ctx: &HookContext) -> Result<Decision> {
    let audit = AuditWriter::for_session(&ctx.audit_dir, &ctx.session_id);
    let Some(tool_name) = ctx.event.tool_name.as_deref() else {
        // A pre-tool event without a tool carries nothing to verify.
        return Ok(Decision::Approve);
    };

    if ctx.config.trust_level == TrustLevel::Minimal {
        audit.append(
            &AuditEntry::new(&ctx.session_id, "preTool", Some(tool_name), "approve")
                .with_metadata("trustLevel", Value::from("minimal")),
        );
        return Ok(Decision::Approve);
    }

    if let GateOutcome::Denied { missing } =
        check_capabilities(tool_name, &ctx.config.capabilities)
    {
        let violation = capability_violation(&missing);
        let reason = VerifyError::CapabilityDenied {
            tool: tool_name.to_string(),
            missing: missing.join(", "),
        }
        .to_string();
        audit.append(
            &AuditEntry::new(&ctx.session_id, "preTool", Some(tool_name), "block")
                .with_violations(std::slice::from_ref(&violation)),
        );
        return Ok(Decision::Block { reason });
    }

    if ctx.config.lean_mode {
        audit.append(
            &AuditEntry::new(&ctx.session_id, "preTool", Some(tool_name), "approve")
                .with_metadata("leanMode", Value::from(true)),
        );
        return Ok(Decision::Approve);
    }

    let Some(extracted) = extract(tool_name, &ctx.event.tool_input) else {
        audit.append(&AuditEntry::new(
            &ctx.session_id,
            "preTool",
            Some(tool_name),
            "approve",
        ));
        return Ok(Decision::Approve);
    };

    // Oversized MCP input is not scanned: record the skip and pass through
    // rather than pretend the content was verified.
    if extracted.tool_context == ToolContext::Mcp
        && extracted.content.len() > ctx.config.mcp.max_input_size_bytes
    {
        eprintln!(
            "{} mcp input of {} bytes exceeds maxInputSizeBytes, skipping scan",
            qv_core::STDERR_PREFIX,
            extracted.content.len()
        );
        audit.append(
            &AuditEntry::new(&ctx.session_id, "preTool", Some(tool_name), "approve")
                .with_metadata("mcpInputTooLarge", Value::from(extracted.content.len())),
        );
        return Ok(Decision::Approve);
    }

    let route_mode = route(&extracted, &ctx.config);
    let extension = extracted.extension();

    let is_research = extracted
        .file_path
        .as_deref()
        .is_some_and(is_research_path);
    let mut violations = if is_research {
        if ctx.config.cycle4.enabled {
            evaluate_research(&extracted.content, &ctx.config)
        } else {
            Vec::new()
        }
    } else {
        evaluate_code(
            EvalInput {
                content: &extracted.content,
                extension: extension.as_deref(),
                tool_context: extracted.tool_context,
                route: route_mode,
            },
            &ctx.config,
        )
    };

    let store = StateStore::for_session(&ctx.audit_dir, &ctx.session_id);
    let file_key = extracted
        .file_path
        .as_ref()
        .map(|path| path.to_string_lossy().into_owned());

    if violations.is_empty() {
        // A clean write to a previously blocked path means the correction
        // hints landed.
        if let Some(path) = file_key.as_deref() {
            store.update(|state| correction::record_clean_write(state, path));
        }
        audit.append(&AuditEntry::new(
            &ctx.session_id,
            "preTool",
            Some(tool_name),
            "approve",
        ));
        return Ok(Decision::Approve);
    }

    if !decide_blocks(&violations, ctx.config.trust_level) {
        // Info-only findings are reported, never enforced.
        for violation in &violations {
            eprintln!(
                "{} info: [{}] {}",
                qv_core::STDERR_PREFIX,
                violation.rule_id,
                violation.message
            );
        }
        audit.append(
            &AuditEntry::new(&ctx.session_id, "preTool", Some(tool_name), "approve")
                .with_violations(&violations),
        );
        return Ok(Decision::Approve);
    }

    let now_ms = Utc::now().timestamp_millis();
    let (hints, escalation) = store.update(|state| {
        budget::record(
            &mut state.budget,
            SOURCE_BLOCK_MESSAGE,
            &format_violations(&violations),
        );
        budget::condense_if_over_budget(
            &state.budget,
            ctx.config.max_verification_tokens,
            &mut violations,
        );

        let hints = correction::compose_hints(&violations);
        budget::record(&mut state.budget, SOURCE_CORRECTION_HINT, &hints);

        let escalation = file_key.as_deref().and_then(|path| {
            correction::record_block(state, path, &violations, now_ms);
            correction::escalation_block(state, path)
        });
        (hints, escalation)
    });

    let reason = build_reason(tool_name, file_key.as_deref(), &violations, &hints, &escalation);
    let mut entry = AuditEntry::new(&ctx.session_id, "preTool", Some(tool_name), "block")
        .with_violations(&violations);
    if let Some(path) = file_key.as_deref() {
        entry = entry.with_metadata("filePath", Value::from(path));
    }
    if escalation.is_some() {
        entry = entry.with_metadata("escalated", Value::from(true));
    }
    audit.append(&entry);

    Ok(Decision::Block { reason })
}

/// Synthetic violation emitted for a capability denial.
fn capability_violation(missing: &[String]) -> Violation {
    Violation {
        rule_id: "capability-denied".to_string(),
        cycle: 2,
        priority: 200,
        severity: Severity::Critical,
        code: "security.capability-denied".to_string(),
        remediation: "Enable the capability in quadruple-verify-config.json or use another tool."
            .to_string(),
        message: format!("missing capabilities: {}", missing.join(", ")),
        condensed: false,
    }
}

fn format_violations(violations: &[Violation]) -> String {
    let lines: Vec<String> = violations
        .iter()
        .enumerate()
        .map(|(i, v)| {
            format!(
                "{}. [{}] ({}, {}) {}",
                i + 1,
                v.rule_id,
                v.code,
                v.severity,
                v.message
            )
        })
        .collect();
    lines.join("\n")
}

/// Assemble the block reason from its parts.
fn build_reason(
    tool_name: &str,
    file_path: Option<&str>,
    violations: &[Violation],
    hints: &str,
    escalation: &Option<String>,
) -> String {
    let target = match file_path {
        Some(path) => format!("{tool_name} on {path}"),
        None => tool_name.to_string(),
    };
    let mut parts = vec![
        format!("Verification blocked {target}:"),
        format_violations(violations),
        "Remediation:".to_string(),
        hints.to_string(),
    ];
    if let Some(escalation) = escalation {
        parts.push(escalation.clone());
    }
    parts.join("\n")
}

#[cfg(test)]
#[path = "pre_tool_tests.rs"]
mod tests;
