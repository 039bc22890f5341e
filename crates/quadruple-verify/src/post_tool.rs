//! The post-tool pipeline: observational only.
//!
//! Records the call into session state, runs the behavioral detectors,
//! boundary-checks external content, scans shell commands for sensitive
//! paths, and writes the audit line. Emits nothing on stdout.

use crate::HookContext;
use anyhow::Result;
use chrono::Utc;
use qv_boundary::{detect_injection_patterns, process_snapshot, scan_sensitive_paths, wrap_external_content};
use qv_core::{Decision, STDERR_PREFIX};
use qv_engine::is_mcp_tool;
use qv_session::{AuditEntry, AuditWriter, StateStore, record_and_detect};
use serde_json::{Value, json};

/// How much external content the audit line preserves.
const EXTERNAL_EXCERPT_CHARS: usize = 500;

pub fn run(ctx: &HookContext) -> Result<Decision> {
    let Some(tool_name) = ctx.event.tool_name.as_deref() else {
        return Ok(Decision::Silent);
    };

    let store = StateStore::for_session(&ctx.audit_dir, &ctx.session_id);
    let now_ms = Utc::now().timestamp_millis();
    let warnings =
        store.update(|state| record_and_detect(state, tool_name, &ctx.event.tool_input, now_ms));

    for warning in &warnings {
        eprintln!(
            "{STDERR_PREFIX} behavior warning [{}]: {}",
            warning.id, warning.description
        );
    }

    let mut entry = AuditEntry::new(&ctx.session_id, "postTool", Some(tool_name), "logOnly");
    if !warnings.is_empty() {
        let listed: Vec<Value> = warnings
            .iter()
            .map(|w| json!({"id": w.id, "description": w.description}))
            .collect();
        entry = entry.with_metadata("behaviorWarnings", Value::from(listed));
    }

    // External content (web and MCP results) is untrusted: fold, scan for
    // injection phrases, and keep a boundary-wrapped excerpt in the audit.
    if is_external_content_tool(tool_name) {
        if let Some(content) = external_content_text(ctx.event.tool_response.as_ref()) {
            let findings = detect_injection_patterns(&content);
            if !findings.is_empty() {
                let listed: Vec<Value> = findings
                    .iter()
                    .map(|f| json!({"id": f.id, "description": f.description}))
                    .collect();
                for finding in &findings {
                    eprintln!(
                        "{STDERR_PREFIX} prompt-injection pattern [{}] in {tool_name} result",
                        finding.id
                    );
                }
                entry = entry.with_metadata("injectionFindings", Value::from(listed));
            }
            let excerpt: String = content.chars().take(EXTERNAL_EXCERPT_CHARS).collect();
            entry = entry.with_metadata(
                "externalContent",
                Value::from(wrap_external_content(&excerpt)),
            );
        }
    }

    if tool_name == "Bash" {
        if let Some(command) = ctx.event.tool_input.get("command").and_then(Value::as_str) {
            let matches = scan_sensitive_paths(command);
            if !matches.is_empty() {
                let ids: Vec<&str> = matches.iter().map(|m| m.id).collect();
                eprintln!(
                    "{STDERR_PREFIX} sensitive path access [{}] in command",
                    ids.join(", ")
                );
                entry = entry.with_metadata("sensitiveAccess", Value::from(ids.clone()));
                entry = entry.with_metadata("processSnapshot", process_snapshot());
            }
        }
    }

    AuditWriter::for_session(&ctx.audit_dir, &ctx.session_id).append(&entry);
    Ok(Decision::Silent)
}

fn is_external_content_tool(tool_name: &str) -> bool {
    matches!(tool_name, "WebFetch" | "WebSearch") || is_mcp_tool(tool_name)
}

/// Pull scannable text out of a tool response: a bare string, a `content`
/// string field, or the concatenation of top-level string values.
fn external_content_text(response: Option<&Value>) -> Option<String> {
    let response = response?;
    if let Some(text) = response.as_str() {
        return Some(text.to_string());
    }
    if let Some(text) = response.get("content").and_then(Value::as_str) {
        return Some(text.to_string());
    }
    let object = response.as_object()?;
    let parts: Vec<&str> = object.values().filter_map(Value::as_str).collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}

#[cfg(test)]
#[path = "post_tool_tests.rs"]
mod tests;
