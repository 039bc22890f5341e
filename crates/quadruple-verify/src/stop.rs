//! The stop pipeline: compose the self-review prompt, scan recently
//! written research artifacts, and optionally consult the second-opinion
//! verifier.

use crate::{HookContext, compose};
use anyhow::Result;
use qv_core::{Decision, Violation};
use qv_engine::{evaluate_research, is_research_path};
use qv_inference::verify_response_blocking;
use qv_session::budget::SOURCE_STOP_PROMPT;
use qv_session::{AuditEntry, AuditWriter, StateStore, budget};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};

pub fn run(ctx: &HookContext) -> Result<Decision> {
    let store = StateStore::for_session(&ctx.audit_dir, &ctx.session_id);
    let state = store.load();

    let mut prompt = compose::review_prompt();

    let research_findings = if ctx.config.cycle4.enabled {
        scan_research_files(&ctx.project_root, state.files_written.iter(), ctx)
    } else {
        Vec::new()
    };
    if !research_findings.is_empty() {
        prompt.push_str(&compose::research_appendix(&research_findings));
    }

    let verdict = if ctx.config.cycle5.enabled {
        let request = ctx.event.prompt.as_deref().unwrap_or_default();
        let response = ctx.event.response.as_deref().unwrap_or_default();
        Some(verify_response_blocking(&ctx.config.cycle5, request, response))
    } else {
        None
    };
    if let Some(verdict) = &verdict {
        if !verdict.pass {
            prompt.push_str(&compose::second_opinion_note(&verdict.reasoning));
        }
    }

    store.update(|state| budget::record(&mut state.budget, SOURCE_STOP_PROMPT, &prompt));

    let mut entry = AuditEntry::new(&ctx.session_id, "stop", None, "logOnly")
        .with_metadata("promptInjected", Value::from(true));
    if !research_findings.is_empty() {
        let total: usize = research_findings.iter().map(|(_, v)| v.len()).sum();
        entry = entry.with_metadata("researchFindings", Value::from(total));
    }
    if let Some(verdict) = &verdict {
        entry = entry.with_metadata(
            "cycle5",
            json!({"pass": verdict.pass, "skipped": verdict.skipped, "reasoning": verdict.reasoning}),
        );
    }
    AuditWriter::for_session(&ctx.audit_dir, &ctx.session_id).append(&entry);

    Ok(Decision::Prompt { prompt })
}

/// Re-scan research artifacts written this session. Unreadable files are
/// skipped; this pass is advisory.
fn scan_research_files<'a>(
    project_root: &Path,
    written: impl Iterator<Item = &'a String>,
    ctx: &HookContext,
) -> Vec<(String, Vec<Violation>)> {
    written
        .filter(|path| is_research_path(Path::new(path.as_str())))
        .filter_map(|path| {
            let on_disk = resolve_path(project_root, path);
            let content = fs::read_to_string(&on_disk).ok()?;
            let violations = evaluate_research(&content, &ctx.config);
            (!violations.is_empty()).then(|| (path.clone(), violations))
        })
        .collect()
}

fn resolve_path(project_root: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_root.join(path)
    }
}

#[cfg(test)]
#[path = "stop_tests.rs"]
mod tests;
