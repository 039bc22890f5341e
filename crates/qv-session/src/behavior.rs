//! Behavioral sequence detection.
//!
//! The tracker records every post-tool event into the session state and
//! looks for cross-call patterns a single-invocation rule cannot see.
//! Detections warn, to stderr and into the audit metadata, and never
//! block.

use crate::state::{BehaviorEntry, SessionState};
use qv_boundary::is_sensitive_path_access;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::LazyLock;

const RAPID_DESTRUCTIVE_WINDOW_MS: i64 = 30_000;
const RAPID_DESTRUCTIVE_MIN: usize = 3;
const EXFIL_WINDOW_MS: i64 = 60_000;
const PERM_ESCALATION_WINDOW_MS: i64 = 60_000;
const REVERT_SIMILARITY: f64 = 0.8;
const REVERT_MIN_SIMILAR: usize = 3;
const REVERT_LOOKBACK: usize = 5;
const BRUTE_FORCE_MIN: usize = 4;

static DESTRUCTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\brm\s+-[a-zA-Z]*[rf]|\bdd\s+if=|\bmkfs\b|\bshred\b|\btruncate\s+-s\s*0\b|\bgit\s+reset\s+--hard\b|\bgit\s+clean\s+-[a-zA-Z]*f",
    )
    .expect("valid regex")
});

static OUTBOUND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:curl|wget|nc|ncat|scp|rsync|ssh)\b").expect("valid regex"));

static PERM_CHANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:chmod|chown)\s+(?:-[a-zA-Z]+\s+)*\S+\s+(\S+)").expect("valid regex")
});

static EXEC_TARGET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[;&|]\s*)(?:\./(\S+)|(?:bash|sh|zsh|python3?|node)\s+(\S+))")
        .expect("valid regex")
});

/// A detected behavioral pattern. Warn-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BehaviorWarning {
    pub id: &'static str,
    pub description: String,
}

impl BehaviorWarning {
    fn new(id: &'static str, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
        }
    }
}

fn string_field(input: &Value, key: &str) -> Option<String> {
    input.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Build the history entry for one post-tool event.
fn build_entry(tool_name: &str, tool_input: &Value, now_ms: i64) -> BehaviorEntry {
    let mut entry = BehaviorEntry {
        tool: tool_name.to_string(),
        timestamp_ms: now_ms,
        ..BehaviorEntry::default()
    };
    match tool_name {
        "Write" | "Edit" | "Read" => entry.file_path = string_field(tool_input, "file_path"),
        "Bash" => {
            entry.command = string_field(tool_input, "command");
            if let Some(command) = entry.command.as_deref() {
                entry.perm_changed_path = PERM_CHANGE_RE
                    .captures(command)
                    .and_then(|caps| caps.get(1))
                    .map(|m| m.as_str().to_string());
            }
        }
        "WebFetch" | "WebSearch" => {
            entry.url = string_field(tool_input, "url").or_else(|| string_field(tool_input, "query"));
        }
        _ => {}
    }
    entry
}

/// Record a post-tool event into the state and run every detector.
pub fn record_and_detect(
    state: &mut SessionState,
    tool_name: &str,
    tool_input: &Value,
    now_ms: i64,
) -> Vec<BehaviorWarning> {
    let entry = build_entry(tool_name, tool_input, now_ms);
    let mut warnings = Vec::new();

    // Write-without-read fires before the bookkeeping below records the
    // edit, so the check sees the session as it was when the edit landed.
    if tool_name == "Edit" {
        if let Some(path) = entry.file_path.as_deref() {
            if !state.files_read.contains(path) {
                warnings.push(BehaviorWarning::new(
                    "write-without-read",
                    format!("edited {path} without reading it first in this session"),
                ));
            }
        }
    }

    match tool_name {
        "Read" => {
            if let Some(path) = entry.file_path.clone() {
                state.files_read.insert(path);
            }
        }
        "Write" | "Edit" => {
            if let Some(path) = entry.file_path.clone() {
                state.files_written.insert(path.clone());
                let content_key = if tool_name == "Write" { "content" } else { "new_string" };
                if let Some(content) = string_field(tool_input, content_key) {
                    state.push_edit_snapshot(&path, &content);
                }
            }
        }
        "Bash" => {
            if let Some(command) = entry.command.clone() {
                state.retry_history.push_back(command);
            }
        }
        _ => {}
    }

    state.history.push_back(entry.clone());

    if let Some(warning) = detect_rapid_destructive(state, now_ms) {
        warnings.push(warning);
    }
    if let Some(warning) = detect_exfiltration(state, &entry, now_ms) {
        warnings.push(warning);
    }
    if let Some(warning) = detect_permission_escalation(state, &entry, now_ms) {
        warnings.push(warning);
    }
    if let Some(warning) = detect_edit_revert_loop(state, &entry) {
        warnings.push(warning);
    }
    if let Some(warning) = detect_brute_force_retry(state, tool_name) {
        warnings.push(warning);
    }

    warnings
}

fn is_destructive(entry: &BehaviorEntry) -> bool {
    entry
        .command
        .as_deref()
        .is_some_and(|command| DESTRUCTIVE_RE.is_match(command))
}

fn detect_rapid_destructive(state: &SessionState, now_ms: i64) -> Option<BehaviorWarning> {
    let cutoff = now_ms - RAPID_DESTRUCTIVE_WINDOW_MS;
    let recent = state
        .history
        .iter()
        .filter(|entry| entry.timestamp_ms >= cutoff && is_destructive(entry))
        .count();
    (recent >= RAPID_DESTRUCTIVE_MIN).then(|| {
        BehaviorWarning::new(
            "rapid-destructive",
            format!("{recent} destructive commands inside {}s", RAPID_DESTRUCTIVE_WINDOW_MS / 1000),
        )
    })
}

fn is_outbound(entry: &BehaviorEntry) -> bool {
    if matches!(entry.tool.as_str(), "WebFetch" | "WebSearch") {
        return true;
    }
    entry
        .command
        .as_deref()
        .is_some_and(|command| OUTBOUND_RE.is_match(command))
}

fn touches_sensitive_path(entry: &BehaviorEntry) -> bool {
    entry
        .file_path
        .as_deref()
        .is_some_and(is_sensitive_path_access)
        || entry
            .command
            .as_deref()
            .is_some_and(is_sensitive_path_access)
}

fn detect_exfiltration(
    state: &SessionState,
    entry: &BehaviorEntry,
    now_ms: i64,
) -> Option<BehaviorWarning> {
    if !is_outbound(entry) {
        return None;
    }
    let cutoff = now_ms - EXFIL_WINDOW_MS;
    let sensitive_read = state
        .history
        .iter()
        .any(|prior| prior.timestamp_ms >= cutoff && touches_sensitive_path(prior));
    sensitive_read.then(|| {
        BehaviorWarning::new(
            "exfiltration-sequence",
            format!(
                "outbound network use within {}s of a sensitive-file access",
                EXFIL_WINDOW_MS / 1000
            ),
        )
    })
}

/// Normalize an execution target for comparison with a chmod target.
fn normalize_target(path: &str) -> &str {
    path.strip_prefix("./").unwrap_or(path)
}

fn detect_permission_escalation(
    state: &SessionState,
    entry: &BehaviorEntry,
    now_ms: i64,
) -> Option<BehaviorWarning> {
    let command = entry.command.as_deref()?;
    let caps = EXEC_TARGET_RE.captures(command)?;
    let target = caps.get(1).or_else(|| caps.get(2))?.as_str();
    let target = normalize_target(target);

    let cutoff = now_ms - PERM_ESCALATION_WINDOW_MS;
    let recently_changed = state.history.iter().any(|prior| {
        prior.timestamp_ms >= cutoff
            && prior
                .perm_changed_path
                .as_deref()
                .is_some_and(|changed| normalize_target(changed) == target)
    });
    recently_changed.then(|| {
        BehaviorWarning::new(
            "permission-escalation",
            format!("executed {target} shortly after changing its permissions"),
        )
    })
}

fn detect_edit_revert_loop(state: &SessionState, entry: &BehaviorEntry) -> Option<BehaviorWarning> {
    if !matches!(entry.tool.as_str(), "Write" | "Edit") {
        return None;
    }
    let path = entry.file_path.as_deref()?;
    let snapshots = state.edit_history.get(path)?;
    let recent: Vec<&String> = snapshots.iter().rev().take(REVERT_LOOKBACK).collect();
    if recent.len() < REVERT_MIN_SIMILAR {
        return None;
    }

    // Look for any 3 of the last 5 snapshots that are pairwise similar.
    for a in 0..recent.len() {
        for b in (a + 1)..recent.len() {
            if bigram_jaccard(recent[a], recent[b]) <= REVERT_SIMILARITY {
                continue;
            }
            for c in (b + 1)..recent.len() {
                if bigram_jaccard(recent[a], recent[c]) > REVERT_SIMILARITY
                    && bigram_jaccard(recent[b], recent[c]) > REVERT_SIMILARITY
                {
                    return Some(BehaviorWarning::new(
                        "edit-revert-loop",
                        format!("{path} rewritten to near-identical content three times"),
                    ));
                }
            }
        }
    }
    None
}

fn detect_brute_force_retry(state: &SessionState, tool_name: &str) -> Option<BehaviorWarning> {
    if tool_name != "Bash" {
        return None;
    }
    if state.retry_history.len() < BRUTE_FORCE_MIN {
        return None;
    }
    let mut tail = state.retry_history.iter().rev().take(BRUTE_FORCE_MIN);
    let last = tail.next()?;
    tail.all(|command| command == last).then(|| {
        BehaviorWarning::new(
            "brute-force-retry",
            format!("the same command ran {BRUTE_FORCE_MIN} times in a row: {last}"),
        )
    })
}

/// Jaccard similarity over character bigrams. Two empty strings are
/// identical; one empty string is entirely dissimilar to a non-empty one.
pub(crate) fn bigram_jaccard(a: &str, b: &str) -> f64 {
    let bigrams = |s: &str| -> HashSet<(char, char)> {
        let chars: Vec<char> = s.chars().collect();
        chars.windows(2).map(|w| (w[0], w[1])).collect()
    };
    let (set_a, set_b) = (bigrams(a), bigrams(b));
    if set_a.is_empty() && set_b.is_empty() {
        return 1.0;
    }
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.len() + set_b.len() - intersection;
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

#[cfg(test)]
#[path = "behavior_tests.rs"]
mod tests;
