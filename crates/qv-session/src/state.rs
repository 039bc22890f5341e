//! Session state schema and its size bounds.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Bounded sizes, enforced on every save.
pub const HISTORY_CAP: usize = 50;
pub const EDIT_SNAPSHOT_CAP: usize = 10;
pub const SNAPSHOT_CHAR_CAP: usize = 500;
pub const RETRY_CAP: usize = 20;
pub const CORRECTION_HISTORY_CAP: usize = 10;

/// One recorded tool call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorEntry {
    pub tool: String,
    pub timestamp_ms: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Path whose permissions a chmod/chown in this entry changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perm_changed_path: Option<String>,
}

/// Per-rule adaptive counters. Session-scoped only; never persisted across
/// sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleEffectiveness {
    pub fixed: u32,
    pub ignored: u32,
    pub total: u32,
}

/// One blocked attempt against a file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrectionAttempt {
    pub ts: i64,
    /// Rule ids that fired in this attempt.
    pub violations: Vec<String>,
}

/// Correction tracking for one file path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrectionState {
    pub attempts: u32,
    #[serde(default)]
    pub history: VecDeque<CorrectionAttempt>,
}

/// Token usage attributed to one injection source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceUsage {
    pub tokens: u32,
    pub count: u32,
}

/// Session-wide verification token accounting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetState {
    pub total_tokens: u32,
    #[serde(default)]
    pub sources: BTreeMap<String, SourceUsage>,
}

/// Everything one session accumulates across hook invocations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionState {
    pub history: VecDeque<BehaviorEntry>,
    pub files_read: BTreeSet<String>,
    pub files_written: BTreeSet<String>,
    pub edit_history: BTreeMap<String, VecDeque<String>>,
    pub retry_history: VecDeque<String>,
    pub effectiveness: BTreeMap<String, RuleEffectiveness>,
    pub correction: BTreeMap<String, CorrectionState>,
    pub budget: BudgetState,
}

impl SessionState {
    /// Truncate every bounded collection to its cap, dropping the oldest
    /// entries. Called before each save so a corrupted or oversized file
    /// can never grow the in-memory state past its bounds.
    pub fn enforce_bounds(&mut self) {
        while self.history.len() > HISTORY_CAP {
            self.history.pop_front();
        }
        while self.retry_history.len() > RETRY_CAP {
            self.retry_history.pop_front();
        }
        for snapshots in self.edit_history.values_mut() {
            while snapshots.len() > EDIT_SNAPSHOT_CAP {
                snapshots.pop_front();
            }
            for snapshot in snapshots.iter_mut() {
                if snapshot.chars().count() > SNAPSHOT_CHAR_CAP {
                    *snapshot = snapshot.chars().take(SNAPSHOT_CHAR_CAP).collect();
                }
            }
        }
        for correction in self.correction.values_mut() {
            while correction.history.len() > CORRECTION_HISTORY_CAP {
                correction.history.pop_front();
            }
        }
    }

    /// Record one edit snapshot for a file, truncated to the snapshot cap.
    pub fn push_edit_snapshot(&mut self, path: &str, content: &str) {
        let snapshot: String = content.chars().take(SNAPSHOT_CHAR_CAP).collect();
        let snapshots = self.edit_history.entry(path.to_string()).or_default();
        snapshots.push_back(snapshot);
        while snapshots.len() > EDIT_SNAPSHOT_CAP {
            snapshots.pop_front();
        }
    }
}
