//! File-backed state store with atomic replace.

use crate::state::SessionState;
use anyhow::{Context, Result};
use qv_core::{STDERR_PREFIX, VerifyError};
use std::fs;
use std::path::{Path, PathBuf};

/// Handle on one session's state file
/// (`<auditDir>/<sessionId>.behavior.json`).
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn for_session(audit_dir: &Path, session_id: &str) -> Self {
        Self {
            path: audit_dir.join(format!("{session_id}.behavior.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the current state. A missing, unreadable, or corrupt file is an
    /// empty state; a stale view beats refusing to run.
    pub fn load(&self) -> SessionState {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return SessionState::default();
            }
            Err(err) => {
                eprintln!(
                    "{STDERR_PREFIX} could not read session state {}: {err}",
                    self.path.display()
                );
                return SessionState::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(state) => state,
            Err(err) => {
                eprintln!(
                    "{STDERR_PREFIX} session state {} is corrupt, starting empty: {err}",
                    self.path.display()
                );
                SessionState::default()
            }
        }
    }

    /// Write the state back: bounds enforced, serialized to a sibling temp
    /// file, atomically renamed over the target. Readers always observe a
    /// complete document.
    pub fn save(&self, state: &mut SessionState) -> Result<()> {
        state.enforce_bounds();

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create state directory {}", parent.display()))?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        let serialized =
            serde_json::to_string(state).context("failed to serialize session state")?;
        fs::write(&tmp_path, serialized)
            .with_context(|| format!("failed to write temp state file {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path).with_context(|| {
            format!(
                "failed to atomically replace state file {}",
                self.path.display()
            )
        })?;
        tracing::debug!(path = %self.path.display(), "session state saved");
        Ok(())
    }

    /// Read-modify-write. IO failures degrade to in-memory-only with a
    /// warning; the closure's result is returned either way.
    pub fn update<T>(&self, mutate: impl FnOnce(&mut SessionState) -> T) -> T {
        let mut state = self.load();
        let result = mutate(&mut state);
        if let Err(err) = self.save(&mut state) {
            let err = VerifyError::StateIo {
                path: self.path.clone(),
                detail: format!("{err:#}"),
            };
            eprintln!("{STDERR_PREFIX} {err}");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{BehaviorEntry, HISTORY_CAP};

    fn store_in(dir: &Path) -> StateStore {
        StateStore::for_session(dir, "test-session")
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let temp = tempfile::tempdir().expect("tempdir");
        let state = store_in(temp.path()).load();
        assert_eq!(state, SessionState::default());
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = store_in(temp.path());

        let mut state = SessionState::default();
        state.files_written.insert("src/a.py".to_string());
        state.budget.total_tokens = 77;
        store.save(&mut state).expect("save");

        let loaded = store.load();
        assert_eq!(loaded, state);
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = store_in(temp.path());
        fs::write(store.path(), "{ not json").expect("write corrupt");
        assert_eq!(store.load(), SessionState::default());
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let temp = tempfile::tempdir().expect("tempdir");
        let nested = temp.path().join("a").join("b");
        let store = store_in(&nested);
        store.save(&mut SessionState::default()).expect("save");
        assert!(store.path().exists());
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = store_in(temp.path());
        store.save(&mut SessionState::default()).expect("save");
        let entries: Vec<_> = fs::read_dir(temp.path())
            .expect("read dir")
            .map(|e| e.expect("entry").file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("test-session.behavior.json")]);
    }

    #[test]
    fn test_update_applies_and_persists() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = store_in(temp.path());
        store.update(|state| {
            state.files_read.insert("README.md".to_string());
        });
        assert!(store.load().files_read.contains("README.md"));
    }

    #[test]
    fn test_save_enforces_bounds() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = store_in(temp.path());
        let mut state = SessionState::default();
        for i in 0..200 {
            state.history.push_back(BehaviorEntry {
                tool: "Bash".to_string(),
                timestamp_ms: i,
                ..BehaviorEntry::default()
            });
        }
        store.save(&mut state).expect("save");
        assert_eq!(store.load().history.len(), HISTORY_CAP);
    }

    #[test]
    fn test_state_file_is_always_valid_json_after_save() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = store_in(temp.path());
        for round in 0..5 {
            store.update(|state| {
                state.retry_history.push_back(format!("cmd {round}"));
            });
            let raw = fs::read_to_string(store.path()).expect("read state");
            serde_json::from_str::<SessionState>(&raw).expect("valid document");
        }
    }
}
