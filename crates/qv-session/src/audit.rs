//! Append-only JSONL audit trail.
//!
//! One file per session under the project's audit directory. Each write is
//! a single complete JSON object terminated by `\n`, appended with one
//! write call so concurrent hook processes interleave at line granularity.
//! IO failures are reported once to stderr and swallowed; auditing must
//! never take the verifier down.

use chrono::Utc;
use qv_core::{STDERR_PREFIX, Violation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// One audit line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// RFC 3339 UTC.
    pub timestamp: String,
    pub session_id: String,
    /// `preTool`, `postTool`, or `stop`.
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    /// `approve`, `block`, or `logOnly`.
    pub decision: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<Violation>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl AuditEntry {
    pub fn new(session_id: &str, event: &str, tool: Option<&str>, decision: &str) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            session_id: session_id.to_string(),
            event: event.to_string(),
            tool: tool.map(str::to_string),
            decision: decision.to_string(),
            violations: Vec::new(),
            metadata: Map::new(),
        }
    }

    pub fn with_violations(mut self, violations: &[Violation]) -> Self {
        self.violations = violations.to_vec();
        self
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}

/// Appender for one session's audit file.
pub struct AuditWriter {
    path: PathBuf,
}

impl AuditWriter {
    pub fn for_session(audit_dir: &Path, session_id: &str) -> Self {
        Self {
            path: audit_dir.join(format!("{session_id}.jsonl")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry. Failures warn to stderr and are otherwise
    /// swallowed.
    pub fn append(&self, entry: &AuditEntry) {
        if let Err(err) = self.try_append(entry) {
            eprintln!(
                "{STDERR_PREFIX} audit write to {} failed: {err}",
                self.path.display()
            );
        }
    }

    fn try_append(&self, entry: &AuditEntry) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut line = serde_json::to_string(entry).map_err(std::io::Error::other)?;
        line.push('\n');
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        // One buffer, one write call: lines stay intact under contention.
        file.write_all(line.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qv_core::Severity;

    fn sample_violation() -> Violation {
        Violation {
            rule_id: "no-eval".into(),
            cycle: 2,
            priority: 200,
            severity: Severity::Critical,
            code: "security.eval".into(),
            remediation: "do not".into(),
            message: "eval() found".into(),
            condensed: false,
        }
    }

    fn read_lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .expect("read audit file")
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_one_line_per_append_all_valid_json() {
        let temp = tempfile::tempdir().expect("tempdir");
        let writer = AuditWriter::for_session(temp.path(), "s1");

        for i in 0..5 {
            let entry = AuditEntry::new("s1", "preTool", Some("Bash"), "approve")
                .with_metadata("round", Value::from(i));
            writer.append(&entry);
        }

        let lines = read_lines(writer.path());
        assert_eq!(lines.len(), 5);
        for line in &lines {
            let parsed: AuditEntry = serde_json::from_str(line).expect("valid JSON line");
            assert_eq!(parsed.session_id, "s1");
        }
    }

    #[test]
    fn test_earlier_lines_are_never_rewritten() {
        let temp = tempfile::tempdir().expect("tempdir");
        let writer = AuditWriter::for_session(temp.path(), "s2");

        writer.append(&AuditEntry::new("s2", "preTool", Some("Write"), "block"));
        let first = read_lines(writer.path())[0].clone();

        writer.append(&AuditEntry::new("s2", "postTool", Some("Write"), "logOnly"));
        let lines = read_lines(writer.path());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], first);
    }

    #[test]
    fn test_entry_carries_violations_and_metadata() {
        let temp = tempfile::tempdir().expect("tempdir");
        let writer = AuditWriter::for_session(temp.path(), "s3");

        let entry = AuditEntry::new("s3", "preTool", Some("Write"), "block")
            .with_violations(&[sample_violation()])
            .with_metadata("filePath", Value::from("src/a.py"));
        writer.append(&entry);

        let lines = read_lines(writer.path());
        let parsed: AuditEntry = serde_json::from_str(&lines[0]).expect("valid line");
        assert_eq!(parsed.decision, "block");
        assert_eq!(parsed.violations.len(), 1);
        assert_eq!(parsed.violations[0].rule_id, "no-eval");
        assert_eq!(parsed.metadata["filePath"], "src/a.py");
    }

    #[test]
    fn test_timestamp_is_rfc3339() {
        let entry = AuditEntry::new("s", "stop", None, "logOnly");
        chrono::DateTime::parse_from_rfc3339(&entry.timestamp).expect("RFC 3339 timestamp");
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        // Point the writer at a path whose parent is a file; append must not
        // panic or return an error to the caller.
        let temp = tempfile::tempdir().expect("tempdir");
        let blocker = temp.path().join("not-a-dir");
        fs::write(&blocker, "x").expect("write blocker");
        let writer = AuditWriter::for_session(&blocker, "s4");
        writer.append(&AuditEntry::new("s4", "preTool", None, "approve"));
    }

    #[test]
    fn test_session_id_names_the_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let writer = AuditWriter::for_session(temp.path(), "abc123");
        assert_eq!(
            writer.path().file_name().and_then(|n| n.to_str()),
            Some("abc123.jsonl")
        );
    }
}
