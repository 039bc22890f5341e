//! Hook events and decision envelopes.
//!
//! The host runtime invokes the verifier at three lifecycle points and sends
//! a single JSON object on stdin. Responses go to stdout:
//!
//! - pre-tool: `{"decision":"approve"}` or `{"decision":"block","reason":…}`
//! - post-tool: empty body
//! - stop: `{"prompt":…}`, or empty body when there is nothing to inject
//!
//! The process exits 0 in all cases; a nonzero exit is a verifier bug and
//! the host treats it as approve.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// Lifecycle points at which the host invokes a verifier process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookPoint {
    /// Before a tool call. The only hook that may block.
    PreTool,
    /// After a tool call. Observational: behavior tracking and audit.
    PostTool,
    /// Before the agent finalizes its response.
    Stop,
}

impl HookPoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookPoint::PreTool => "pre-tool",
            HookPoint::PostTool => "post-tool",
            HookPoint::Stop => "stop",
        }
    }
}

impl std::fmt::Display for HookPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single hook event as received on stdin.
///
/// Every field except `hook_point` is optional on the wire: the stop hook
/// carries no `tool_name`, and a host may omit `session_id` or `cwd`.
/// Unknown fields are ignored so that host protocol additions never break
/// parsing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookEvent {
    #[serde(default)]
    pub hook_point: Option<HookPoint>,
    #[serde(default)]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub tool_input: Value,
    /// Tool result payload, present on post-tool events from hosts that
    /// forward it. Used for external-content boundary analysis.
    #[serde(default)]
    pub tool_response: Option<Value>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub cwd: Option<PathBuf>,
    /// On stop events: the user request that opened the turn, when the host
    /// forwards it. Feeds the optional second-opinion verifier.
    #[serde(default)]
    pub prompt: Option<String>,
    /// On stop events: the finalized response text, when the host forwards it.
    #[serde(default)]
    pub response: Option<String>,
}

impl HookEvent {
    /// Parse a raw stdin payload. `None` means unparseable or empty input,
    /// which the supervisor maps to a pass-through decision.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.trim().is_empty() {
            return None;
        }
        serde_json::from_str(raw).ok()
    }
}

/// Decision envelope written to stdout at the end of an invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Allow the tool call to proceed.
    Approve,
    /// Reject the tool call; `reason` is the formatted violation bundle.
    Block { reason: String },
    /// Stop-hook injection: the composed self-review prompt.
    Prompt { prompt: String },
    /// No output at all (post-tool, or a stop hook with nothing to inject).
    Silent,
}

impl Decision {
    /// The JSON body to write to stdout, or `None` for an empty body.
    pub fn to_stdout_body(&self) -> Option<String> {
        match self {
            Decision::Approve => Some(serde_json::json!({"decision": "approve"}).to_string()),
            Decision::Block { reason } => {
                Some(serde_json::json!({"decision": "block", "reason": reason}).to_string())
            }
            Decision::Prompt { prompt } => {
                Some(serde_json::json!({"prompt": prompt}).to_string())
            }
            Decision::Silent => None,
        }
    }

    /// Audit-log label for this decision.
    pub fn audit_label(&self) -> &'static str {
        match self {
            Decision::Approve => "approve",
            Decision::Block { .. } => "block",
            Decision::Prompt { .. } | Decision::Silent => "logOnly",
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(self, Decision::Block { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pre_tool_event() {
        let raw = r#"{
            "hook_point": "pre-tool",
            "tool_name": "Bash",
            "tool_input": {"command": "ls"},
            "session_id": "s-1",
            "cwd": "/tmp/proj"
        }"#;
        let event = HookEvent::parse(raw).expect("event should parse");
        assert_eq!(event.hook_point, Some(HookPoint::PreTool));
        assert_eq!(event.tool_name.as_deref(), Some("Bash"));
        assert_eq!(event.session_id.as_deref(), Some("s-1"));
        assert_eq!(event.cwd, Some(PathBuf::from("/tmp/proj")));
    }

    #[test]
    fn test_parse_stop_event_without_tool() {
        let raw = r#"{"hook_point": "stop", "session_id": "s-2"}"#;
        let event = HookEvent::parse(raw).expect("event should parse");
        assert_eq!(event.hook_point, Some(HookPoint::Stop));
        assert!(event.tool_name.is_none());
        assert!(event.tool_input.is_null());
    }

    #[test]
    fn test_parse_tolerates_unknown_fields() {
        let raw = r#"{"hook_point": "post-tool", "transcript_path": "/x.jsonl", "extra": 1}"#;
        assert!(HookEvent::parse(raw).is_some());
    }

    #[test]
    fn test_parse_rejects_garbage_and_empty() {
        assert!(HookEvent::parse("").is_none());
        assert!(HookEvent::parse("   \n").is_none());
        assert!(HookEvent::parse("not json").is_none());
        assert!(HookEvent::parse("{\"hook_point\": \"pre-tool\"").is_none());
    }

    #[test]
    fn test_approve_envelope() {
        let body = Decision::Approve.to_stdout_body().unwrap();
        let value: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["decision"], "approve");
    }

    #[test]
    fn test_block_envelope_carries_reason() {
        let decision = Decision::Block {
            reason: "1. [no-eval] eval() is forbidden".to_string(),
        };
        let value: Value = serde_json::from_str(&decision.to_stdout_body().unwrap()).unwrap();
        assert_eq!(value["decision"], "block");
        assert!(value["reason"].as_str().unwrap().contains("no-eval"));
    }

    #[test]
    fn test_prompt_envelope() {
        let decision = Decision::Prompt {
            prompt: "Review your work.".to_string(),
        };
        let value: Value = serde_json::from_str(&decision.to_stdout_body().unwrap()).unwrap();
        assert_eq!(value["prompt"], "Review your work.");
    }

    #[test]
    fn test_silent_has_no_body() {
        assert!(Decision::Silent.to_stdout_body().is_none());
    }

    #[test]
    fn test_audit_labels() {
        assert_eq!(Decision::Approve.audit_label(), "approve");
        assert_eq!(
            Decision::Block {
                reason: String::new()
            }
            .audit_label(),
            "block"
        );
        assert_eq!(Decision::Silent.audit_label(), "logOnly");
    }

    #[test]
    fn test_hook_point_display_roundtrip() {
        for point in [HookPoint::PreTool, HookPoint::PostTool, HookPoint::Stop] {
            let json = serde_json::to_string(&point).unwrap();
            assert_eq!(json, format!("\"{point}\""));
            let back: HookPoint = serde_json::from_str(&json).unwrap();
            assert_eq!(back, point);
        }
    }
}
