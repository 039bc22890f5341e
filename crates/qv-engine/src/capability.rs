//! The capability gate.
//!
//! Each tool maps to the capabilities it needs; the gate blocks invocations
//! whose requirements are not in the configured allow set. Unrecognized
//! tools are blocked under the default fail-closed policy.

use crate::extract::is_mcp_tool;
use qv_config::{Capability, CapabilityConfig};

/// Gate result for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    Allowed,
    /// Blocked; `missing` names the capabilities (or `unknown`) that caused it.
    Denied { missing: Vec<String> },
}

/// The static tool → capability map. `None` means the tool is unrecognized.
pub fn required_capabilities(tool_name: &str) -> Option<&'static [Capability]> {
    match tool_name {
        "Write" | "Edit" | "Read" | "Glob" | "Grep" => Some(&[Capability::Filesystem]),
        "Bash" => Some(&[Capability::Shell, Capability::Filesystem, Capability::Network]),
        "WebFetch" | "WebSearch" => Some(&[Capability::Network]),
        name if is_mcp_tool(name) => Some(&[Capability::Mcp]),
        _ => None,
    }
}

/// Check one invocation against the configured capability policy.
pub fn check_capabilities(tool_name: &str, config: &CapabilityConfig) -> GateOutcome {
    if !config.enabled {
        return GateOutcome::Allowed;
    }
    match required_capabilities(tool_name) {
        Some(required) => {
            let missing: Vec<String> = required
                .iter()
                .filter(|cap| !config.allowed.contains(cap))
                .map(|cap| cap.to_string())
                .collect();
            if missing.is_empty() {
                GateOutcome::Allowed
            } else {
                GateOutcome::Denied { missing }
            }
        }
        None if config.fail_closed => GateOutcome::Denied {
            missing: vec!["unknown".to_string()],
        },
        None => GateOutcome::Allowed,
    }
}
