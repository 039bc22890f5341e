//! Per-invocation model routing.
//!
//! Classifies an invocation as light, standard, or strict and adjusts the
//! effective rule set: light runs only critical-severity rules, strict
//! ignores the disabled-rules list.

use crate::extract::ExtractedInput;
use crate::rule::ToolContext;
use qv_boundary::is_sensitive_path_access;
use qv_config::ResolvedConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RouteMode {
    /// Critical-severity rules only.
    Light,
    #[default]
    Standard,
    /// Full rule set; the disabled list is ignored.
    Strict,
}

/// Route one invocation. A no-op (`Standard`) when routing is disabled.
pub fn route(extracted: &ExtractedInput, config: &ResolvedConfig) -> RouteMode {
    if !config.model_routing.enabled {
        return RouteMode::Standard;
    }
    match extracted.tool_context {
        ToolContext::Bash => {
            let command = extracted.content.as_str();
            if is_sensitive_path_access(command) {
                RouteMode::Strict
            } else if command.len() < 50 && !command.contains('|') && !command.contains(';') {
                RouteMode::Light
            } else {
                RouteMode::Standard
            }
        }
        ToolContext::FileWrite if extracted.content.len() < 200 => RouteMode::Light,
        _ => RouteMode::Standard,
    }
}
