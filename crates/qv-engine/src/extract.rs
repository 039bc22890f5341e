//! Tool-input extraction.
//!
//! Maps a tool invocation to the content the rule engine scans:
//! `Write → content`, `Edit → new_string`, `Bash → command`,
//! `WebFetch/WebSearch → url | query`, and MCP tools to the concatenation
//! of their string-typed input values.

use crate::rule::ToolContext;
use serde_json::Value;
use std::path::PathBuf;

/// Content and context extracted from one tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedInput {
    pub content: String,
    pub file_path: Option<PathBuf>,
    pub tool_context: ToolContext,
}

impl ExtractedInput {
    /// Lower-cased file extension, when a path is present.
    pub fn extension(&self) -> Option<String> {
        self.file_path
            .as_ref()?
            .extension()?
            .to_str()
            .map(|ext| ext.to_ascii_lowercase())
    }
}

/// MCP tool names arrive as `mcp__server__tool` or `mcp_server_tool`.
pub fn is_mcp_tool(tool_name: &str) -> bool {
    tool_name.starts_with("mcp__") || tool_name.starts_with("mcp_")
}

fn string_field(input: &Value, key: &str) -> Option<String> {
    input.get(key).and_then(Value::as_str).map(str::to_string)
}

fn path_field(input: &Value, key: &str) -> Option<PathBuf> {
    input.get(key).and_then(Value::as_str).map(PathBuf::from)
}

/// Extract scannable content from a tool invocation. `None` means the tool
/// carries nothing the engine knows how to scan.
pub fn extract(tool_name: &str, tool_input: &Value) -> Option<ExtractedInput> {
    match tool_name {
        "Write" => Some(ExtractedInput {
            content: string_field(tool_input, "content")?,
            file_path: path_field(tool_input, "file_path"),
            tool_context: ToolContext::FileWrite,
        }),
        "Edit" => Some(ExtractedInput {
            content: string_field(tool_input, "new_string")?,
            file_path: path_field(tool_input, "file_path"),
            tool_context: ToolContext::FileWrite,
        }),
        "Bash" => Some(ExtractedInput {
            content: string_field(tool_input, "command")?,
            file_path: None,
            tool_context: ToolContext::Bash,
        }),
        "WebFetch" | "WebSearch" => {
            let content =
                string_field(tool_input, "url").or_else(|| string_field(tool_input, "query"))?;
            Some(ExtractedInput {
                content,
                file_path: None,
                tool_context: ToolContext::Web,
            })
        }
        name if is_mcp_tool(name) => {
            let object = tool_input.as_object()?;
            let parts: Vec<&str> = object.values().filter_map(Value::as_str).collect();
            if parts.is_empty() {
                return None;
            }
            Some(ExtractedInput {
                content: parts.join("\n"),
                file_path: None,
                tool_context: ToolContext::Mcp,
            })
        }
        _ => None,
    }
}
