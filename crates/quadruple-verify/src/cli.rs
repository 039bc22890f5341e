use clap::{Parser, Subcommand};
use qv_core::HookPoint;

/// Policy verifier for an AI coding agent's tool-use lifecycle.
///
/// Each invocation reads one JSON hook event on stdin and writes a decision
/// envelope on stdout. The subcommand names the hook point the host wired
/// this binary into; the event's own `hook_point` field, when present,
/// takes precedence.
#[derive(Debug, Parser)]
#[command(name = "quadruple-verify", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<HookCommand>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum HookCommand {
    /// Run the pre-tool check (the only hook that can block).
    PreTool,
    /// Record a completed tool call (behavior tracking + audit).
    PostTool,
    /// Compose the pre-finalize self-review prompt.
    Stop,
}

impl HookCommand {
    pub fn hook_point(self) -> HookPoint {
        match self {
            HookCommand::PreTool => HookPoint::PreTool,
            HookCommand::PostTool => HookPoint::PostTool,
            HookCommand::Stop => HookPoint::Stop,
        }
    }
}
