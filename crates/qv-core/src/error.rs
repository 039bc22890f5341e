use std::path::PathBuf;

/// Typed failures that callers branch on.
///
/// Everything else is `anyhow::Error` context. Nothing here ever escapes the
/// process boundary: the supervisor reduces any failure to a pass-through
/// decision (the fail-open contract), so these exist for control flow and
/// diagnostics, not for the host.
#[derive(thiserror::Error, Debug)]
pub enum VerifyError {
    #[error("Tool '{tool}' denied: missing capabilities [{missing}]")]
    CapabilityDenied { tool: String, missing: String },

    #[error("Config layer '{path}' is not valid JSON: {detail}")]
    ConfigLayer { path: PathBuf, detail: String },

    #[error("Session state at '{path}' could not be written: {detail}")]
    StateIo { path: PathBuf, detail: String },
}
