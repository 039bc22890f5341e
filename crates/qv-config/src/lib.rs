//! Layered configuration and project/session resolution.
//!
//! Three JSON layers merge into one [`ResolvedConfig`]: process-local
//! defaults, the plugin's shipped `config/default-rules.json`, the user file
//! under `~/.claude/`, and the project file under `<projectRoot>/.claude/`.
//! Missing or unparseable layers degrade to empty with a stderr warning; the
//! verifier never refuses to run because of its own configuration.

mod merge;
mod project;
mod resolve;

pub use merge::merge_json_values;
pub use project::{find_project_root, resolve_session_id};
pub use resolve::{
    Capability, CapabilityConfig, Cycle4Config, Cycle5Config, McpConfig, ModelRoutingConfig,
    ResolvedConfig, TrustLevel, audit_dir, plugin_default_config_path, project_config_path,
    resolve, user_config_path,
};
