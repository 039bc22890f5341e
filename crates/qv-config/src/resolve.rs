//! Config schema and the three-layer resolver.

use crate::merge::merge_json_values;
use qv_core::{STDERR_PREFIX, VerifyError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Enforcement strictness dial.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustLevel {
    /// Pre-tool enforcement is skipped entirely.
    Minimal,
    #[default]
    Standard,
    /// `disabled_rules` is cleared and `info` findings block like `warn`.
    Strict,
}

/// Capabilities a tool may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Filesystem,
    Shell,
    Network,
    Mcp,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::Filesystem => write!(f, "filesystem"),
            Capability::Shell => write!(f, "shell"),
            Capability::Network => write!(f, "network"),
            Capability::Mcp => write!(f, "mcp"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CapabilityConfig {
    pub enabled: bool,
    pub allowed: BTreeSet<Capability>,
    /// Unrecognized tools are blocked when true (the default).
    pub fail_closed: bool,
}

impl Default for CapabilityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed: BTreeSet::from([
                Capability::Filesystem,
                Capability::Shell,
                Capability::Network,
                Capability::Mcp,
            ]),
            fail_closed: true,
        }
    }
}

/// Per-invocation routing is opt-in: light routing skips every
/// non-critical rule, which quietly weakens enforcement on small writes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelRoutingConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Cycle4Config {
    pub enabled: bool,
}

impl Default for Cycle4Config {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Cycle5Config {
    pub enabled: bool,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub min_response_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct McpConfig {
    pub max_input_size_bytes: usize,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            max_input_size_bytes: 1024 * 1024,
        }
    }
}

/// Product of the config layers, read-only for the rest of the invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolvedConfig {
    pub trust_level: TrustLevel,
    pub lean_mode: bool,
    pub disabled_rules: BTreeSet<String>,
    pub capabilities: CapabilityConfig,
    pub model_routing: ModelRoutingConfig,
    pub max_verification_tokens: u32,
    pub cycle4: Cycle4Config,
    pub cycle5: Cycle5Config,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_dir: Option<PathBuf>,
    pub mcp: McpConfig,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            trust_level: TrustLevel::Standard,
            lean_mode: false,
            // Optional rules ship disabled in the process-local defaults and
            // can be re-enabled by any later layer.
            disabled_rules: BTreeSet::from(["no-any-type".to_string()]),
            capabilities: CapabilityConfig::default(),
            model_routing: ModelRoutingConfig::default(),
            max_verification_tokens: 500,
            cycle4: Cycle4Config::default(),
            cycle5: Cycle5Config::default(),
            audit_dir: None,
            mcp: McpConfig::default(),
        }
    }
}

/// `<plugin-root>/config/default-rules.json`, when the host exports the
/// plugin root.
pub fn plugin_default_config_path() -> Option<PathBuf> {
    std::env::var_os("CLAUDE_PLUGIN_ROOT")
        .map(|root| PathBuf::from(root).join("config").join("default-rules.json"))
}

/// `~/.claude/quadruple-verify-config.json`.
pub fn user_config_path() -> Option<PathBuf> {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".claude").join("quadruple-verify-config.json"))
}

/// `<projectRoot>/.claude/quadruple-verify-config.json`.
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".claude").join("quadruple-verify-config.json")
}

/// The audit directory, configured or derived from the project root.
pub fn audit_dir(config: &ResolvedConfig, project_root: &Path) -> PathBuf {
    config
        .audit_dir
        .clone()
        .unwrap_or_else(|| project_root.join(".claude").join("quadruple-verify-audit"))
}

/// Read one layer. Missing files are silently skipped; unreadable or
/// unparseable files degrade to nothing with a stderr warning.
fn load_layer(path: &Path) -> Option<Value> {
    if !path.exists() {
        return None;
    }
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            eprintln!(
                "{STDERR_PREFIX} could not read config layer {}: {err}",
                path.display()
            );
            return None;
        }
    };
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(map)) => {
            tracing::debug!(layer = %path.display(), keys = map.len(), "config layer loaded");
            Some(Value::Object(map))
        }
        Ok(_) => {
            eprintln!(
                "{STDERR_PREFIX} config layer {} is not a JSON object, ignoring",
                path.display()
            );
            None
        }
        Err(err) => {
            let err = VerifyError::ConfigLayer {
                path: path.to_path_buf(),
                detail: err.to_string(),
            };
            eprintln!("{STDERR_PREFIX} {err}");
            None
        }
    }
}

/// Merge the layer files over the process-local defaults and apply the
/// trust-level and environment post-passes.
pub fn resolve(project_root: &Path) -> ResolvedConfig {
    let layers = [
        plugin_default_config_path(),
        user_config_path(),
        Some(project_config_path(project_root)),
    ];
    resolve_from_layers(layers.into_iter().flatten())
}

/// Layer-order resolver, separated from the path wiring for tests.
pub(crate) fn resolve_from_layers(paths: impl Iterator<Item = PathBuf>) -> ResolvedConfig {
    let defaults = serde_json::to_value(ResolvedConfig::default())
        .unwrap_or_else(|_| Value::Object(Default::default()));

    let mut merged = defaults;
    for path in paths {
        if let Some(layer) = load_layer(&path) {
            merged = merge_json_values(merged, layer);
        }
    }

    let mut config: ResolvedConfig = match serde_json::from_value(merged) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{STDERR_PREFIX} merged config is malformed, using defaults: {err}");
            ResolvedConfig::default()
        }
    };

    if config.trust_level == TrustLevel::Strict {
        config.disabled_rules.clear();
    }
    if let Ok(key) = std::env::var("QUADRUPLE_VERIFY_API_KEY") {
        if !key.is_empty() {
            config.cycle5.api_key = Some(key);
        }
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_layer(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).expect("create layer file");
        file.write_all(contents.as_bytes()).expect("write layer file");
        path
    }

    #[test]
    fn test_defaults() {
        let config = ResolvedConfig::default();
        assert_eq!(config.trust_level, TrustLevel::Standard);
        assert!(!config.lean_mode);
        assert_eq!(config.max_verification_tokens, 500);
        assert!(config.capabilities.fail_closed);
        assert!(config.disabled_rules.contains("no-any-type"));
        assert!(!config.model_routing.enabled);
        assert!(!config.cycle5.enabled);
    }

    #[test]
    fn test_later_layer_overrides_earlier() {
        let temp = tempfile::tempdir().expect("tempdir");
        let user = write_layer(temp.path(), "user.json", r#"{"leanMode": true}"#);
        let project = write_layer(temp.path(), "project.json", r#"{"leanMode": false, "maxVerificationTokens": 900}"#);
        let config = resolve_from_layers([user, project].into_iter());
        assert!(!config.lean_mode);
        assert_eq!(config.max_verification_tokens, 900);
    }

    #[test]
    fn test_nested_capability_merge() {
        let temp = tempfile::tempdir().expect("tempdir");
        let layer = write_layer(
            temp.path(),
            "project.json",
            r#"{"capabilities": {"failClosed": false}}"#,
        );
        let config = resolve_from_layers([layer].into_iter());
        assert!(!config.capabilities.fail_closed);
        // Untouched sibling keys survive the merge.
        assert!(config.capabilities.enabled);
        assert_eq!(config.capabilities.allowed.len(), 4);
    }

    #[test]
    fn test_allowed_array_replaces() {
        let temp = tempfile::tempdir().expect("tempdir");
        let layer = write_layer(
            temp.path(),
            "project.json",
            r#"{"capabilities": {"allowed": ["filesystem"]}}"#,
        );
        let config = resolve_from_layers([layer].into_iter());
        assert_eq!(
            config.capabilities.allowed,
            BTreeSet::from([Capability::Filesystem])
        );
    }

    #[test]
    fn test_unparseable_layer_is_skipped() {
        let temp = tempfile::tempdir().expect("tempdir");
        let broken = write_layer(temp.path(), "broken.json", "{not json");
        let good = write_layer(temp.path(), "good.json", r#"{"leanMode": true}"#);
        let config = resolve_from_layers([broken, good].into_iter());
        assert!(config.lean_mode);
    }

    #[test]
    fn test_missing_layer_is_skipped() {
        let temp = tempfile::tempdir().expect("tempdir");
        let config = resolve_from_layers([temp.path().join("nope.json")].into_iter());
        assert_eq!(config, {
            let mut expected = ResolvedConfig::default();
            expected.cycle5.api_key = config.cycle5.api_key.clone();
            expected
        });
    }

    #[test]
    fn test_strict_clears_disabled_rules() {
        let temp = tempfile::tempdir().expect("tempdir");
        let layer = write_layer(
            temp.path(),
            "project.json",
            r#"{"trustLevel": "strict", "disabledRules": ["no-eval", "no-exec"]}"#,
        );
        let config = resolve_from_layers([layer].into_iter());
        assert_eq!(config.trust_level, TrustLevel::Strict);
        assert!(config.disabled_rules.is_empty());
    }

    #[test]
    fn test_disabled_rules_array_replaces_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let layer = write_layer(temp.path(), "project.json", r#"{"disabledRules": ["no-eval"]}"#);
        let config = resolve_from_layers([layer].into_iter());
        assert_eq!(config.disabled_rules, BTreeSet::from(["no-eval".to_string()]));
    }

    #[test]
    fn test_cycle5_layer() {
        let temp = tempfile::tempdir().expect("tempdir");
        let layer = write_layer(
            temp.path(),
            "project.json",
            r#"{"cycle5": {"enabled": true, "model": "gpt-4o-mini", "minResponseTokens": 120}}"#,
        );
        let config = resolve_from_layers([layer].into_iter());
        assert!(config.cycle5.enabled);
        assert_eq!(config.cycle5.model, "gpt-4o-mini");
        assert_eq!(config.cycle5.min_response_tokens, 120);
    }

    #[test]
    fn test_non_object_layer_is_ignored() {
        let temp = tempfile::tempdir().expect("tempdir");
        let layer = write_layer(temp.path(), "project.json", r#"[1, 2, 3]"#);
        let config = resolve_from_layers([layer].into_iter());
        assert_eq!(config.trust_level, TrustLevel::Standard);
    }
}
