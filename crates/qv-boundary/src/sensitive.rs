//! Sensitive system-path detection and the optional process snapshot.

use regex::Regex;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use sysinfo::{ProcessRefreshKind, RefreshKind, System};

struct SensitivePattern {
    id: &'static str,
    description: &'static str,
    pattern: Regex,
}

/// A sensitive-path hit inside a shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensitiveMatch {
    pub id: &'static str,
    pub description: &'static str,
}

macro_rules! sensitive_pattern {
    ($id:literal, $description:literal, $regex:literal) => {
        SensitivePattern {
            id: $id,
            description: $description,
            pattern: Regex::new($regex).expect("valid regex"),
        }
    };
}

static CATALOG: LazyLock<Vec<SensitivePattern>> = LazyLock::new(|| {
    vec![
        sensitive_pattern!("etc-passwd", "system account list", r"/etc/passwd"),
        sensitive_pattern!("etc-shadow", "system password hashes", r"/etc/shadow"),
        sensitive_pattern!(
            "ssh-keys",
            "SSH keys or client config",
            r"\.ssh/|\bid_(?:rsa|dsa|ecdsa|ed25519)\b|\bssh/config\b"
        ),
        sensitive_pattern!(
            "shell-history",
            "shell command history",
            r"\.(?:bash|zsh|sh)_history"
        ),
        sensitive_pattern!("dotenv", "environment secrets file", r#"(?:^|[\s/"'])\.env\b"#),
        sensitive_pattern!("aws-credentials", "AWS credentials", r"\.aws/credentials"),
        sensitive_pattern!("kube-config", "Kubernetes client config", r"\.kube/config"),
        sensitive_pattern!("docker-config", "Docker registry auth", r"\.docker/config\.json"),
        sensitive_pattern!("gnupg", "GPG key directory", r"\.gnupg\b"),
        sensitive_pattern!("npm-token", "npm auth token", r"\.npmrc|\bNPM_TOKEN\b"),
        sensitive_pattern!("git-credentials", "stored git credentials", r"\.git-credentials"),
        sensitive_pattern!(
            "windows-sam",
            "Windows registry hives",
            r"(?i)\\system32\\config\\(?:sam|security|system)\b"
        ),
        sensitive_pattern!(
            "windows-credential-store",
            "Windows credential store",
            r"(?i)\bcmdkey\b|\bvaultcmd\b|credential\s*manager"
        ),
        sensitive_pattern!(
            "dpapi",
            "DPAPI protected storage",
            r"(?i)appdata\\(?:roaming|local)\\microsoft\\(?:protect|credentials)"
        ),
        sensitive_pattern!(
            "registry-secrets",
            "registry queries for secrets",
            r"(?i)\breg(?:\.exe)?\s+query\s+[^\n]*(?:password|pwd|secret|key)"
        ),
    ]
});

/// Scan a shell command for sensitive-path access.
pub fn scan_sensitive_paths(command: &str) -> Vec<SensitiveMatch> {
    CATALOG
        .iter()
        .filter(|entry| entry.pattern.is_match(command))
        .map(|entry| SensitiveMatch {
            id: entry.id,
            description: entry.description,
        })
        .collect()
}

/// Whether any catalog entry matches. Used by the model router (strict
/// routing) and the exfiltration-sequence detector.
pub fn is_sensitive_path_access(text: &str) -> bool {
    CATALOG.iter().any(|entry| entry.pattern.is_match(text))
}

/// Capture a lightweight process snapshot: the ten most common process
/// names with their counts. Capture failure yields a sentinel value, never
/// an error.
pub fn process_snapshot() -> Value {
    let refresh =
        RefreshKind::nothing().with_processes(ProcessRefreshKind::nothing());
    let system = System::new_with_specifics(refresh);

    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    for process in system.processes().values() {
        let name = process.name().to_string_lossy().into_owned();
        *counts.entry(name).or_insert(0) += 1;
    }
    if counts.is_empty() {
        return json!({"unavailable": true});
    }

    let mut ranked: Vec<(String, u32)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(10);

    json!({
        "top": ranked
            .into_iter()
            .map(|(name, count)| json!({"name": name, "count": count}))
            .collect::<Vec<_>>()
    })
}
