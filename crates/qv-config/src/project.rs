//! Project-root discovery and session-id resolution.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

/// Directory entries that mark a project root.
const PROJECT_MARKERS: [&str; 4] = [".git", "package.json", "pyproject.toml", ".claude"];

/// Millisecond timestamp captured once per process. Keeps the fallback
/// session id stable across the lifetime of a single hook invocation.
static LAUNCHED_AT_MS: LazyLock<u128> = LazyLock::new(|| {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
});

/// Walk upward from `cwd` until a directory containing a project marker is
/// found. Falls back to `cwd` itself when no marker exists on the path to
/// the filesystem root.
pub fn find_project_root(cwd: &Path) -> PathBuf {
    let mut dir = cwd;
    loop {
        if PROJECT_MARKERS.iter().any(|marker| dir.join(marker).exists()) {
            return dir.to_path_buf();
        }
        match dir.parent() {
            Some(parent) => dir = parent,
            None => return cwd.to_path_buf(),
        }
    }
}

/// Resolve the session id: the event field wins, then the host environment
/// variable, then a stable digest of the project root and process launch
/// time.
pub fn resolve_session_id(event_session_id: Option<&str>, project_root: &Path) -> String {
    if let Some(id) = event_session_id.filter(|id| !id.is_empty()) {
        return id.to_string();
    }
    if let Ok(id) = std::env::var("CLAUDE_SESSION_ID") {
        if !id.is_empty() {
            return id;
        }
    }
    fallback_session_id(project_root, *LAUNCHED_AT_MS)
}

fn fallback_session_id(project_root: &Path, launched_at_ms: u128) -> String {
    let mut hasher = Sha256::new();
    hasher.update(project_root.to_string_lossy().as_bytes());
    hasher.update(launched_at_ms.to_le_bytes());
    let digest = hasher.finalize();
    let mut id = String::with_capacity(16);
    for byte in digest.iter().take(8) {
        id.push_str(&format!("{byte:02x}"));
    }
    id
}
