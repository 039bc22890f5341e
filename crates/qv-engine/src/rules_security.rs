//! Cycle 2: security rules. All carry priority 200.

use crate::rule::{Applicability, C_FAMILY_EXTENSIONS, PYTHON_EXTENSIONS, Rule};
use qv_core::Severity;
use std::ops::Range;
use std::sync::LazyLock;

/// Loopback URLs are exempt from the insecure-HTTP rule.
fn skip_loopback(content: &str, range: Range<usize>) -> bool {
    let url = &content[range];
    let host = url.strip_prefix("http://").unwrap_or(url);
    host.starts_with("localhost")
        || host.starts_with("127.")
        || host.starts_with("0.0.0.0")
        || host.starts_with("[::1]")
}

pub static CYCLE2_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new(
            "no-eval",
            2,
            r"\beval\s*\(",
            Applicability::All,
            Severity::Critical,
            "security.eval",
            "eval() executes arbitrary code",
            "Parse or dispatch explicitly instead of evaluating strings as code.",
        )
        .context_aware(),
        Rule::new(
            "no-exec",
            2,
            r"\bexec\s*\(",
            Applicability::FileWrite,
            Severity::Critical,
            "security.exec",
            "exec() executes arbitrary code",
            "Remove the dynamic execution; call the target code directly.",
        )
        .context_aware(),
        Rule::new(
            "no-process-shell",
            2,
            r"child_process|\bexecSync\s*\(|\bspawnSync\s*\(|subprocess\.(?:run|call|check_output|Popen)|os\.system|os\.popen",
            Applicability::FileWrite,
            Severity::Warn,
            "security.process-shell",
            "spawns a shell from code",
            "Avoid shelling out; use a library API, or justify and sanitize the invocation.",
        )
        .context_aware(),
        Rule::new(
            "no-shell-true",
            2,
            r"shell\s*=\s*True",
            Applicability::FileWrite,
            Severity::Critical,
            "security.shell-true",
            "subprocess with shell=True enables injection",
            "Pass an argument list and drop shell=True.",
        )
        .extensions(PYTHON_EXTENSIONS)
        .context_aware(),
        Rule::new(
            "no-hardcoded-secret",
            2,
            r#"(?i)(?:api[_-]?key|secret|passwd|password|token|private[_-]?key)\s*[:=]\s*["'][^"'\n]{8,}["']"#,
            Applicability::FileWrite,
            Severity::Critical,
            "security.hardcoded-secret",
            "hardcoded credential in source",
            "Load secrets from the environment or a secret store, never from source.",
        ),
        Rule::new(
            "no-sql-concat",
            2,
            r#"(?i)(?:["'`][^"'`\n]*\b(?:select|insert|update|delete)\b[^"'`\n]*["'`]\s*\+\s*|f["'][^"'\n]*\b(?:select\s+|insert\s+into|update\s+|delete\s+from)|\b(?:select|insert|update|delete)\b[^"'`\n]{0,80}?(?:%s|\$\{))"#,
            Applicability::FileWrite,
            Severity::Critical,
            "security.sql-concat",
            "SQL assembled by string concatenation or interpolation",
            "Use parameterized queries; never splice values into SQL text.",
        ),
        Rule::new(
            "no-inner-html",
            2,
            r"\.(?:innerHTML|outerHTML)\s*=|\.insertAdjacentHTML\s*\(",
            Applicability::FileWrite,
            Severity::Critical,
            "security.inner-html",
            "raw HTML sink enables XSS",
            "Use textContent or a sanitizer before inserting markup.",
        )
        .extensions(C_FAMILY_EXTENSIONS)
        .context_aware(),
        Rule::new(
            "no-rm-rf-root",
            2,
            r#"(?m)\brm\s+(?:-[a-zA-Z]+\s+)*-[a-zA-Z]*r[a-zA-Z]*\s+(?:--[-a-z]+\s+)*["']?(?:/|~|\$HOME)/?\*?["']?[ \t]*(?:$|[;&|])"#,
            Applicability::All,
            Severity::Critical,
            "security.destructive-delete",
            "recursive delete of the filesystem root or home",
            "Delete the specific build artifact paths instead.",
        ),
        Rule::new(
            "no-world-writable",
            2,
            r"\bchmod\s+(?:-[a-zA-Z]+\s+)*(?:0?777|0?666|[ao]\+\w*w\w*)\b",
            Applicability::All,
            Severity::Critical,
            "security.world-writable",
            "world-writable permissions",
            "Grant the narrowest permission bits the task needs.",
        ),
        Rule::new(
            "no-curl-pipe-sh",
            2,
            r"(?i)\b(?:curl|wget)\b[^\n|]*\|\s*(?:sudo\s+)?(?:ba|z|da)?sh\b",
            Applicability::All,
            Severity::Critical,
            "security.curl-pipe-shell",
            "pipes a downloaded script straight into a shell",
            "Download to a file, inspect it, then run it deliberately.",
        ),
        Rule::new(
            "no-insecure-http",
            2,
            r#"http://[^\s"'<>)]+"#,
            Applicability::All,
            Severity::Warn,
            "security.insecure-http",
            "plaintext HTTP URL",
            "Use https:// unless the endpoint is loopback.",
        )
        .skip_if(skip_loopback),
        Rule::new(
            "no-prompt-leak",
            2,
            r"(?i)(?:console\.log|print|logging\.\w+|logger\.\w+)\s*\([^)\n]*system[_\s-]?prompt",
            Applicability::FileWrite,
            Severity::Warn,
            "security.prompt-leak",
            "logs the system prompt",
            "Never write prompt material to logs or output channels.",
        ),
        Rule::new(
            "no-base64-exfil",
            2,
            r"(?i)(?:\b(?:base64|btoa)\b[^\n]*\|\s*(?:curl|wget|nc)\b|\b(?:curl|wget)\b[^\n]*\|\s*base64\b)",
            Applicability::All,
            Severity::Critical,
            "security.base64-exfil",
            "encodes data and sends it to the network",
            "Remove the encode-and-send pipeline.",
        ),
        Rule::new(
            "no-env-dump",
            2,
            r"(?m)^[ \t]*(?:env|printenv)[ \t]*$|(?:env|printenv)\s*\|\s*(?:curl|wget|nc)\b",
            Applicability::Bash,
            Severity::Warn,
            "security.env-dump",
            "dumps the process environment",
            "Inspect the single variable you need instead of dumping all of them.",
        ),
        Rule::new(
            "no-file-upload-exfil",
            2,
            r"\bcurl\b[^\n]*\s(?:-F\s|--form\s|-T\s|--upload-file\s|(?:-d|--data(?:-binary|-raw)?)\s*@)",
            Applicability::All,
            Severity::Critical,
            "security.file-upload",
            "uploads a local file to a remote endpoint",
            "Remove the upload; local files do not leave the machine.",
        ),
        Rule::new(
            "no-pickle-load",
            2,
            r"\b(?:pickle|cPickle)\.loads?\s*\(",
            Applicability::FileWrite,
            Severity::Critical,
            "security.pickle",
            "pickle deserialization executes arbitrary code",
            "Use a data-only format such as JSON for untrusted input.",
        )
        .extensions(PYTHON_EXTENSIONS)
        .context_aware(),
    ]
});
