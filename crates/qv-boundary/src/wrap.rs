//! Boundary markers for untrusted external content.

pub const BOUNDARY_START: &str = "<!-- EXTERNAL_CONTENT_START -->";
pub const BOUNDARY_END: &str = "<!-- EXTERNAL_CONTENT_END -->";

const ESCAPED_START: &str = "<!-- EXTERNAL_CONTENT_START [escaped] -->";
const ESCAPED_END: &str = "<!-- EXTERNAL_CONTENT_END [escaped] -->";

/// Wrap external content in boundary markers. Marker strings already present
/// in the content are escaped first so the content cannot terminate its own
/// boundary.
pub fn wrap_external_content(content: &str) -> String {
    let sanitized = content
        .replace(BOUNDARY_START, ESCAPED_START)
        .replace(BOUNDARY_END, ESCAPED_END);
    format!("{BOUNDARY_START}\n{sanitized}\n{BOUNDARY_END}")
}
