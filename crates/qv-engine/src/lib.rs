//! The verifier rule engine and its supporting analyses.
//!
//! Rules are defined once, compiled once, and applied in declaration order
//! to the content extracted from a tool invocation. Cycle 1 covers code
//! quality and completeness, Cycle 2 security, Cycle 4 research-claim
//! sourcing. The lexical context analyzer lets context-aware rules ignore
//! matches that land inside comments or string literals.

pub mod capability;
pub mod context;
pub mod engine;
pub mod extract;
pub mod router;
pub mod rule;
pub mod rules_quality;
pub mod rules_research;
pub mod rules_security;

pub use capability::{GateOutcome, check_capabilities, required_capabilities};
pub use context::{SourceFamily, is_in_comment_or_string};
pub use engine::{EvalInput, decide_blocks, effective_severity, evaluate_code, evaluate_research};
pub use extract::{ExtractedInput, extract, is_mcp_tool};
pub use router::{RouteMode, route};
pub use rule::{Applicability, Rule, ToolContext};
pub use rules_research::is_research_path;
