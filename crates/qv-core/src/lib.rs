//! Shared types for the quadruple-verify hook processes.
//!
//! Every hook invocation is a short-lived process: it reads one JSON event
//! on stdin, runs a verification pipeline, and writes a decision envelope on
//! stdout. This crate holds the types that cross crate boundaries: the
//! event, the decision envelope, rule violations, and the typed error enum.

pub mod error;
pub mod event;
pub mod violation;

pub use error::VerifyError;
pub use event::{Decision, HookEvent, HookPoint};
pub use violation::{Severity, Violation};

/// Stderr prefix for operator-facing diagnostics, fixed by the hook protocol.
pub const STDERR_PREFIX: &str = "[quadruple-verify]";
