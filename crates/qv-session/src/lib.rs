//! Cross-invocation session state.
//!
//! Hook processes are short-lived; everything that must survive one of them
//! lives in a per-session JSON file next to the audit log. The store uses
//! read-modify-write with an atomic rename: two overlapping hook processes
//! can lose an update (at worst, a missed behavioral warning) but can never
//! leave the file as anything other than a valid JSON document.

pub mod audit;
pub mod behavior;
pub mod budget;
pub mod correction;
pub mod state;
pub mod store;

pub use audit::{AuditEntry, AuditWriter};
pub use behavior::{BehaviorWarning, record_and_detect};
pub use state::{BehaviorEntry, CorrectionAttempt, SessionState};
pub use store::StateStore;
