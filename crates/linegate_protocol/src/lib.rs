//! Canonical types shared across the Linegate workspace.
//!
//! Every crate that touches a scan, a decision, or an audit row uses the
//! definitions here. The audit-row schema is fixed: 19 named columns in a
//! fixed order, with `"N/A"` substituted for any field the source records
//! do not carry.

pub mod audit;
pub mod types;

// Re-export types for convenience
pub use audit::{AuditRow, AUDIT_COLUMNS, MISSING_FIELD, TIMESTAMP_FORMAT};
pub use types::{BatchRecord, Decision, DecisionTag, DeviceRecord, ScanEvent, VerdictPayload};
