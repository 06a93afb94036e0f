//! Audit logging for api-vault
//!
//! Every create, update and delete of a record, and every export, import
//! and clear of a dataset, is appended to `audit.log` as one JSON line.
//! Envelope columns are masked before an entry is written.

mod entry;
mod logger;

pub use entry::{redacted, AuditEntry, EntityType, Operation, ENVELOPE_COLUMNS, REDACTED};
pub use logger::AuditLogger;
