//! Whole-account backup and restore
//!
//! Export snapshots the signed-in user's four collections into an
//! [`ExportDocument`]; import applies one back in merge or replace mode;
//! clear wipes the account. Envelope fields are never decrypted here.
//!
//! Every operation takes an `on_progress(step, percent)` callback that is
//! called after each collection. It is purely observational.

pub mod clear;
pub mod document;
pub mod export;
pub mod import;
pub mod service_file;
pub mod wipe;

pub use clear::clear_all_data;
pub use document::{
    data_stats, default_export_filename, parse_import_file, parse_import_str, to_json_string,
    write_export, DataStats, ExportData, ExportDocument, DEFAULT_EXPORT_PREFIX, EXPORT_VERSION,
};
pub use export::export_all_data;
pub use import::{import_all_data, ImportMode};
pub use service_file::{
    import_service_entries, parse_service_json, service_export_filename, service_keys_csv,
    service_keys_json, ServiceKeyEntry,
};
pub use wipe::{WipeFlow, WipeState};

/// Progress callback that ignores every checkpoint
pub fn no_progress(_step: &str, _percent: u8) {}
