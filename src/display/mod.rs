//! Display formatting for terminal output
//!
//! Renders credentials, notes, resources and dataset counts for the CLI.

pub mod credential;
pub mod data;
pub mod resource;

pub use credential::{format_credential_details, format_credential_list, format_service_overview};
pub use data::format_data_stats;
pub use resource::{format_note, format_resource_tree};
