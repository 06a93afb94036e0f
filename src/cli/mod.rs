//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod credential;
pub mod data;
pub mod note;
pub mod resource;
pub mod session;

pub use credential::{handle_credential_command, CredentialCommands};
pub use data::{handle_data_command, DataCommands};
pub use note::{handle_note_command, NoteCommands};
pub use resource::{handle_resource_command, ResourceCommands};
pub use session::{handle_session_command, SessionCommands};

use crate::error::{VaultError, VaultResult};

/// Report a migration checkpoint on stderr
pub fn print_progress(step: &str, percent: u8) {
    eprintln!("[{:>3}%] {}", percent, step);
}

/// Prompt for a secret without echoing it
pub fn prompt_secret(prompt: &str) -> VaultResult<String> {
    rpassword::prompt_password(prompt)
        .map_err(|e| VaultError::Io(format!("Failed to read secret: {}", e)))
}

/// Print `warning` and the `--force` hint unless `force` is set
fn confirm_or_warn(force: bool, warning: &str) -> bool {
    if !force {
        println!("{}", warning);
        println!("Use --force to confirm");
    }
    force
}
