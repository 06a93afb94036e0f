//! Service note CLI commands

use std::path::PathBuf;

use clap::Subcommand;

use super::confirm_or_warn;
use crate::crypto::SessionStore;
use crate::display::format_note;
use crate::error::{VaultError, VaultResult};
use crate::services::Vault;
use crate::storage::Backend;

/// Note subcommands
#[derive(Subcommand)]
pub enum NoteCommands {
    /// Print the note for a service
    Show {
        /// Service name
        service: String,
    },
    /// Save the note for a service
    Set {
        /// Service name
        service: String,
        /// Markdown content
        #[arg(short, long, conflicts_with = "file")]
        content: Option<String>,
        /// Read the content from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// List services that have notes
    List,
    /// Delete the note for a service
    Delete {
        /// Service name
        service: String,
        /// Skip confirmation
        #[arg(long)]
        force: bool,
    },
}

/// Handle a note command
pub async fn handle_note_command<B: Backend, S: SessionStore>(
    vault: &Vault<B, S>,
    cmd: NoteCommands,
) -> VaultResult<()> {
    let notes = vault.notes();

    match cmd {
        NoteCommands::Show { service } => match notes.get(&service).await? {
            Some(note) => print!("{}", format_note(&note)),
            None => println!("No notes for {} yet.", service),
        },

        NoteCommands::Set {
            service,
            content,
            file,
        } => {
            let content = match (content, file) {
                (Some(content), _) => content,
                (None, Some(path)) => std::fs::read_to_string(&path).map_err(|e| {
                    VaultError::Io(format!("Failed to read {}: {}", path.display(), e))
                })?,
                (None, None) => {
                    return Err(VaultError::Validation(
                        "Provide the note with --content or --file".into(),
                    ))
                }
            };
            let note = notes.save(&service, &content).await?;
            println!("Saved notes for {}", note.service_name);
        }

        NoteCommands::List => {
            let all = notes.list().await?;
            if all.is_empty() {
                println!("No service notes found.");
            }
            for note in all {
                println!(
                    "{:30} {}",
                    note.service_name,
                    note.updated_at.format("%Y-%m-%d %H:%M")
                );
            }
        }

        NoteCommands::Delete { service, force } => {
            if !confirm_or_warn(force, &format!("About to delete notes for {}", service)) {
                return Ok(());
            }
            let note = notes.delete(&service).await?;
            println!("Deleted notes for {}", note.service_name);
        }
    }

    Ok(())
}
