//! Credential CLI commands
//!
//! Implements CLI commands for stored API keys and passwords.

use std::path::{Path, PathBuf};

use clap::Subcommand;

use super::{confirm_or_warn, prompt_secret};
use crate::crypto::SessionStore;
use crate::display::{format_credential_details, format_credential_list, format_service_overview};
use crate::error::{VaultError, VaultResult};
use crate::services::{CredentialUpdate, MassAddRow, NewCredential, Vault};
use crate::storage::Backend;

/// Credential subcommands
#[derive(Subcommand)]
pub enum CredentialCommands {
    /// Store a new credential
    Add {
        /// Service name (e.g. "OpenAI")
        service: String,
        /// Secret value; prompted for when omitted
        #[arg(long)]
        api_key: Option<String>,
        /// Email or username
        #[arg(short, long, default_value = "")]
        email: String,
        /// Prompt for a password as well
        #[arg(short, long)]
        password: bool,
        /// Notes
        #[arg(short, long, default_value = "")]
        notes: String,
        /// Tags (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },
    /// Store many credentials for one service from a CSV file
    ///
    /// Columns: api_key, email_username, password, notes
    MassAdd {
        /// Service name
        service: String,
        /// CSV file with a header row
        file: PathBuf,
    },
    /// List credentials
    List {
        /// Only this service
        #[arg(short, long)]
        service: Option<String>,
        /// Show decrypted secrets
        #[arg(long)]
        reveal: bool,
    },
    /// Show one credential with its secrets
    Show {
        /// Credential ID
        id: String,
    },
    /// Change a credential
    Edit {
        /// Credential ID
        id: String,
        /// New service name
        #[arg(long)]
        service: Option<String>,
        /// New email or username
        #[arg(short, long)]
        email: Option<String>,
        /// New secret value
        #[arg(long)]
        api_key: Option<String>,
        /// Prompt for a new password
        #[arg(short, long)]
        password: bool,
        /// New notes
        #[arg(short, long)]
        notes: Option<String>,
        /// Replace the tags (repeatable)
        #[arg(short, long = "tag")]
        tags: Option<Vec<String>>,
    },
    /// Delete a credential
    Delete {
        /// Credential ID
        id: String,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
    /// Show key counts per service
    Services,
}

/// Handle a credential command
pub async fn handle_credential_command<B: Backend, S: SessionStore>(
    vault: &Vault<B, S>,
    cmd: CredentialCommands,
) -> VaultResult<()> {
    let service = vault.credentials();

    match cmd {
        CredentialCommands::Add {
            service: service_name,
            api_key,
            email,
            password,
            notes,
            tags,
        } => {
            let api_key = match api_key {
                Some(key) => key,
                None => prompt_secret("API key: ")?,
            };
            let password = if password {
                prompt_secret("Password: ")?
            } else {
                String::new()
            };

            let created = service
                .create(NewCredential {
                    service_name,
                    email_username: email,
                    password,
                    api_key,
                    notes,
                    tags,
                })
                .await?;
            println!("Stored API key: {}", created);
        }

        CredentialCommands::MassAdd {
            service: service_name,
            file,
        } => {
            let rows = read_mass_add_rows(&file)?;
            let added = service.mass_add(&service_name, rows).await?;
            println!("Stored {} API keys for {}", added.len(), service_name.trim());
        }

        CredentialCommands::List {
            service: service_name,
            reveal,
        } => {
            let credentials = service.list(service_name.as_deref()).await?;
            println!("{}", format_credential_list(&credentials, vault.crypto(), reveal));
        }

        CredentialCommands::Show { id } => {
            let credential = service.require(&id).await?;
            print!("{}", format_credential_details(&credential, vault.crypto()));
        }

        CredentialCommands::Edit {
            id,
            service: service_name,
            email,
            api_key,
            password,
            notes,
            tags,
        } => {
            let credential = service.require(&id).await?;
            let password = if password {
                Some(prompt_secret("New password (empty to remove): ")?)
            } else {
                None
            };

            let updated = service
                .update(
                    credential.id,
                    CredentialUpdate {
                        service_name,
                        email_username: email,
                        password,
                        api_key,
                        notes,
                        tags,
                    },
                )
                .await?;
            println!("Updated API key: {}", updated);
        }

        CredentialCommands::Delete { id, force } => {
            let credential = service.require(&id).await?;
            if !confirm_or_warn(force, &format!("About to delete API key: {}", credential)) {
                return Ok(());
            }
            let deleted = service.delete(credential.id).await?;
            println!("Deleted API key: {}", deleted);
        }

        CredentialCommands::Services => {
            let overview = service.service_overview().await?;
            println!("{}", format_service_overview(&overview));
        }
    }

    Ok(())
}

/// Read mass-add rows from a CSV file with a header row
fn read_mass_add_rows(path: &Path) -> VaultResult<Vec<MassAddRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| VaultError::Import(format!("Failed to open {}: {}", path.display(), e)))?;

    let headers = reader
        .headers()
        .map_err(|e| VaultError::Import(format!("Failed to read CSV header: {}", e)))?
        .clone();
    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let api_key = column("api_key").ok_or_else(|| {
        VaultError::Import("CSV file needs an api_key column".to_string())
    })?;
    let email = column("email_username");
    let password = column("password");
    let notes = column("notes");

    let mut rows = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| VaultError::Import(format!("Failed to read CSV row: {}", e)))?;
        let field = |index: Option<usize>| {
            index
                .and_then(|i| record.get(i))
                .unwrap_or_default()
                .to_string()
        };
        rows.push(MassAddRow {
            api_key: field(Some(api_key)),
            email_username: field(email),
            password: field(password),
            notes: field(notes),
        });
    }

    Ok(rows)
}
