use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use api_vault::audit::AuditLogger;
use api_vault::cli::{
    handle_credential_command, handle_data_command, handle_note_command,
    handle_resource_command, handle_session_command, CredentialCommands, DataCommands,
    NoteCommands, ResourceCommands, SessionCommands,
};
use api_vault::config::{paths::VaultPaths, settings::Settings};
use api_vault::crypto::{EncryptionContext, FileSessionStore};
use api_vault::services::Vault;
use api_vault::storage::JsonBackend;

/// Environment variable holding the log filter
const LOG_ENV: &str = "VAULT_LOG";

#[derive(Parser)]
#[command(
    name = "vault",
    version,
    about = "Session-encrypted credential vault",
    long_about = "api-vault stores API keys and passwords encrypted under a per-session \
                  key, keeps notes and reference links per service, and moves a whole \
                  account between installations with versioned JSON backups."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// API key and password management
    #[command(subcommand, alias = "key")]
    Credential(CredentialCommands),

    /// Per-service markdown notes
    #[command(subcommand)]
    Note(NoteCommands),

    /// Resource categories and links
    #[command(subcommand, alias = "res")]
    Resource(ResourceCommands),

    /// Export, import and clear account data
    #[command(subcommand)]
    Data(DataCommands),

    /// Sign in and out
    #[command(subcommand)]
    Session(SessionCommands),

    /// Show current configuration and paths
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let paths = VaultPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    let session = Arc::new(FileSessionStore::new(paths.session_dir()));
    let backend = JsonBackend::open(paths.clone(), Arc::clone(&session))?;
    let mut vault = Vault::new(backend, EncryptionContext::new(session));
    if settings.audit_enabled {
        vault = vault.with_audit(AuditLogger::new(paths.audit_log()));
    }

    match cli.command {
        Some(Commands::Credential(cmd)) => handle_credential_command(&vault, cmd).await?,
        Some(Commands::Note(cmd)) => handle_note_command(&vault, cmd).await?,
        Some(Commands::Resource(cmd)) => handle_resource_command(&vault, cmd).await?,
        Some(Commands::Data(cmd)) => handle_data_command(&vault, &paths, &settings, cmd).await?,
        Some(Commands::Session(cmd)) => handle_session_command(&vault, cmd).await?,
        Some(Commands::Config) => {
            println!("api-vault Configuration");
            println!("=======================");
            println!("Base directory:    {}", paths.base_dir().display());
            println!("Data directory:    {}", paths.data_dir().display());
            println!("Session directory: {}", paths.session_dir().display());
            println!("Backup directory:  {}", paths.backup_dir().display());
            println!();
            println!("Settings:");
            println!("  Export prefix:         {}", settings.export_prefix);
            println!("  Default import mode:   {}", settings.default_import_mode);
            println!("  Backup before replace: {}", settings.backup_before_replace);
            println!("  Audit log enabled:     {}", settings.audit_enabled);
        }
        None => {
            println!("api-vault - session-encrypted credential vault");
            println!();
            println!("Run 'vault --help' for usage information.");
            println!("Run 'vault session sign-in <user>' to get started.");
        }
    }

    Ok(())
}
