//! CLI commands for whole-account data
//!
//! Export, import, statistics, clearing and the export-then-wipe flow, plus
//! the per-service exchange files.

use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::{Subcommand, ValueEnum};

use super::{confirm_or_warn, print_progress};
use crate::audit::{AuditLogger, Operation};
use crate::config::{paths::VaultPaths, settings::Settings};
use crate::crypto::SessionStore;
use crate::display::format_data_stats;
use crate::error::{VaultError, VaultResult};
use crate::migration::{
    clear_all_data, data_stats, default_export_filename, export_all_data, import_all_data,
    import_service_entries, no_progress, parse_import_file, parse_service_json,
    service_export_filename, service_keys_csv, service_keys_json, to_json_string, write_export,
    ImportMode, WipeFlow,
};
use crate::services::Vault;
use crate::storage::Backend;

/// Per-service file format
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ServiceFileFormat {
    /// Re-importable, includes envelopes
    Json,
    /// Readable listing without secrets
    Csv,
}

impl ServiceFileFormat {
    fn extension(self) -> &'static str {
        match self {
            ServiceFileFormat::Json => "json",
            ServiceFileFormat::Csv => "csv",
        }
    }
}

/// Data subcommands
#[derive(Subcommand)]
pub enum DataCommands {
    /// Export every record to a JSON backup
    Export {
        /// Output file (default: <prefix>-<date>.json in the current directory)
        output: Option<PathBuf>,
        /// Print the document instead of writing a file
        #[arg(long, conflicts_with = "output")]
        stdout: bool,
    },
    /// Import a JSON backup into the account
    Import {
        /// Backup file
        file: PathBuf,
        /// Merge into existing data or replace it
        #[arg(short, long, value_enum)]
        mode: Option<ImportMode>,
        /// Skip confirmation for replace imports
        #[arg(short, long)]
        force: bool,
    },
    /// Show record counts for the account
    Stats,
    /// Delete every record in the account
    Clear {
        /// Confirm deletion
        #[arg(short, long)]
        force: bool,
    },
    /// Write a backup, then delete every record
    Wipe {
        /// Backup file (default: the backups directory)
        #[arg(short, long)]
        backup: Option<PathBuf>,
        /// Confirm deletion
        #[arg(short, long)]
        force: bool,
    },
    /// Export one service's credentials
    ServiceExport {
        /// Service name
        service: String,
        /// File format
        #[arg(short, long, value_enum, default_value = "json")]
        format: ServiceFileFormat,
        /// Output file (default: <service>-keys-<date>.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import a per-service JSON file into a service
    ServiceImport {
        /// Service name the keys are stored under
        service: String,
        /// JSON file
        file: PathBuf,
    },
    /// Show recent audit log entries
    History {
        /// Number of entries
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
}

/// Handle data commands
pub async fn handle_data_command<B: Backend, S: SessionStore>(
    vault: &Vault<B, S>,
    paths: &VaultPaths,
    settings: &Settings,
    cmd: DataCommands,
) -> VaultResult<()> {
    match cmd {
        DataCommands::Export { output, stdout } => {
            handle_export(vault, settings, output, stdout).await
        }
        DataCommands::Import { file, mode, force } => {
            let mode = mode.unwrap_or(settings.default_import_mode);
            handle_import(vault, paths, settings, &file, mode, force).await
        }
        DataCommands::Stats => {
            let document = export_all_data(vault.backend(), no_progress).await?;
            println!("{}", format_data_stats(&data_stats(&document)));
            Ok(())
        }
        DataCommands::Clear { force } => {
            if !confirm_or_warn(force, "About to permanently delete ALL of your data") {
                return Ok(());
            }
            let user = vault.current_user().await?;
            let removed = clear_all_data(vault.backend(), print_progress).await?;
            vault.log_dataset(
                Operation::Clear,
                &user,
                None,
                format!("{} rows deleted", removed.total),
            );
            println!("{}", format_data_stats(&removed));
            Ok(())
        }
        DataCommands::Wipe { backup, force } => handle_wipe(vault, paths, backup, force).await,
        DataCommands::ServiceExport {
            service,
            format,
            output,
        } => handle_service_export(vault, &service, format, output).await,
        DataCommands::ServiceImport { service, file } => {
            let contents = std::fs::read_to_string(&file).map_err(|e| {
                VaultError::Import(format!("Failed to read file {}: {}", file.display(), e))
            })?;
            let entries = parse_service_json(&contents)?;
            let user = vault.current_user().await?;
            let inserted = import_service_entries(vault.backend(), &service, &entries).await?;
            vault.log_dataset(
                Operation::Import,
                &user,
                Some(file.display().to_string()),
                format!("{} keys into {}", inserted, service.trim()),
            );
            println!("Imported {} keys into {}", inserted, service.trim());
            Ok(())
        }
        DataCommands::History { limit } => {
            let entries = AuditLogger::new(paths.audit_log()).read_recent(limit)?;
            if entries.is_empty() {
                println!("Audit log is empty.");
            }
            for entry in entries {
                println!("{}", entry.format_human_readable());
            }
            Ok(())
        }
    }
}

async fn handle_export<B: Backend, S: SessionStore>(
    vault: &Vault<B, S>,
    settings: &Settings,
    output: Option<PathBuf>,
    stdout: bool,
) -> VaultResult<()> {
    if stdout {
        let document = export_all_data(vault.backend(), no_progress).await?;
        println!("{}", to_json_string(&document, settings.pretty_export)?);
        return Ok(());
    }

    let path = output
        .unwrap_or_else(|| PathBuf::from(default_export_filename(&settings.export_prefix, Utc::now())));
    let document = export_all_data(vault.backend(), print_progress).await?;
    write_export(&document, &path)?;

    let stats = document.stats();
    vault.log_dataset(
        Operation::Export,
        &document.user_id,
        Some(path.display().to_string()),
        format!("{} rows", stats.total),
    );

    println!("Exported {} rows to {}", stats.total, path.display());
    println!("{}", format_data_stats(&stats));
    Ok(())
}

async fn handle_import<B: Backend, S: SessionStore>(
    vault: &Vault<B, S>,
    paths: &VaultPaths,
    settings: &Settings,
    file: &Path,
    mode: ImportMode,
    force: bool,
) -> VaultResult<()> {
    let document = parse_import_file(file)?;
    let incoming = document.stats();

    println!(
        "{} from {} ({} rows, exported {})",
        match mode {
            ImportMode::Merge => "Merging",
            ImportMode::Replace => "Replacing data",
        },
        file.display(),
        incoming.total,
        document.exported_at.format("%Y-%m-%d %H:%M")
    );

    if mode == ImportMode::Replace {
        if !confirm_or_warn(force, "Replace mode deletes all existing data before importing") {
            return Ok(());
        }
        if settings.backup_before_replace {
            let backup = paths
                .backup_dir()
                .join(format!("pre-import-{}.json", Utc::now().format("%Y%m%d-%H%M%S")));
            let current = export_all_data(vault.backend(), no_progress).await?;
            write_export(&current, &backup)?;
            println!("Safety backup written to {}", backup.display());
        }
    }

    let user = vault.current_user().await?;
    let stats = import_all_data(vault.backend(), &document, mode, print_progress).await?;
    vault.log_dataset(
        Operation::Import,
        &user,
        Some(file.display().to_string()),
        format!("{} import: {} rows", mode, stats.total),
    );

    println!("{}", format_data_stats(&stats));
    Ok(())
}

async fn handle_wipe<B: Backend, S: SessionStore>(
    vault: &Vault<B, S>,
    paths: &VaultPaths,
    backup: Option<PathBuf>,
    force: bool,
) -> VaultResult<()> {
    if !confirm_or_warn(force, "About to back up and then delete ALL of your data") {
        return Ok(());
    }

    let user = vault.current_user().await?;
    let backup = backup.unwrap_or_else(|| {
        paths
            .backup_dir()
            .join(default_export_filename("pre-wipe", Utc::now()))
    });

    let mut flow = WipeFlow::new();
    flow.export(vault.backend(), &backup, print_progress).await?;
    println!("Backup written to {}", backup.display());

    let removed = flow.clear(vault.backend(), print_progress).await?;
    vault.log_dataset(
        Operation::Clear,
        &user,
        Some(backup.display().to_string()),
        format!("{} rows deleted after backup", removed.total),
    );

    println!("{}", format_data_stats(&removed));
    Ok(())
}

async fn handle_service_export<B: Backend, S: SessionStore>(
    vault: &Vault<B, S>,
    service: &str,
    format: ServiceFileFormat,
    output: Option<PathBuf>,
) -> VaultResult<()> {
    let credentials = vault.credentials().list(Some(service.trim())).await?;
    if credentials.is_empty() {
        return Err(VaultError::Export(format!("No API keys stored for {}", service)));
    }

    let contents = match format {
        ServiceFileFormat::Json => service_keys_json(&credentials)?,
        ServiceFileFormat::Csv => service_keys_csv(&credentials)?,
    };
    let path = output.unwrap_or_else(|| {
        PathBuf::from(service_export_filename(service, format.extension(), Utc::now()))
    });
    std::fs::write(&path, contents)
        .map_err(|e| VaultError::Export(format!("Failed to write {}: {}", path.display(), e)))?;

    println!("Exported {} keys to {}", credentials.len(), path.display());
    Ok(())
}
