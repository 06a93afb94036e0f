//! User settings for api-vault
//!
//! Preferences for export naming, import defaults and audit logging.

use serde::{Deserialize, Serialize};

use super::paths::VaultPaths;
use crate::error::VaultError;
use crate::migration::ImportMode;

/// User settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Prefix of downloaded export files (`<prefix>-<date>.json`)
    #[serde(default = "default_export_prefix")]
    pub export_prefix: String,

    /// Mode used by `data import` when none is given
    #[serde(default)]
    pub default_import_mode: ImportMode,

    /// Pretty-print export documents
    #[serde(default = "default_true")]
    pub pretty_export: bool,

    /// Write a full export to the backup directory before a replace import
    #[serde(default = "default_true")]
    pub backup_before_replace: bool,

    /// Append mutations to the audit log
    #[serde(default = "default_true")]
    pub audit_enabled: bool,
}

fn default_schema_version() -> u32 {
    1
}

fn default_export_prefix() -> String {
    "api-vault-backup".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            export_prefix: default_export_prefix(),
            default_import_mode: ImportMode::default(),
            pretty_export: true,
            backup_before_replace: true,
            audit_enabled: true,
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &VaultPaths) -> Result<Self, VaultError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| VaultError::Io(format!("Failed to read settings file: {}", e)))?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                VaultError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &VaultPaths) -> Result<(), VaultError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| VaultError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| VaultError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.schema_version, 1);
        assert_eq!(settings.export_prefix, "api-vault-backup");
        assert_eq!(settings.default_import_mode, ImportMode::Merge);
        assert!(settings.backup_before_replace);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.export_prefix = "my-vault".into();
        settings.default_import_mode = ImportMode::Replace;
        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.export_prefix, "my-vault");
        assert_eq!(loaded.default_import_mode, ImportMode::Replace);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"pretty_export": false}"#).unwrap();
        assert!(!settings.pretty_export);
        assert_eq!(settings.export_prefix, "api-vault-backup");
        assert!(settings.audit_enabled);
    }
}
