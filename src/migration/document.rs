//! The export document and its file format
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "exportedAt": "2024-05-01T12:00:00.000Z",
//!   "userId": "…",
//!   "data": { "apiKeys": [], "serviceNotes": [], "resourceCategories": [], "resources": [] }
//! }
//! ```
//!
//! Rows keep the backend's column names. Envelope fields are carried as-is.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{VaultError, VaultResult};
use crate::models::{CategoryId, Credential, Resource, ResourceCategory, ServiceNote, UserId};
use crate::storage::write_json_atomic;

/// Current export format version
pub const EXPORT_VERSION: &str = "1.0";

/// Prefix of downloaded export files when none is configured
pub const DEFAULT_EXPORT_PREFIX: &str = "api-vault-backup";

/// A versioned snapshot of one user's data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    /// Format version tag
    pub version: String,

    /// When the snapshot was taken
    #[serde(
        default = "Utc::now",
        serialize_with = "iso_millis",
        deserialize_with = "lenient_timestamp"
    )]
    pub exported_at: DateTime<Utc>,

    /// Owner the snapshot was taken from; rows are re-owned on import
    #[serde(default)]
    pub user_id: UserId,

    /// The four collections
    pub data: ExportData,
}

/// Collections carried by an export, in import order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    #[serde(default)]
    pub api_keys: Vec<Credential>,
    #[serde(default)]
    pub service_notes: Vec<ServiceNote>,
    #[serde(default)]
    pub resource_categories: Vec<ResourceCategory>,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

/// Per-collection row counts of a document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataStats {
    pub api_keys: usize,
    pub service_notes: usize,
    pub categories: usize,
    pub resources: usize,
    pub total: usize,
}

impl ExportDocument {
    /// Wrap collections fetched for `user_id`
    pub fn new(user_id: UserId, data: ExportData) -> Self {
        Self {
            version: EXPORT_VERSION.to_string(),
            exported_at: Utc::now(),
            user_id,
            data,
        }
    }

    /// Row counts per collection and their sum
    pub fn stats(&self) -> DataStats {
        let api_keys = self.data.api_keys.len();
        let service_notes = self.data.service_notes.len();
        let categories = self.data.resource_categories.len();
        let resources = self.data.resources.len();

        DataStats {
            api_keys,
            service_notes,
            categories,
            resources,
            total: api_keys + service_notes + categories + resources,
        }
    }

    /// Check the version and that every resource's category is in the document
    pub fn validate(&self) -> VaultResult<()> {
        self.check_version()?;
        let categories = self.category_ids();
        self.check_resource_categories(&categories)
    }

    /// Fail unless the document carries the supported version tag
    pub fn check_version(&self) -> VaultResult<()> {
        if self.version != EXPORT_VERSION {
            return Err(VaultError::InvalidFormat(format!(
                "unsupported version {:?}, expected {:?}",
                self.version, EXPORT_VERSION
            )));
        }
        Ok(())
    }

    /// Ids of the categories carried by the document
    pub fn category_ids(&self) -> HashSet<CategoryId> {
        self.data.resource_categories.iter().map(|c| c.id).collect()
    }

    /// Fail if a resource points at a category outside `known`
    pub fn check_resource_categories(&self, known: &HashSet<CategoryId>) -> VaultResult<()> {
        match self
            .data
            .resources
            .iter()
            .find(|r| !known.contains(&r.category_id))
        {
            Some(orphan) => Err(VaultError::InvalidFormat(format!(
                "resource {} references unknown category {}",
                orphan.id, orphan.category_id
            ))),
            None => Ok(()),
        }
    }

    /// Parse and shape-check a document
    ///
    /// The top level needs a string `version` and an object `data`; missing
    /// collections inside `data` are read as empty.
    pub fn from_value(value: Value) -> VaultResult<Self> {
        let has_version = value.get("version").is_some_and(Value::is_string);
        let has_data = value.get("data").is_some_and(Value::is_object);
        if !has_version || !has_data {
            return Err(VaultError::InvalidFormat(
                "missing \"version\" or \"data\"".into(),
            ));
        }

        serde_json::from_value(value).map_err(|e| VaultError::InvalidFormat(e.to_string()))
    }
}

/// Row counts of a document
pub fn data_stats(document: &ExportDocument) -> DataStats {
    document.stats()
}

/// `<prefix>-<YYYY-MM-DD>.json`
pub fn default_export_filename(prefix: &str, now: DateTime<Utc>) -> String {
    let prefix = if prefix.trim().is_empty() {
        DEFAULT_EXPORT_PREFIX
    } else {
        prefix
    };
    format!("{}-{}.json", prefix, now.format("%Y-%m-%d"))
}

/// Serialize a document the way it is written to disk
pub fn to_json_string(document: &ExportDocument, pretty: bool) -> VaultResult<String> {
    let json = if pretty {
        serde_json::to_string_pretty(document)
    } else {
        serde_json::to_string(document)
    };
    json.map_err(|e| VaultError::Export(e.to_string()))
}

/// Write a document as pretty JSON, atomically
pub fn write_export(document: &ExportDocument, path: &Path) -> VaultResult<()> {
    write_json_atomic(path, document)
}

/// Parse a document from text
pub fn parse_import_str(contents: &str) -> VaultResult<ExportDocument> {
    let value: Value = serde_json::from_str(contents)
        .map_err(|e| VaultError::Import(format!("Invalid JSON file: {}", e)))?;
    ExportDocument::from_value(value)
}

/// Read and parse a document from disk
pub fn parse_import_file(path: &Path) -> VaultResult<ExportDocument> {
    let contents = fs::read_to_string(path).map_err(|e| {
        VaultError::Import(format!("Failed to read file {}: {}", path.display(), e))
    })?;
    parse_import_str(&contents)
}

fn iso_millis<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// RFC 3339, or an ISO-8601 date-time without offset read as UTC
fn lenient_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    if let Ok(at) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|at| at.and_utc())
        .map_err(serde::de::Error::custom)
}
