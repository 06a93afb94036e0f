//! Exchange files for one service's credentials
//!
//! JSON files carry the envelope fields so they can be imported again; CSV
//! files are a readable listing without any secret material.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{VaultError, VaultResult};
use crate::models::Credential;
use crate::storage::{require_user, Backend};

const CSV_HEADERS: [&str; 6] = [
    "Service Name",
    "Email/Username",
    "Notes",
    "Tags",
    "Created At",
    "Updated At",
];

/// One credential as stored in a per-service file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceKeyEntry {
    #[serde(default)]
    pub service_name: String,
    #[serde(default)]
    pub email_username: Option<String>,
    #[serde(default)]
    pub encrypted_password: Option<String>,
    pub encrypted_api_key: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&Credential> for ServiceKeyEntry {
    fn from(credential: &Credential) -> Self {
        Self {
            service_name: credential.service_name.clone(),
            email_username: Some(credential.email_username.clone()),
            encrypted_password: Some(credential.encrypted_password.clone()),
            encrypted_api_key: credential.encrypted_api_key.clone(),
            notes: Some(credential.notes.clone()),
            tags: Some(credential.tags.clone()),
            created_at: Some(credential.created_at),
            updated_at: Some(credential.updated_at),
        }
    }
}

/// `<service-slug>-keys-<YYYY-MM-DD>.<extension>`
pub fn service_export_filename(service: &str, extension: &str, now: DateTime<Utc>) -> String {
    let slug = service
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    format!("{}-keys-{}.{}", slug, now.format("%Y-%m-%d"), extension)
}

/// Pretty JSON array of the credentials, envelopes included
pub fn service_keys_json(credentials: &[Credential]) -> VaultResult<String> {
    let entries: Vec<ServiceKeyEntry> = credentials.iter().map(ServiceKeyEntry::from).collect();
    serde_json::to_string_pretty(&entries).map_err(|e| VaultError::Export(e.to_string()))
}

/// CSV listing without secrets; every cell is quoted
pub fn service_keys_csv(credentials: &[Credential]) -> VaultResult<String> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(CSV_HEADERS)
        .map_err(|e| VaultError::Export(e.to_string()))?;

    for credential in credentials {
        writer
            .write_record([
                credential.service_name.clone(),
                credential.email_username.clone(),
                credential.notes.replace(',', ";"),
                credential.tags.join("|"),
                credential.created_at.format("%Y-%m-%d").to_string(),
                credential.updated_at.format("%Y-%m-%d").to_string(),
            ])
            .map_err(|e| VaultError::Export(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| VaultError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| VaultError::Export(e.to_string()))
}

/// Parse a per-service JSON file
pub fn parse_service_json(contents: &str) -> VaultResult<Vec<ServiceKeyEntry>> {
    serde_json::from_str(contents).map_err(|e| {
        VaultError::Import(format!(
            "Failed to parse file. Please ensure it is a valid JSON file: {}",
            e
        ))
    })
}

/// Insert entries as new credentials of `service`
///
/// Each row gets a fresh id and the current user as owner; the service label
/// in the file is ignored. Returns the number of rows inserted.
pub async fn import_service_entries<B: Backend>(
    backend: &B,
    service: &str,
    entries: &[ServiceKeyEntry],
) -> VaultResult<usize> {
    let user = require_user(backend).await?;

    let mut rows = Vec::with_capacity(entries.len());
    for entry in entries {
        let mut credential = Credential::new(user.clone(), service, entry.encrypted_api_key.clone());
        credential.email_username = entry.email_username.clone().unwrap_or_default();
        credential.encrypted_password = entry.encrypted_password.clone().unwrap_or_default();
        credential.notes = entry.notes.clone().unwrap_or_default();
        credential.tags = entry.tags.clone().unwrap_or_default();
        credential
            .validate()
            .map_err(|e| VaultError::Validation(e.to_string()))?;
        rows.push(credential);
    }

    if rows.is_empty() {
        return Ok(0);
    }

    backend.insert(&rows).await?;
    info!(service, rows = rows.len(), "imported service credentials");
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VaultPaths;
    use crate::crypto::MemorySessionStore;
    use crate::models::UserId;
    use crate::storage::{Filter, JsonBackend};
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn credential() -> Credential {
        let mut c = Credential::new(UserId::new("alice"), "OpenAI", "ZW52");
        c.email_username = "dev@example.com".into();
        c.notes = "prod, billing".into();
        c.tags = vec!["prod".into(), "team".into()];
        c.created_at = Utc.with_ymd_and_hms(2024, 2, 3, 10, 0, 0).unwrap();
        c.updated_at = Utc.with_ymd_and_hms(2024, 2, 4, 10, 0, 0).unwrap();
        c
    }

    #[test]
    fn test_filename_slug() {
        let now = Utc.with_ymd_and_hms(2024, 2, 3, 0, 0, 0).unwrap();
        assert_eq!(
            service_export_filename("Google  Cloud AI", "csv", now),
            "google-cloud-ai-keys-2024-02-03.csv"
        );
    }

    #[test]
    fn test_csv_layout() {
        let csv = service_keys_csv(&[credential()]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            r#""Service Name","Email/Username","Notes","Tags","Created At","Updated At""#
        );
        assert_eq!(
            lines[1],
            r#""OpenAI","dev@example.com","prod; billing","prod|team","2024-02-03","2024-02-04""#
        );
        assert!(!csv.contains("ZW52"));
    }

    #[test]
    fn test_json_keeps_envelopes_without_ids() {
        let json = service_keys_json(&[credential()]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let entry = &value[0];
        assert_eq!(entry["encrypted_api_key"], "ZW52");
        assert!(entry.get("id").is_none());
        assert!(entry.get("user_id").is_none());
    }

    #[tokio::test]
    async fn test_import_forces_service_and_owner() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());
        let backend = JsonBackend::open(paths, MemorySessionStore::new()).unwrap();
        backend.sign_in(&UserId::new("bob")).unwrap();

        let json = service_keys_json(&[credential(), credential()]).unwrap();
        let entries = parse_service_json(&json).unwrap();
        let count = import_service_entries(&backend, "Anthropic", &entries)
            .await
            .unwrap();
        assert_eq!(count, 2);

        let rows: Vec<Credential> = backend.select(&Filter::all(), None).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.service_name == "Anthropic"));
        assert!(rows.iter().all(|r| r.user_id.as_str() == "bob"));
        assert_ne!(rows[0].id, rows[1].id);
    }

    #[test]
    fn test_parse_rejects_non_array() {
        assert!(parse_service_json("{\"a\": 1}").is_err());
    }
}
