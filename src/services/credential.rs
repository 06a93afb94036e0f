//! Credential service
//!
//! Create, update, delete and list stored credentials. Secrets arrive as
//! plaintext, are encrypted here, and only envelopes reach the backend.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::Vault;
use crate::audit::{AuditEntry, EntityType};
use crate::crypto::{DecryptionError, SecureString, SessionStore};
use crate::error::{VaultError, VaultResult};
use crate::models::{Credential, CredentialId};
use crate::storage::{Backend, Filter, Order};

/// Plaintext input for a new credential
#[derive(Debug, Clone, Default)]
pub struct NewCredential {
    pub service_name: String,
    pub email_username: String,
    /// Empty means no password
    pub password: String,
    pub api_key: String,
    pub notes: String,
    pub tags: Vec<String>,
}

/// Fields to change on an existing credential; `None` keeps the current value
#[derive(Debug, Clone, Default)]
pub struct CredentialUpdate {
    pub service_name: Option<String>,
    pub email_username: Option<String>,
    /// `Some("")` removes the password
    pub password: Option<String>,
    pub api_key: Option<String>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// One row of a bulk insert
#[derive(Debug, Clone, Default)]
pub struct MassAddRow {
    pub email_username: String,
    pub password: String,
    pub api_key: String,
    pub notes: String,
}

/// Decrypted secrets of a credential
#[derive(Debug)]
pub struct RevealedCredential {
    pub api_key: Result<SecureString, DecryptionError>,
    /// `None` when no password is stored
    pub password: Option<Result<SecureString, DecryptionError>>,
}

/// Credentials grouped by service label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSummary {
    pub service_name: String,
    pub key_count: usize,
    pub last_updated: DateTime<Utc>,
}

/// Service for credential management
pub struct CredentialService<'a, B, S: SessionStore> {
    vault: &'a Vault<B, S>,
}

impl<'a, B: Backend, S: SessionStore> CredentialService<'a, B, S> {
    /// Create a new credential service
    pub fn new(vault: &'a Vault<B, S>) -> Self {
        Self { vault }
    }

    /// Encrypt and store a new credential
    pub async fn create(&self, input: NewCredential) -> VaultResult<Credential> {
        let user = self.vault.current_user().await?;
        if input.api_key.trim().is_empty() {
            return Err(VaultError::Validation("API key cannot be empty".into()));
        }

        let crypto = self.vault.crypto();
        let mut credential = Credential::new(
            user,
            input.service_name.trim(),
            crypto.encrypt(input.api_key.trim())?,
        );
        credential.email_username = input.email_username.trim().to_string();
        credential.encrypted_password = crypto.encrypt(input.password.trim())?;
        credential.notes = input.notes.trim().to_string();
        credential.tags = normalize_tags(input.tags);

        credential
            .validate()
            .map_err(|e| VaultError::Validation(e.to_string()))?;

        self.vault.backend().insert(&[credential.clone()]).await?;

        self.vault.log_create(
            EntityType::Credential,
            credential.id.to_string(),
            Some(credential.service_name.clone()),
            &credential,
        );

        Ok(credential)
    }

    /// Insert many credentials for one service with a single backend call
    ///
    /// Rows without a secret are skipped. At least one row must remain.
    pub async fn mass_add(&self, service_name: &str, rows: Vec<MassAddRow>) -> VaultResult<Vec<Credential>> {
        let user = self.vault.current_user().await?;
        let service_name = service_name.trim();
        let crypto = self.vault.crypto();

        let mut credentials = Vec::new();
        for row in rows.iter().filter(|r| !r.api_key.trim().is_empty()) {
            let mut credential = Credential::new(
                user.clone(),
                service_name,
                crypto.encrypt(row.api_key.trim())?,
            );
            credential.email_username = row.email_username.trim().to_string();
            credential.encrypted_password = crypto.encrypt(row.password.trim())?;
            credential.notes = row.notes.trim().to_string();
            credential
                .validate()
                .map_err(|e| VaultError::Validation(e.to_string()))?;
            credentials.push(credential);
        }

        if credentials.is_empty() {
            return Err(VaultError::Validation(
                "Please add at least one API key".into(),
            ));
        }

        self.vault.backend().insert(&credentials).await?;
        debug!(service = service_name, count = credentials.len(), "mass add");

        let entries: Vec<_> = credentials
            .iter()
            .map(|c| {
                AuditEntry::create(
                    EntityType::Credential,
                    c.id.to_string(),
                    Some(c.service_name.clone()),
                    c,
                )
            })
            .collect();
        self.vault.log_batch(&entries);

        Ok(credentials)
    }

    /// Get a credential by id
    pub async fn get(&self, id: CredentialId) -> VaultResult<Option<Credential>> {
        let mut rows: Vec<Credential> = self
            .vault
            .backend()
            .select(&Filter::id(*id.as_uuid()), None)
            .await?;
        Ok(rows.pop())
    }

    /// Find a credential by full id or by the short form shown in listings
    pub async fn find(&self, identifier: &str) -> VaultResult<Option<Credential>> {
        if let Ok(id) = CredentialId::parse(identifier) {
            return self.get(id).await;
        }

        let prefix = identifier
            .strip_prefix("key-")
            .unwrap_or(identifier)
            .to_lowercase();
        if prefix.is_empty() {
            return Ok(None);
        }

        let mut matches: Vec<Credential> = self
            .list(None)
            .await?
            .into_iter()
            .filter(|c| c.id.as_uuid().to_string().starts_with(&prefix))
            .collect();

        match matches.len() {
            0 | 1 => Ok(matches.pop()),
            n => Err(VaultError::Validation(format!(
                "'{}' matches {} credentials, use a longer id",
                identifier, n
            ))),
        }
    }

    /// Find a credential or fail with not found
    pub async fn require(&self, identifier: &str) -> VaultResult<Credential> {
        self.find(identifier)
            .await?
            .ok_or_else(|| VaultError::credential_not_found(identifier))
    }

    /// List credentials, newest first, optionally for one service
    pub async fn list(&self, service_name: Option<&str>) -> VaultResult<Vec<Credential>> {
        let filter = match service_name {
            Some(service) => Filter::all().eq("service_name", service),
            None => Filter::all(),
        };
        self.vault
            .backend()
            .select(&filter, Some(&Order::desc("created_at")))
            .await
    }

    /// Apply changes, re-encrypting any secret that was replaced
    pub async fn update(&self, id: CredentialId, changes: CredentialUpdate) -> VaultResult<Credential> {
        let before = self
            .get(id)
            .await?
            .ok_or_else(|| VaultError::credential_not_found(id.to_string()))?;

        let crypto = self.vault.crypto();
        let mut credential = before.clone();

        if let Some(service_name) = changes.service_name {
            credential.service_name = service_name.trim().to_string();
        }
        if let Some(email_username) = changes.email_username {
            credential.email_username = email_username.trim().to_string();
        }
        if let Some(password) = changes.password {
            credential.encrypted_password = crypto.encrypt(password.trim())?;
        }
        if let Some(api_key) = changes.api_key {
            if api_key.trim().is_empty() {
                return Err(VaultError::Validation("API key cannot be empty".into()));
            }
            credential.encrypted_api_key = crypto.encrypt(api_key.trim())?;
        }
        if let Some(notes) = changes.notes {
            credential.notes = notes.trim().to_string();
        }
        if let Some(tags) = changes.tags {
            credential.tags = normalize_tags(tags);
        }
        credential.updated_at = Utc::now();

        credential
            .validate()
            .map_err(|e| VaultError::Validation(e.to_string()))?;

        if !self.vault.backend().update(&credential).await? {
            return Err(VaultError::credential_not_found(id.to_string()));
        }

        self.vault.log_update(
            EntityType::Credential,
            credential.id.to_string(),
            Some(credential.service_name.clone()),
            &before,
            &credential,
        );

        Ok(credential)
    }

    /// Delete a credential by id
    pub async fn delete(&self, id: CredentialId) -> VaultResult<Credential> {
        let credential = self
            .get(id)
            .await?
            .ok_or_else(|| VaultError::credential_not_found(id.to_string()))?;

        self.vault
            .backend()
            .delete::<Credential>(&Filter::id(*id.as_uuid()))
            .await?;

        self.vault.log_delete(
            EntityType::Credential,
            credential.id.to_string(),
            Some(credential.service_name.clone()),
            &credential,
        );

        Ok(credential)
    }

    /// Decrypt a credential's secrets
    pub fn reveal(&self, credential: &Credential) -> RevealedCredential {
        let crypto = self.vault.crypto();
        RevealedCredential {
            api_key: crypto.decrypt(&credential.encrypted_api_key),
            password: credential
                .has_password()
                .then(|| crypto.decrypt(&credential.encrypted_password)),
        }
    }

    /// Per-service counts and last modification, sorted by service label
    pub async fn service_overview(&self) -> VaultResult<Vec<ServiceSummary>> {
        let mut by_service: BTreeMap<String, ServiceSummary> = BTreeMap::new();

        for credential in self.list(None).await? {
            by_service
                .entry(credential.service_name.clone())
                .and_modify(|s| {
                    s.key_count += 1;
                    s.last_updated = s.last_updated.max(credential.updated_at);
                })
                .or_insert_with(|| ServiceSummary {
                    service_name: credential.service_name.clone(),
                    key_count: 1,
                    last_updated: credential.updated_at,
                });
        }

        Ok(by_service.into_values().collect())
    }
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}
