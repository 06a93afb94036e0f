//! Service layer for api-vault
//!
//! Services sit between the CLI and the backend: they validate input,
//! encrypt secrets through the session's [`EncryptionContext`], and write
//! audit entries for every mutation.

pub mod credential;
pub mod note;
pub mod resource;

pub use credential::{
    CredentialService, CredentialUpdate, MassAddRow, NewCredential, RevealedCredential,
    ServiceSummary,
};
pub use note::NoteService;
pub use resource::ResourceService;

use serde::Serialize;
use tracing::warn;

use crate::audit::{AuditEntry, AuditLogger, EntityType, Operation};
use crate::crypto::{EncryptionContext, SessionStore};
use crate::error::VaultResult;
use crate::models::UserId;
use crate::storage::{require_user, Authenticator, Backend};

/// A backend plus the session's encryption context and audit log
pub struct Vault<B, S: SessionStore> {
    backend: B,
    crypto: EncryptionContext<S>,
    audit: Option<AuditLogger>,
}

impl<B: Backend, S: SessionStore> Vault<B, S> {
    /// Create a vault without audit logging
    pub fn new(backend: B, crypto: EncryptionContext<S>) -> Self {
        Self {
            backend,
            crypto,
            audit: None,
        }
    }

    /// Append every mutation to `logger`
    pub fn with_audit(mut self, logger: AuditLogger) -> Self {
        self.audit = Some(logger);
        self
    }

    /// The persistence collaborator
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The session's encryption context
    pub fn crypto(&self) -> &EncryptionContext<S> {
        &self.crypto
    }

    /// The signed-in user
    pub async fn current_user(&self) -> VaultResult<UserId> {
        require_user(&self.backend).await
    }

    /// Credential operations
    pub fn credentials(&self) -> CredentialService<'_, B, S> {
        CredentialService::new(self)
    }

    /// Service note operations
    pub fn notes(&self) -> NoteService<'_, B, S> {
        NoteService::new(self)
    }

    /// Resource organizer operations
    pub fn resources(&self) -> ResourceService<'_, B, S> {
        ResourceService::new(self)
    }

    /// Log a create operation
    pub fn log_create<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) {
        self.log(AuditEntry::create(entity_type, entity_id, entity_name, entity))
    }

    /// Log an update operation
    pub fn log_update<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
    ) {
        self.log(AuditEntry::update(
            entity_type,
            entity_id,
            entity_name,
            before,
            after,
        ))
    }

    /// Log a delete operation
    pub fn log_delete<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) {
        self.log(AuditEntry::delete(entity_type, entity_id, entity_name, entity))
    }

    /// Log an export, import or clear of the user's dataset
    pub fn log_dataset(
        &self,
        operation: Operation,
        user: &UserId,
        label: Option<String>,
        summary: impl Into<String>,
    ) {
        self.log(AuditEntry::dataset(
            operation,
            user.as_str(),
            label,
            summary,
        ))
    }

    /// Log several entries with one write
    ///
    /// The audited change has already been committed, so a failed write is
    /// reported as a warning instead of failing the operation.
    pub fn log_batch(&self, entries: &[AuditEntry]) {
        if let Some(logger) = &self.audit {
            if let Err(e) = logger.log_batch(entries) {
                warn!(error = %e, entries = entries.len(), "failed to write audit log");
            }
        }
    }

    fn log(&self, entry: AuditEntry) {
        self.log_batch(std::slice::from_ref(&entry))
    }
}

impl<B: Backend + Authenticator, S: SessionStore> Vault<B, S> {
    /// Sign in as `user`
    pub fn sign_in(&self, user: &UserId) -> VaultResult<()> {
        self.backend.sign_in(user)
    }

    /// End the session: forget the user and discard the session key
    ///
    /// Anything encrypted during the session becomes undecryptable.
    pub fn sign_out(&self) -> VaultResult<()> {
        if let Err(e) = self.crypto.clear_session_key() {
            warn!(error = %e, "failed to clear session key on sign-out");
            return Err(e);
        }
        self.backend.sign_out()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::vault;
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_sign_out_clears_key_and_user() {
        let temp_dir = TempDir::new().unwrap();
        let vault = vault(&temp_dir, "alice");

        let envelope = vault.crypto().encrypt("sk-live").unwrap();
        assert!(vault.crypto().has_session_key().unwrap());

        vault.sign_out().unwrap();
        assert!(!vault.crypto().has_session_key().unwrap());
        assert!(vault.current_user().await.unwrap_err().is_not_authenticated());

        vault.sign_in(&UserId::new("alice")).unwrap();
        assert!(vault.crypto().decrypt(&envelope).is_err());
    }
}
