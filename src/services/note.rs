//! Service note operations
//!
//! One markdown document per service label. Saving creates the note the
//! first time and updates it afterwards.

use super::Vault;
use crate::audit::EntityType;
use crate::crypto::SessionStore;
use crate::error::{VaultError, VaultResult};
use crate::models::ServiceNote;
use crate::storage::{Backend, Filter, Order};

/// Service for per-service notes
pub struct NoteService<'a, B, S: SessionStore> {
    vault: &'a Vault<B, S>,
}

impl<'a, B: Backend, S: SessionStore> NoteService<'a, B, S> {
    /// Create a new note service
    pub fn new(vault: &'a Vault<B, S>) -> Self {
        Self { vault }
    }

    /// The note for a service, if one was saved
    pub async fn get(&self, service_name: &str) -> VaultResult<Option<ServiceNote>> {
        let mut rows: Vec<ServiceNote> = self
            .vault
            .backend()
            .select(&Filter::all().eq("service_name", service_name.trim()), None)
            .await?;
        Ok(rows.pop())
    }

    /// All notes, ordered by service label
    pub async fn list(&self) -> VaultResult<Vec<ServiceNote>> {
        self.vault
            .backend()
            .select(&Filter::all(), Some(&Order::asc("service_name")))
            .await
    }

    /// Create or replace the note for a service
    pub async fn save(&self, service_name: &str, content: &str) -> VaultResult<ServiceNote> {
        let service_name = service_name.trim();
        if service_name.is_empty() {
            return Err(VaultError::Validation("Service name cannot be empty".into()));
        }

        match self.get(service_name).await? {
            Some(before) => {
                let mut note = before.clone();
                note.set_content(content);
                if !self.vault.backend().update(&note).await? {
                    return Err(VaultError::NotFound {
                        entity_type: "Service note",
                        identifier: service_name.to_string(),
                    });
                }
                self.vault.log_update(
                    EntityType::ServiceNote,
                    note.id.to_string(),
                    Some(note.service_name.clone()),
                    &before,
                    &note,
                );
                Ok(note)
            }
            None => {
                let user = self.vault.current_user().await?;
                let note = ServiceNote::new(user, service_name, content);
                self.vault.backend().insert(&[note.clone()]).await?;
                self.vault.log_create(
                    EntityType::ServiceNote,
                    note.id.to_string(),
                    Some(note.service_name.clone()),
                    &note,
                );
                Ok(note)
            }
        }
    }

    /// Delete the note for a service
    pub async fn delete(&self, service_name: &str) -> VaultResult<ServiceNote> {
        let note = self.get(service_name).await?.ok_or_else(|| VaultError::NotFound {
            entity_type: "Service note",
            identifier: service_name.to_string(),
        })?;

        self.vault
            .backend()
            .delete::<ServiceNote>(&Filter::id(*note.id.as_uuid()))
            .await?;

        self.vault.log_delete(
            EntityType::ServiceNote,
            note.id.to_string(),
            Some(note.service_name.clone()),
            &note,
        );

        Ok(note)
    }
}

#[cfg(test)]
mod tests {
    use crate::services::testing::vault;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_creates_then_updates() {
        let temp_dir = TempDir::new().unwrap();
        let vault = vault(&temp_dir, "alice");
        let notes = vault.notes();

        assert!(notes.get("Stripe").await.unwrap().is_none());

        let first = notes.save("Stripe", "# Keys").await.unwrap();
        let second = notes.save(" Stripe ", "# Rotated").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(notes.list().await.unwrap().len(), 1);
        assert_eq!(
            notes.get("Stripe").await.unwrap().unwrap().markdown_content,
            "# Rotated"
        );
    }

    #[tokio::test]
    async fn test_notes_are_per_user() {
        let temp_dir = TempDir::new().unwrap();
        let vault = vault(&temp_dir, "alice");
        vault.notes().save("Stripe", "alice's").await.unwrap();

        vault.sign_in(&"bob".into()).unwrap();
        assert!(vault.notes().get("Stripe").await.unwrap().is_none());
        vault.notes().save("Stripe", "bob's").await.unwrap();
        assert_eq!(vault.notes().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_note() {
        let temp_dir = TempDir::new().unwrap();
        let vault = vault(&temp_dir, "alice");
        let err = vault.notes().delete("Nope").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
