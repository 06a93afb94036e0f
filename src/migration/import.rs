//! Import of an export document into the signed-in user's account

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::clear::delete_owned;
use super::document::{DataStats, ExportData, ExportDocument};
use super::export::fetch_collections;
use crate::error::{VaultError, VaultResult};
use crate::models::{NoteId, UserId};
use crate::storage::{require_user, Backend, Record};

/// How an import treats data already in the account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    /// Upsert by id, keep everything else
    #[default]
    Merge,
    /// Delete the account's data first
    Replace,
}

impl fmt::Display for ImportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportMode::Merge => write!(f, "merge"),
            ImportMode::Replace => write!(f, "replace"),
        }
    }
}

impl FromStr for ImportMode {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "merge" => Ok(ImportMode::Merge),
            "replace" => Ok(ImportMode::Replace),
            other => Err(VaultError::Validation(format!(
                "Unknown import mode '{}', expected merge or replace",
                other
            ))),
        }
    }
}

/// Apply `document` to the signed-in user's account
///
/// The document is checked before anything is written. Rows keep their ids
/// and are re-owned by the current user. Collections are written parents
/// first; if any write fails the account is restored to its prior rows and
/// the first error is returned.
pub async fn import_all_data<B, P>(
    backend: &B,
    document: &ExportDocument,
    mode: ImportMode,
    mut on_progress: P,
) -> VaultResult<DataStats>
where
    B: Backend,
    P: FnMut(&str, u8),
{
    let user = require_user(backend).await?;
    let snapshot = fetch_collections(backend, &user, &mut |_: &str, _: u8| {}).await?;

    match mode {
        ImportMode::Replace => document.validate()?,
        ImportMode::Merge => {
            document.check_version()?;
            let mut known = document.category_ids();
            known.extend(snapshot.resource_categories.iter().map(|c| c.id));
            document.check_resource_categories(&known)?;
        }
    }

    let rows = owned_rows(document, &user, mode, &snapshot);

    match apply(backend, &user, &rows, mode, &mut on_progress).await {
        Ok(()) => {
            on_progress("Import Complete!", 100);
            let stats = document.stats();
            info!(%mode, total = stats.total, "import complete");
            Ok(stats)
        }
        Err(e) => {
            warn!(%mode, error = %e, "import failed, restoring previous data");
            if let Err(restore_error) = restore(backend, &user, &snapshot).await {
                error!(error = %restore_error, "failed to restore data after import failure");
            }
            Err(e)
        }
    }
}

/// The document's rows, re-owned by `user`
///
/// In merge mode a note for a service the account already has a note for
/// takes over the existing note's id, so the per-service note stays unique.
fn owned_rows(
    document: &ExportDocument,
    user: &UserId,
    mode: ImportMode,
    snapshot: &ExportData,
) -> ExportData {
    let mut rows = document.data.clone();

    rows.api_keys.iter_mut().for_each(|r| r.set_owner(user.clone()));
    rows.service_notes
        .iter_mut()
        .for_each(|r| r.set_owner(user.clone()));
    rows.resource_categories
        .iter_mut()
        .for_each(|r| r.set_owner(user.clone()));
    rows.resources.iter_mut().for_each(|r| r.set_owner(user.clone()));

    if mode == ImportMode::Merge {
        let existing: HashMap<&str, NoteId> = snapshot
            .service_notes
            .iter()
            .map(|n| (n.service_name.as_str(), n.id))
            .collect();
        for note in &mut rows.service_notes {
            if let Some(id) = existing.get(note.service_name.as_str()) {
                note.id = *id;
            }
        }
    }

    rows
}

async fn apply<B, P>(
    backend: &B,
    user: &UserId,
    rows: &ExportData,
    mode: ImportMode,
    on_progress: &mut P,
) -> VaultResult<()>
where
    B: Backend,
    P: FnMut(&str, u8),
{
    if mode == ImportMode::Replace {
        let removed = delete_owned(backend, user, |_| {}).await?;
        info!(rows = removed.total, "cleared existing data");
        on_progress("Clearing existing data...", 10);
    }

    upsert_nonempty(backend, &rows.api_keys).await?;
    on_progress("Importing API Keys...", 30);

    upsert_nonempty(backend, &rows.service_notes).await?;
    on_progress("Importing Service Notes...", 50);

    upsert_nonempty(backend, &rows.resource_categories).await?;
    on_progress("Importing Resource Categories...", 70);

    upsert_nonempty(backend, &rows.resources).await?;
    on_progress("Importing Resources...", 90);

    Ok(())
}

async fn upsert_nonempty<B: Backend, R: Record>(backend: &B, rows: &[R]) -> VaultResult<()> {
    if rows.is_empty() {
        return Ok(());
    }
    backend.upsert(rows).await?;
    info!(table = R::TABLE.name(), rows = rows.len(), "imported collection");
    Ok(())
}

/// Put the account back to exactly `snapshot`
async fn restore<B: Backend>(backend: &B, user: &UserId, snapshot: &ExportData) -> VaultResult<()> {
    delete_owned(backend, user, |_| {}).await?;
    upsert_nonempty(backend, &snapshot.api_keys).await?;
    upsert_nonempty(backend, &snapshot.service_notes).await?;
    upsert_nonempty(backend, &snapshot.resource_categories).await?;
    upsert_nonempty(backend, &snapshot.resources).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VaultPaths;
    use crate::crypto::MemorySessionStore;
    use crate::models::{Credential, Resource, ResourceCategory, ServiceNote};
    use crate::storage::{Filter, JsonBackend};
    use tempfile::TempDir;

    fn backend(temp_dir: &TempDir, user: &UserId) -> JsonBackend<MemorySessionStore> {
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());
        let backend = JsonBackend::open(paths, MemorySessionStore::new()).unwrap();
        backend.sign_in(user).unwrap();
        backend
    }

    fn document_for(owner: &UserId) -> ExportDocument {
        let category = ResourceCategory::new(owner.clone(), "Docs");
        ExportDocument::new(
            owner.clone(),
            ExportData {
                api_keys: vec![Credential::new(owner.clone(), "OpenAI", "ZW52")],
                service_notes: vec![ServiceNote::new(owner.clone(), "OpenAI", "# notes")],
                resources: vec![Resource::new(
                    owner.clone(),
                    category.id,
                    "Book",
                    "https://example.com",
                )],
                resource_categories: vec![category],
            },
        )
    }

    #[test]
    fn test_import_mode_parse() {
        assert_eq!("merge".parse::<ImportMode>().unwrap(), ImportMode::Merge);
        assert_eq!("Replace".parse::<ImportMode>().unwrap(), ImportMode::Replace);
        assert!("append".parse::<ImportMode>().is_err());
        assert_eq!(ImportMode::default(), ImportMode::Merge);
        assert_eq!(ImportMode::Replace.to_string(), "replace");
    }

    #[tokio::test]
    async fn test_import_progress_checkpoints() {
        let temp_dir = TempDir::new().unwrap();
        let user = UserId::new("alice");
        let backend = backend(&temp_dir, &user);

        let mut percents = Vec::new();
        import_all_data(
            &backend,
            &document_for(&user),
            ImportMode::Replace,
            |_: &str, p: u8| percents.push(p),
        )
        .await
        .unwrap();
        assert_eq!(percents, [10, 30, 50, 70, 90, 100]);

        let mut percents = Vec::new();
        import_all_data(
            &backend,
            &document_for(&user),
            ImportMode::Merge,
            |_: &str, p: u8| percents.push(p),
        )
        .await
        .unwrap();
        assert_eq!(percents, [30, 50, 70, 90, 100]);
    }

    #[tokio::test]
    async fn test_merge_reuses_existing_note_id() {
        let temp_dir = TempDir::new().unwrap();
        let user = UserId::new("alice");
        let backend = backend(&temp_dir, &user);

        let existing = ServiceNote::new(user.clone(), "OpenAI", "# old");
        backend.insert(&[existing.clone()]).await.unwrap();

        import_all_data(&backend, &document_for(&user), ImportMode::Merge, |_: &str, _: u8| {})
            .await
            .unwrap();

        let notes: Vec<ServiceNote> = backend.select(&Filter::all(), None).await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, existing.id);
        assert_eq!(notes[0].markdown_content, "# notes");
    }

    #[tokio::test]
    async fn test_merge_accepts_resource_in_existing_category() {
        let temp_dir = TempDir::new().unwrap();
        let user = UserId::new("alice");
        let backend = backend(&temp_dir, &user);

        let category = ResourceCategory::new(user.clone(), "Existing");
        backend.insert(&[category.clone()]).await.unwrap();

        let doc = ExportDocument::new(
            user.clone(),
            ExportData {
                resources: vec![Resource::new(user.clone(), category.id, "x", "https://x.dev")],
                ..ExportData::default()
            },
        );

        import_all_data(&backend, &doc, ImportMode::Merge, |_: &str, _: u8| {})
            .await
            .unwrap();
        let err = import_all_data(&backend, &doc, ImportMode::Replace, |_: &str, _: u8| {})
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::InvalidFormat(_)));

        // Rejected before any mutation
        let resources: Vec<Resource> = backend.select(&Filter::all(), None).await.unwrap();
        assert_eq!(resources.len(), 1);
    }
}
