//! Export of the signed-in user's data

use tracing::info;

use super::document::{ExportData, ExportDocument};
use crate::error::VaultResult;
use crate::models::{Credential, Resource, ResourceCategory, ServiceNote, UserId};
use crate::storage::{require_user, Backend, Filter, Order};

/// Fetch all four collections into a document
///
/// The first failed fetch aborts the export; no partial document is returned.
pub async fn export_all_data<B, P>(backend: &B, mut on_progress: P) -> VaultResult<ExportDocument>
where
    B: Backend,
    P: FnMut(&str, u8),
{
    let user = require_user(backend).await?;
    let data = fetch_collections(backend, &user, &mut on_progress).await?;
    on_progress("Export Complete!", 100);

    Ok(ExportDocument::new(user, data))
}

/// Read every row `user` owns, oldest first
pub(crate) async fn fetch_collections<B, P>(
    backend: &B,
    user: &UserId,
    on_progress: &mut P,
) -> VaultResult<ExportData>
where
    B: Backend,
    P: FnMut(&str, u8),
{
    let scope = Filter::owner(user);
    let order = Order::asc("created_at");

    let api_keys: Vec<Credential> = backend.select(&scope, Some(&order)).await?;
    info!(rows = api_keys.len(), "exported api_keys");
    on_progress("Exporting API Keys...", 25);

    let service_notes: Vec<ServiceNote> = backend.select(&scope, Some(&order)).await?;
    info!(rows = service_notes.len(), "exported service_notes");
    on_progress("Exporting Service Notes...", 50);

    let resource_categories: Vec<ResourceCategory> = backend.select(&scope, Some(&order)).await?;
    info!(rows = resource_categories.len(), "exported resource_categories");
    on_progress("Exporting Resource Categories...", 75);

    let resources: Vec<Resource> = backend.select(&scope, Some(&order)).await?;
    info!(rows = resources.len(), "exported resources");
    on_progress("Exporting Resources...", 90);

    Ok(ExportData {
        api_keys,
        service_notes,
        resource_categories,
        resources,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VaultPaths;
    use crate::crypto::MemorySessionStore;
    use crate::error::VaultError;
    use crate::storage::JsonBackend;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_export_requires_user() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());
        let backend = JsonBackend::open(paths, MemorySessionStore::new()).unwrap();

        let result = export_all_data(&backend, |_: &str, _: u8| {}).await;
        assert!(matches!(result, Err(VaultError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_export_progress_checkpoints() {
        let temp_dir = TempDir::new().unwrap();
        let paths = VaultPaths::with_base_dir(temp_dir.path().to_path_buf());
        let backend = JsonBackend::open(paths, MemorySessionStore::new()).unwrap();
        let user = UserId::new("alice");
        backend.sign_in(&user).unwrap();
        backend
            .insert(&[Credential::new(user.clone(), "OpenAI", "ZW52")])
            .await
            .unwrap();

        let mut steps = Vec::new();
        let doc = export_all_data(&backend, |step: &str, percent: u8| {
            steps.push((step.to_string(), percent))
        })
        .await
        .unwrap();

        let percents: Vec<u8> = steps.iter().map(|(_, p)| *p).collect();
        assert_eq!(percents, [25, 50, 75, 90, 100]);
        assert_eq!(steps[4].0, "Export Complete!");
        assert_eq!(doc.user_id, user);
        assert_eq!(doc.stats().api_keys, 1);
        assert_eq!(doc.version, "1.0");
    }
}
