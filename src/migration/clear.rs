//! Deleting every row the signed-in user owns

use tracing::info;

use super::document::DataStats;
use crate::error::VaultResult;
use crate::models::{Credential, Resource, ResourceCategory, ServiceNote, UserId};
use crate::storage::{require_user, Backend, Filter, Table};

/// Delete all four collections, children before parents
///
/// Returns the number of rows removed per collection.
pub async fn clear_all_data<B, P>(backend: &B, mut on_progress: P) -> VaultResult<DataStats>
where
    B: Backend,
    P: FnMut(&str, u8),
{
    let user = require_user(backend).await?;

    let removed = delete_owned(backend, &user, |table| match table {
        Table::Resources => on_progress("Deleting Resources...", 25),
        Table::ResourceCategories => on_progress("Deleting Resource Categories...", 50),
        Table::ServiceNotes => on_progress("Deleting Service Notes...", 75),
        Table::ApiKeys => on_progress("Deleting API Keys...", 90),
    })
    .await?;

    on_progress("All Data Cleared!", 100);
    Ok(removed)
}

/// Delete everything `user` owns; `after` runs once each table is empty
pub(crate) async fn delete_owned<B, F>(
    backend: &B,
    user: &UserId,
    mut after: F,
) -> VaultResult<DataStats>
where
    B: Backend,
    F: FnMut(Table),
{
    let scope = Filter::owner(user);

    let resources = backend.delete::<Resource>(&scope).await?;
    info!(rows = resources, "cleared resources");
    after(Table::Resources);

    let categories = backend.delete::<ResourceCategory>(&scope).await?;
    info!(rows = categories, "cleared resource_categories");
    after(Table::ResourceCategories);

    let service_notes = backend.delete::<ServiceNote>(&scope).await?;
    info!(rows = service_notes, "cleared service_notes");
    after(Table::ServiceNotes);

    let api_keys = backend.delete::<Credential>(&scope).await?;
    info!(rows = api_keys, "cleared api_keys");
    after(Table::ApiKeys);

    Ok(DataStats {
        api_keys,
        service_notes,
        categories,
        resources,
        total: api_keys + service_notes + categories + resources,
    })
}
