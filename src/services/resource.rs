//! Resource organizer operations
//!
//! Categories and the links filed under them.

use tracing::debug;

use super::Vault;
use crate::audit::{AuditEntry, EntityType};
use crate::crypto::SessionStore;
use crate::error::{VaultError, VaultResult};
use crate::models::{CategoryId, Resource, ResourceCategory, ResourceId};
use crate::storage::{Backend, Filter, Order};

/// Service for resource categories and resources
pub struct ResourceService<'a, B, S: SessionStore> {
    vault: &'a Vault<B, S>,
}

impl<'a, B: Backend, S: SessionStore> ResourceService<'a, B, S> {
    /// Create a new resource service
    pub fn new(vault: &'a Vault<B, S>) -> Self {
        Self { vault }
    }

    /// Create a category
    pub async fn create_category(&self, name: &str) -> VaultResult<ResourceCategory> {
        let user = self.vault.current_user().await?;
        let category = ResourceCategory::new(user, name.trim());
        category
            .validate()
            .map_err(|e| VaultError::Validation(e.to_string()))?;

        if self.find_category(&category.name).await?.is_some() {
            return Err(VaultError::Validation(format!(
                "Category '{}' already exists",
                category.name
            )));
        }

        self.vault.backend().insert(&[category.clone()]).await?;
        self.vault.log_create(
            EntityType::ResourceCategory,
            category.id.to_string(),
            Some(category.name.clone()),
            &category,
        );

        Ok(category)
    }

    /// All categories in creation order
    pub async fn list_categories(&self) -> VaultResult<Vec<ResourceCategory>> {
        self.vault
            .backend()
            .select(&Filter::all(), Some(&Order::asc("created_at")))
            .await
    }

    /// Get a category by id
    pub async fn get_category(&self, id: CategoryId) -> VaultResult<Option<ResourceCategory>> {
        let mut rows: Vec<ResourceCategory> = self
            .vault
            .backend()
            .select(&Filter::id(*id.as_uuid()), None)
            .await?;
        Ok(rows.pop())
    }

    /// Find a category by id, short id, or case-insensitive name
    pub async fn find_category(&self, identifier: &str) -> VaultResult<Option<ResourceCategory>> {
        if let Ok(id) = identifier.parse::<CategoryId>() {
            if let Some(category) = self.get_category(id).await? {
                return Ok(Some(category));
            }
        }

        let identifier = identifier.trim();
        let categories = self.list_categories().await?;
        let found = categories.into_iter().find(|c| {
            c.name.eq_ignore_ascii_case(identifier) || c.id.to_string() == identifier
        });
        Ok(found)
    }

    /// Find a category or fail with not found
    pub async fn require_category(&self, identifier: &str) -> VaultResult<ResourceCategory> {
        self.find_category(identifier)
            .await?
            .ok_or_else(|| VaultError::category_not_found(identifier))
    }

    /// Rename a category
    pub async fn rename_category(&self, id: CategoryId, name: &str) -> VaultResult<ResourceCategory> {
        let before = self
            .get_category(id)
            .await?
            .ok_or_else(|| VaultError::category_not_found(id.to_string()))?;

        let mut category = before.clone();
        category.name = name.trim().to_string();
        category
            .validate()
            .map_err(|e| VaultError::Validation(e.to_string()))?;

        if let Some(existing) = self.find_category(&category.name).await? {
            if existing.id != id {
                return Err(VaultError::Validation(format!(
                    "Category '{}' already exists",
                    category.name
                )));
            }
        }

        if !self.vault.backend().update(&category).await? {
            return Err(VaultError::category_not_found(id.to_string()));
        }

        self.vault.log_update(
            EntityType::ResourceCategory,
            category.id.to_string(),
            Some(category.name.clone()),
            &before,
            &category,
        );

        Ok(category)
    }

    /// Delete a category together with the resources filed under it
    ///
    /// Returns the category and the number of resources removed.
    pub async fn delete_category(&self, id: CategoryId) -> VaultResult<(ResourceCategory, usize)> {
        let category = self
            .get_category(id)
            .await?
            .ok_or_else(|| VaultError::category_not_found(id.to_string()))?;

        let resources = self.list_resources(Some(id)).await?;
        let removed = self
            .vault
            .backend()
            .delete::<Resource>(&Filter::all().eq("category_id", id))
            .await?;
        self.vault
            .backend()
            .delete::<ResourceCategory>(&Filter::id(*id.as_uuid()))
            .await?;
        debug!(category = %category.name, resources = removed, "deleted category");

        let mut entries: Vec<AuditEntry> = resources
            .iter()
            .map(|r| {
                AuditEntry::delete(EntityType::Resource, r.id.to_string(), Some(r.name.clone()), r)
            })
            .collect();
        entries.push(AuditEntry::delete(
            EntityType::ResourceCategory,
            category.id.to_string(),
            Some(category.name.clone()),
            &category,
        ));
        self.vault.log_batch(&entries);

        Ok((category, removed))
    }

    /// Add a resource to a category
    pub async fn add_resource(
        &self,
        category_id: CategoryId,
        name: &str,
        url: &str,
        description: &str,
    ) -> VaultResult<Resource> {
        let user = self.vault.current_user().await?;
        let mut resource = Resource::new(user, category_id, name.trim(), url.trim());
        resource.description = description.trim().to_string();
        resource
            .validate()
            .map_err(|e| VaultError::Validation(e.to_string()))?;

        self.vault.backend().insert(&[resource.clone()]).await?;
        self.vault.log_create(
            EntityType::Resource,
            resource.id.to_string(),
            Some(resource.name.clone()),
            &resource,
        );

        Ok(resource)
    }

    /// Resources in creation order, optionally for one category
    pub async fn list_resources(&self, category_id: Option<CategoryId>) -> VaultResult<Vec<Resource>> {
        let filter = match category_id {
            Some(id) => Filter::all().eq("category_id", id),
            None => Filter::all(),
        };
        self.vault
            .backend()
            .select(&filter, Some(&Order::asc("created_at")))
            .await
    }

    /// Get a resource by id
    pub async fn get_resource(&self, id: ResourceId) -> VaultResult<Option<Resource>> {
        let mut rows: Vec<Resource> = self
            .vault
            .backend()
            .select(&Filter::id(*id.as_uuid()), None)
            .await?;
        Ok(rows.pop())
    }

    /// Find a resource by full or short id
    pub async fn find_resource(&self, identifier: &str) -> VaultResult<Option<Resource>> {
        if let Ok(id) = identifier.parse::<ResourceId>() {
            if let Some(resource) = self.get_resource(id).await? {
                return Ok(Some(resource));
            }
        }
        let identifier = identifier.trim();
        Ok(self
            .list_resources(None)
            .await?
            .into_iter()
            .find(|r| r.id.to_string() == identifier))
    }

    /// Change a resource's fields; `None` keeps the current value
    pub async fn update_resource(
        &self,
        id: ResourceId,
        name: Option<&str>,
        url: Option<&str>,
        description: Option<&str>,
        category_id: Option<CategoryId>,
    ) -> VaultResult<Resource> {
        let before = self
            .get_resource(id)
            .await?
            .ok_or_else(|| VaultError::resource_not_found(id.to_string()))?;

        let mut resource = before.clone();
        if let Some(name) = name {
            resource.name = name.trim().to_string();
        }
        if let Some(url) = url {
            resource.url = url.trim().to_string();
        }
        if let Some(description) = description {
            resource.description = description.trim().to_string();
        }
        if let Some(category_id) = category_id {
            resource.category_id = category_id;
        }
        resource
            .validate()
            .map_err(|e| VaultError::Validation(e.to_string()))?;

        if !self.vault.backend().update(&resource).await? {
            return Err(VaultError::resource_not_found(id.to_string()));
        }

        self.vault.log_update(
            EntityType::Resource,
            resource.id.to_string(),
            Some(resource.name.clone()),
            &before,
            &resource,
        );

        Ok(resource)
    }

    /// Delete a resource
    pub async fn delete_resource(&self, id: ResourceId) -> VaultResult<Resource> {
        let resource = self
            .get_resource(id)
            .await?
            .ok_or_else(|| VaultError::resource_not_found(id.to_string()))?;

        self.vault
            .backend()
            .delete::<Resource>(&Filter::id(*id.as_uuid()))
            .await?;

        self.vault.log_delete(
            EntityType::Resource,
            resource.id.to_string(),
            Some(resource.name.clone()),
            &resource,
        );

        Ok(resource)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::VaultError;
    use crate::models::CategoryId;
    use crate::services::testing::vault;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_category_lifecycle() {
        let temp_dir = TempDir::new().unwrap();
        let vault = vault(&temp_dir, "alice");
        let resources = vault.resources();

        let docs = resources.create_category("Docs").await.unwrap();
        assert!(matches!(
            resources.create_category("docs").await,
            Err(VaultError::Validation(_))
        ));

        let renamed = resources.rename_category(docs.id, "Reference").await.unwrap();
        assert_eq!(renamed.name, "Reference");
        assert_eq!(
            resources.require_category("reference").await.unwrap().id,
            docs.id
        );
    }

    #[tokio::test]
    async fn test_delete_category_removes_its_resources() {
        let temp_dir = TempDir::new().unwrap();
        let vault = vault(&temp_dir, "alice");
        let resources = vault.resources();

        let docs = resources.create_category("Docs").await.unwrap();
        let tools = resources.create_category("Tools").await.unwrap();
        resources
            .add_resource(docs.id, "Rust book", "https://doc.rust-lang.org/book/", "")
            .await
            .unwrap();
        resources
            .add_resource(docs.id, "std", "https://doc.rust-lang.org/std/", "")
            .await
            .unwrap();
        resources
            .add_resource(tools.id, "crates.io", "https://crates.io", "")
            .await
            .unwrap();

        let (_, removed) = resources.delete_category(docs.id).await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(resources.list_categories().await.unwrap().len(), 1);
        assert_eq!(resources.list_resources(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_resource_needs_existing_category() {
        let temp_dir = TempDir::new().unwrap();
        let vault = vault(&temp_dir, "alice");

        let err = vault
            .resources()
            .add_resource(CategoryId::new(), "x", "https://x.test", "")
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::ForeignKey { .. }));
    }

    #[tokio::test]
    async fn test_update_and_delete_resource() {
        let temp_dir = TempDir::new().unwrap();
        let vault = vault(&temp_dir, "alice");
        let resources = vault.resources();

        let docs = resources.create_category("Docs").await.unwrap();
        let tools = resources.create_category("Tools").await.unwrap();
        let link = resources
            .add_resource(docs.id, "std", "https://doc.rust-lang.org/std/", "")
            .await
            .unwrap();

        let moved = resources
            .update_resource(link.id, None, None, Some("Standard library"), Some(tools.id))
            .await
            .unwrap();
        assert_eq!(moved.category_id, tools.id);
        assert_eq!(moved.description, "Standard library");
        assert!(resources.list_resources(Some(docs.id)).await.unwrap().is_empty());

        let empty_url = resources
            .update_resource(link.id, None, Some(" "), None, None)
            .await;
        assert!(matches!(empty_url, Err(VaultError::Validation(_))));

        resources.delete_resource(link.id).await.unwrap();
        assert!(resources.get_resource(link.id).await.unwrap().is_none());
    }
}
