//! Resource organizer CLI commands
//!
//! Implements CLI commands for categories and the links filed under them.

use clap::Subcommand;

use super::confirm_or_warn;
use crate::crypto::SessionStore;
use crate::display::format_resource_tree;
use crate::error::{VaultError, VaultResult};
use crate::services::Vault;
use crate::storage::Backend;

/// Resource subcommands
#[derive(Subcommand)]
pub enum ResourceCommands {
    /// Create a category
    AddCategory {
        /// Category name
        name: String,
    },
    /// Rename a category
    RenameCategory {
        /// Category name or ID
        category: String,
        /// New name
        name: String,
    },
    /// Delete a category and every resource in it
    DeleteCategory {
        /// Category name or ID
        category: String,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
    /// Add a resource to a category
    Add {
        /// Category name or ID
        category: String,
        /// Display name
        name: String,
        /// Link
        url: String,
        /// Description
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// List categories and their resources
    List {
        /// Only this category
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Change a resource
    Edit {
        /// Resource ID
        id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New link
        #[arg(long)]
        url: Option<String>,
        /// New description
        #[arg(short, long)]
        description: Option<String>,
        /// Move to another category
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Delete a resource
    Delete {
        /// Resource ID
        id: String,
    },
}

/// Handle a resource command
pub async fn handle_resource_command<B: Backend, S: SessionStore>(
    vault: &Vault<B, S>,
    cmd: ResourceCommands,
) -> VaultResult<()> {
    let service = vault.resources();

    match cmd {
        ResourceCommands::AddCategory { name } => {
            let category = service.create_category(&name).await?;
            println!("Created category: {} ({})", category.name, category.id);
        }

        ResourceCommands::RenameCategory { category, name } => {
            let found = service.require_category(&category).await?;
            let old_name = found.name.clone();
            let renamed = service.rename_category(found.id, &name).await?;
            println!("Renamed category: '{}' -> '{}'", old_name, renamed.name);
        }

        ResourceCommands::DeleteCategory { category, force } => {
            let found = service.require_category(&category).await?;
            let filed = service.list_resources(Some(found.id)).await?.len();
            let warning = format!(
                "About to delete category '{}' and its {} resources",
                found.name, filed
            );
            if !confirm_or_warn(force, &warning) {
                return Ok(());
            }
            let (deleted, removed) = service.delete_category(found.id).await?;
            println!(
                "Deleted category: {} ({} resources removed)",
                deleted.name, removed
            );
        }

        ResourceCommands::Add {
            category,
            name,
            url,
            description,
        } => {
            let found = service.require_category(&category).await?;
            let resource = service
                .add_resource(found.id, &name, &url, &description)
                .await?;
            println!("Added {} to {} ({})", resource.name, found.name, resource.id);
        }

        ResourceCommands::List { category } => {
            let (categories, resources) = match category {
                Some(category) => {
                    let found = service.require_category(&category).await?;
                    let resources = service.list_resources(Some(found.id)).await?;
                    (vec![found], resources)
                }
                None => (
                    service.list_categories().await?,
                    service.list_resources(None).await?,
                ),
            };
            print!("{}", format_resource_tree(&categories, &resources));
        }

        ResourceCommands::Edit {
            id,
            name,
            url,
            description,
            category,
        } => {
            let resource = service
                .find_resource(&id)
                .await?
                .ok_or_else(|| VaultError::resource_not_found(&id))?;
            let category_id = match category {
                Some(category) => Some(service.require_category(&category).await?.id),
                None => None,
            };
            let updated = service
                .update_resource(
                    resource.id,
                    name.as_deref(),
                    url.as_deref(),
                    description.as_deref(),
                    category_id,
                )
                .await?;
            println!("Updated resource: {}", updated.name);
        }

        ResourceCommands::Delete { id } => {
            let resource = service
                .find_resource(&id)
                .await?
                .ok_or_else(|| VaultError::resource_not_found(&id))?;
            let deleted = service.delete_resource(resource.id).await?;
            println!("Deleted resource: {}", deleted.name);
        }
    }

    Ok(())
}
