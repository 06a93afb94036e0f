//! Tables and the record trait shared by every stored entity

use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::models::UserId;

/// The four logical tables of the vault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    ApiKeys,
    ServiceNotes,
    ResourceCategories,
    Resources,
}

impl Table {
    /// All tables, parents before children
    pub const ALL: [Table; 4] = [
        Table::ApiKeys,
        Table::ServiceNotes,
        Table::ResourceCategories,
        Table::Resources,
    ];

    /// Backend table name
    pub fn name(&self) -> &'static str {
        match self {
            Table::ApiKeys => "api_keys",
            Table::ServiceNotes => "service_notes",
            Table::ResourceCategories => "resource_categories",
            Table::Resources => "resources",
        }
    }

    /// Human-readable plural label
    pub fn label(&self) -> &'static str {
        match self {
            Table::ApiKeys => "API Keys",
            Table::ServiceNotes => "Service Notes",
            Table::ResourceCategories => "Resource Categories",
            Table::Resources => "Resources",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A row type stored in one table, owned by one user
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Table holding rows of this type
    const TABLE: Table;

    /// Primary key
    fn id(&self) -> Uuid;

    /// Owning user
    fn owner(&self) -> &UserId;

    /// Reassign ownership
    fn set_owner(&mut self, owner: UserId);
}
