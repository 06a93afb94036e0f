//! Resource organizer models
//!
//! Bookmark-style links grouped under categories. A resource refers to its
//! category by id; the backend rejects resources whose category is missing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::ids::{CategoryId, ResourceId, UserId};
use super::nullable;
use crate::storage::{Record, Table};

/// A named group of resources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceCategory {
    pub id: CategoryId,
    pub user_id: UserId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl ResourceCategory {
    /// Create a new category
    pub fn new(user_id: UserId, name: impl Into<String>) -> Self {
        Self {
            id: CategoryId::new(),
            user_id,
            name: name.into(),
            created_at: Utc::now(),
        }
    }

    /// Validate the category
    pub fn validate(&self) -> Result<(), ResourceValidationError> {
        if self.name.trim().is_empty() {
            return Err(ResourceValidationError::EmptyName);
        }
        Ok(())
    }
}

impl Record for ResourceCategory {
    const TABLE: Table = Table::ResourceCategories;

    fn id(&self) -> Uuid {
        *self.id.as_uuid()
    }

    fn owner(&self) -> &UserId {
        &self.user_id
    }

    fn set_owner(&mut self, owner: UserId) {
        self.user_id = owner;
    }
}

/// A link stored under a category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub user_id: UserId,
    pub category_id: CategoryId,
    pub name: String,
    pub url: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Resource {
    /// Create a new resource in a category
    pub fn new(
        user_id: UserId,
        category_id: CategoryId,
        name: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: ResourceId::new(),
            user_id,
            category_id,
            name: name.into(),
            url: url.into(),
            description: String::new(),
            created_at: Utc::now(),
        }
    }

    /// Validate the resource
    pub fn validate(&self) -> Result<(), ResourceValidationError> {
        if self.name.trim().is_empty() {
            return Err(ResourceValidationError::EmptyName);
        }
        if self.url.trim().is_empty() {
            return Err(ResourceValidationError::EmptyUrl);
        }
        Ok(())
    }
}

impl Record for Resource {
    const TABLE: Table = Table::Resources;

    fn id(&self) -> Uuid {
        *self.id.as_uuid()
    }

    fn owner(&self) -> &UserId {
        &self.user_id
    }

    fn set_owner(&mut self, owner: UserId) {
        self.user_id = owner;
    }
}

/// Validation errors for categories and resources
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceValidationError {
    EmptyName,
    EmptyUrl,
}

impl fmt::Display for ResourceValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Name cannot be empty"),
            Self::EmptyUrl => write!(f, "URL cannot be empty"),
        }
    }
}

impl std::error::Error for ResourceValidationError {}
