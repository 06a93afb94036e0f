//! Service note model
//!
//! One markdown document per (owner, service label). Uniqueness of the pair
//! is enforced by the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ids::{NoteId, UserId};
use super::nullable;
use crate::storage::{Record, Table};

/// Markdown notes attached to a service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceNote {
    pub id: NoteId,
    pub user_id: UserId,
    pub service_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub markdown_content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ServiceNote {
    /// Create a note for a service
    pub fn new(
        user_id: UserId,
        service_name: impl Into<String>,
        markdown_content: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: NoteId::new(),
            user_id,
            service_name: service_name.into(),
            markdown_content: markdown_content.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the content and bump the modification time
    pub fn set_content(&mut self, markdown_content: impl Into<String>) {
        self.markdown_content = markdown_content.into();
        self.updated_at = Utc::now();
    }
}

impl Record for ServiceNote {
    const TABLE: Table = Table::ServiceNotes;

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
