//! Credential record model
//!
//! One stored secret: a service label, optional login, an optional
//! encrypted password and a required encrypted secret value. The envelope
//! fields hold ciphertext only; plaintext never lands in a record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::ids::{CredentialId, UserId};
use super::nullable;
use crate::storage::{Record, Table};

/// Longest accepted service label
pub const MAX_SERVICE_NAME_LEN: usize = 100;

/// A stored credential, serialized with the backend's column names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    /// Unique identifier
    pub id: CredentialId,

    /// Owner
    pub user_id: UserId,

    /// Service label (e.g. "OpenAI")
    pub service_name: String,

    /// Username or email, may be empty
    #[serde(default, deserialize_with = "nullable")]
    pub email_username: String,

    /// Envelope of the password, empty when there is none
    #[serde(default, deserialize_with = "nullable")]
    pub encrypted_password: String,

    /// Envelope of the secret value
    pub encrypted_api_key: String,

    /// Free-text notes
    #[serde(default, deserialize_with = "nullable")]
    pub notes: String,

    /// Tags
    #[serde(default, deserialize_with = "nullable")]
    pub tags: Vec<String>,

    /// When the record was created
    pub created_at: DateTime<Utc>,

    /// When the record was last modified
    pub updated_at: DateTime<Utc>,
}

impl Credential {
    /// Create a record from already-encrypted fields
    pub fn new(
        user_id: UserId,
        service_name: impl Into<String>,
        encrypted_api_key: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: CredentialId::new(),
            user_id,
            service_name: service_name.into(),
            email_username: String::new(),
            encrypted_password: String::new(),
            encrypted_api_key: encrypted_api_key.into(),
            notes: String::new(),
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether a password envelope is stored
    pub fn has_password(&self) -> bool {
        !self.encrypted_password.is_empty()
    }

    /// Validate the record
    pub fn validate(&self) -> Result<(), CredentialValidationError> {
        let service = self.service_name.trim();
        if service.is_empty() {
            return Err(CredentialValidationError::EmptyServiceName);
        }
        if service.len() > MAX_SERVICE_NAME_LEN {
            return Err(CredentialValidationError::ServiceNameTooLong(service.len()));
        }
        if self.encrypted_api_key.is_empty() {
            return Err(CredentialValidationError::MissingSecret);
        }
        if self.tags.iter().any(|t| t.trim().is_empty()) {
            return Err(CredentialValidationError::EmptyTag);
        }
        Ok(())
    }
}

impl Record for Credential {
    const TABLE: Table = Table::ApiKeys;

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

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.email_username.is_empty() {
            write!(f, "{} ({})", self.service_name, self.id)
        } else {
            write!(f, "{} / {} ({})", self.service_name, self.email_username, self.id)
        }
    }
}

/// Validation errors for credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialValidationError {
    EmptyServiceName,
    ServiceNameTooLong(usize),
    MissingSecret,
    EmptyTag,
}

impl fmt::Display for CredentialValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyServiceName => write!(f, "Service name cannot be empty"),
            Self::ServiceNameTooLong(len) => write!(
                f,
                "Service name too long ({} characters, max {})",
                len, MAX_SERVICE_NAME_LEN
            ),
            Self::MissingSecret => write!(f, "A secret value is required"),
            Self::EmptyTag => write!(f, "Tags cannot be empty"),
        }
    }
}

impl std::error::Error for CredentialValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> UserId {
        UserId::new("user-a")
    }

    #[test]
    fn test_new_credential() {
        let cred = Credential::new(owner(), "OpenAI", "ZW52ZWxvcGU=");
        assert_eq!(cred.service_name, "OpenAI");
        assert!(!cred.has_password());
        assert!(cred.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut cred = Credential::new(owner(), "  ", "x");
        assert_eq!(
            cred.validate(),
            Err(CredentialValidationError::EmptyServiceName)
        );

        cred.service_name = "a".repeat(101);
        assert!(matches!(
            cred.validate(),
            Err(CredentialValidationError::ServiceNameTooLong(101))
        ));

        cred.service_name = "Stripe".into();
        cred.encrypted_api_key.clear();
        assert_eq!(cred.validate(), Err(CredentialValidationError::MissingSecret));
    }

    #[test]
    fn test_backend_row_with_nulls() {
        let json = r#"{
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "user_id": "user-a",
            "service_name": "OpenAI",
            "email_username": null,
            "encrypted_password": null,
            "encrypted_api_key": "abc",
            "notes": null,
            "tags": null,
            "created_at": "2024-05-01T12:00:00.123456+00:00",
            "updated_at": "2024-05-01T12:00:00.123456+00:00"
        }"#;
        let cred: Credential = serde_json::from_str(json).unwrap();
        assert_eq!(cred.email_username, "");
        assert!(cred.tags.is_empty());
        assert_eq!(cred.encrypted_api_key, "abc");
    }

    #[test]
    fn test_serializes_backend_column_names() {
        let cred = Credential::new(owner(), "GitHub", "abc");
        let value = serde_json::to_value(&cred).unwrap();
        for column in [
            "id",
            "user_id",
            "service_name",
            "email_username",
            "encrypted_password",
            "encrypted_api_key",
            "notes",
            "tags",
            "created_at",
            "updated_at",
        ] {
            assert!(value.get(column).is_some(), "missing {}", column);
        }
    }
}
