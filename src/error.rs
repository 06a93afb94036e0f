//! Custom error types for api-vault
//!
//! This module defines the error hierarchy for the vault using thiserror.
//! Decryption failures are deliberately absent: they live in
//! [`crate::crypto::DecryptionError`] and never abort an operation.

use thiserror::Error;

/// The main error type for vault operations
#[derive(Error, Debug)]
pub enum VaultError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for data models
    #[error("Validation error: {0}")]
    Validation(String),

    /// No signed-in owner identity
    #[error("User not authenticated")]
    NotAuthenticated,

    /// Import document has the wrong version or shape
    #[error("Invalid import file format: {0}")]
    InvalidFormat(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Unique constraint violated by the backend
    #[error("{table}: duplicate key ({constraint})")]
    Conflict {
        table: &'static str,
        constraint: String,
    },

    /// Foreign key constraint violated by the backend
    #[error("{table}: foreign key violation ({detail})")]
    ForeignKey { table: &'static str, detail: String },

    /// Row-level security rejected a row
    #[error("{table}: row violates row-level security for the current user")]
    RowLevelSecurity { table: &'static str },

    /// Persistence collaborator errors
    #[error("Backend error: {0}")]
    Backend(String),

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),

    /// Import errors
    #[error("Import error: {0}")]
    Import(String),

    /// Encryption and session key errors
    #[error("Encryption error: {0}")]
    Encryption(String),
}

impl VaultError {
    /// Create a "not found" error for credential records
    pub fn credential_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Credential",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for resource categories
    pub fn category_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Category",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for resources
    pub fn resource_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Resource",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an authentication error
    pub fn is_not_authenticated(&self) -> bool {
        matches!(self, Self::NotAuthenticated)
    }

    /// Check if the error came from the persistence collaborator
    pub fn is_backend(&self) -> bool {
        matches!(
            self,
            Self::Backend(_)
                | Self::Conflict { .. }
                | Self::ForeignKey { .. }
                | Self::RowLevelSecurity { .. }
        )
    }
}

impl From<std::io::Error> for VaultError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for vault operations
pub type VaultResult<T> = Result<T, VaultError>;
