//! Core data models for api-vault
//!
//! The four record types stored per user: credentials, service notes,
//! resource categories and resources. Field names match the backend's
//! column names, which are also the names used inside export documents.

pub mod credential;
pub mod ids;
pub mod note;
pub mod resource;

pub use credential::{Credential, CredentialValidationError};
pub use ids::{CategoryId, CredentialId, NoteId, ResourceId, UserId};
pub use note::ServiceNote;
pub use resource::{Resource, ResourceCategory, ResourceValidationError};

use serde::{Deserialize, Deserializer};

/// Read a JSON `null` as the type's default value
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
