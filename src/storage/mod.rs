//! Storage layer for api-vault
//!
//! The vault talks to its persistence collaborator through [`Backend`]:
//! owner-scoped select/insert/update/upsert/delete over four tables.
//! [`JsonBackend`] is the local implementation, one JSON file per table
//! with atomic writes, enforcing the same row-level security and
//! relational constraints a hosted backend would.

pub mod file_io;
pub mod json_backend;
pub mod query;
pub mod record;

pub use file_io::{read_json, write_json_atomic};
pub use json_backend::{JsonBackend, CURRENT_USER_ENTRY};
pub use query::{Filter, Order};
pub use record::{Record, Table};

use async_trait::async_trait;

use crate::error::{VaultError, VaultResult};
use crate::models::UserId;

/// Owner-scoped table access
///
/// Every call runs as the signed-in user: reads only see that user's rows and
/// writes of rows owned by anyone else are rejected. Calls made while nobody
/// is signed in fail with [`VaultError::NotAuthenticated`].
#[async_trait]
pub trait Backend: Send + Sync {
    /// The signed-in user, if any
    async fn current_user(&self) -> VaultResult<Option<UserId>>;

    /// Rows matching `filter`, optionally sorted
    async fn select<R: Record>(&self, filter: &Filter, order: Option<&Order>)
        -> VaultResult<Vec<R>>;

    /// Insert new rows; a duplicate primary key is a conflict
    async fn insert<R: Record>(&self, rows: &[R]) -> VaultResult<()>;

    /// Replace an existing row by primary key; returns whether a row changed
    async fn update<R: Record>(&self, row: &R) -> VaultResult<bool>;

    /// Insert rows, overwriting any row with the same primary key
    async fn upsert<R: Record>(&self, rows: &[R]) -> VaultResult<()>;

    /// Delete rows matching `filter`; returns the number removed
    async fn delete<R: Record>(&self, filter: &Filter) -> VaultResult<usize>;
}

/// Backends that own the session identity
pub trait Authenticator {
    /// Start a session as `user`
    fn sign_in(&self, user: &UserId) -> VaultResult<()>;

    /// End the current session's identity
    fn sign_out(&self) -> VaultResult<()>;
}

/// The signed-in user, or [`VaultError::NotAuthenticated`]
pub async fn require_user<B: Backend>(backend: &B) -> VaultResult<UserId> {
    backend
        .current_user()
        .await?
        .ok_or(VaultError::NotAuthenticated)
}
