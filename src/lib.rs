//! api-vault - session-encrypted credential vault
//!
//! This library provides the core of a credential manager: API keys and
//! passwords are encrypted with AES-256-GCM under a key that lives only for
//! the current session, and a user's whole dataset can be exported to and
//! imported from a versioned JSON document.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `crypto`: Session key lifecycle and field encryption
//! - `models`: Credentials, service notes, resource categories and resources
//! - `storage`: The persistence backend trait and its JSON-file implementation
//! - `services`: CRUD over records, encrypting secrets on the way in
//! - `migration`: Export, import, clear and the export-then-wipe flow
//! - `audit`: Audit logging system
//! - `display`, `cli`: Terminal front-end
//!
//! # Example
//!
//! ```rust,ignore
//! use api_vault::crypto::{EncryptionContext, MemorySessionStore};
//!
//! let ctx = EncryptionContext::new(MemorySessionStore::new());
//! let envelope = ctx.encrypt("sk-live-123")?;
//! assert_eq!(ctx.decrypt(&envelope).unwrap().as_str(), "sk-live-123");
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod display;
pub mod error;
pub mod migration;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{VaultError, VaultResult};
