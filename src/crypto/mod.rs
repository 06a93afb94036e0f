//! Cryptographic functions for api-vault
//!
//! Provides AES-256-GCM envelope encryption under a per-session key. The key
//! is generated on first use, persisted as a JWK in session-scoped storage,
//! and discarded on sign-out.

pub mod context;
pub mod encryption;
pub mod secure_memory;
pub mod session_key;
pub mod session_store;

pub use context::{decrypt_or_sentinel, EncryptionContext, SESSION_KEY_ENTRY};
pub use encryption::{
    decrypt_envelope, encrypt_envelope, DecryptionError, DECRYPTION_SENTINEL, NONCE_SIZE,
};
pub use secure_memory::SecureString;
pub use session_key::SessionKey;
pub use session_store::{FileSessionStore, MemorySessionStore, SessionStore};
