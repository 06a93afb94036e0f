//! Encryption context: the session key lifecycle plus field encryption
//!
//! One context wraps one [`SessionStore`]. The key is created lazily on the
//! first encrypt/decrypt, lives in the store as a JWK, and is re-read from the
//! store on every call, so clearing it (from this context or from any other
//! handle to the same store) takes effect immediately. Ciphertext produced
//! under a cleared key can never be decrypted again.

use std::sync::Mutex;

use tracing::{debug, warn};

use crate::error::{VaultError, VaultResult};

use super::encryption::{decrypt_envelope, encrypt_envelope, DecryptionError};
use super::secure_memory::SecureString;
use super::session_key::SessionKey;
use super::session_store::SessionStore;

/// Name of the session entry holding the exported key
pub const SESSION_KEY_ENTRY: &str = "encryption_master_key";

/// Session-held key plus the encrypt/decrypt operations that use it
pub struct EncryptionContext<S: SessionStore> {
    store: S,
    /// Serializes key creation so a session never ends up with two keys
    create_lock: Mutex<()>,
}

impl<S: SessionStore> EncryptionContext<S> {
    /// Create a context over a session store
    pub fn new(store: S) -> Self {
        Self {
            store,
            create_lock: Mutex::new(()),
        }
    }

    /// Access the underlying session store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Return the session key, generating and persisting one if absent
    pub fn get_or_create_session_key(&self) -> VaultResult<SessionKey> {
        if let Some(key) = self.load_key()? {
            return Ok(key);
        }

        let _guard = self
            .create_lock
            .lock()
            .map_err(|e| VaultError::Encryption(format!("Failed to acquire key lock: {}", e)))?;

        // Another caller may have won the race while we waited
        if let Some(key) = self.load_key()? {
            return Ok(key);
        }

        let key = SessionKey::generate();
        let jwk = key.to_jwk_json()?;
        self.store.set(SESSION_KEY_ENTRY, &jwk)?;
        debug!("generated new session key");
        Ok(key)
    }

    fn load_key(&self) -> VaultResult<Option<SessionKey>> {
        match self.store.get(SESSION_KEY_ENTRY)? {
            Some(jwk) => {
                let jwk = zeroize::Zeroizing::new(jwk);
                SessionKey::from_jwk_json(&jwk).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Encrypt a field; empty input returns empty output
    pub fn encrypt(&self, plaintext: &str) -> VaultResult<String> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }
        let key = self.get_or_create_session_key()?;
        encrypt_envelope(plaintext, &key)
    }

    /// Decrypt a field; empty input returns an empty string
    ///
    /// Failures are logged and returned, never raised. Render them with
    /// [`DecryptionError::sentinel`].
    pub fn decrypt(&self, envelope: &str) -> Result<SecureString, DecryptionError> {
        if envelope.is_empty() {
            return Ok(SecureString::new(""));
        }

        let key = self.get_or_create_session_key().map_err(|e| {
            warn!(error = %e, "session key unavailable for decryption");
            DecryptionError::KeyUnavailable
        })?;

        decrypt_envelope(envelope, &key).map_err(|e| {
            warn!(reason = %e, "decryption failed");
            e
        })
    }

    /// Delete the session key; later calls generate a brand-new key
    pub fn clear_session_key(&self) -> VaultResult<()> {
        self.store.remove(SESSION_KEY_ENTRY)?;
        debug!("session key cleared");
        Ok(())
    }

    /// Check whether a session key exists, without creating one
    pub fn has_session_key(&self) -> VaultResult<bool> {
        self.store.contains(SESSION_KEY_ENTRY)
    }
}

/// Decrypt for display: failures become the sentinel text
pub fn decrypt_or_sentinel<S: SessionStore>(ctx: &EncryptionContext<S>, envelope: &str) -> String {
    match ctx.decrypt(envelope) {
        Ok(plain) => plain.as_str().to_string(),
        Err(e) => e.sentinel().to_string(),
    }
}
