//! AES-256-GCM envelope encryption/decryption
//!
//! An envelope is `base64(nonce || ciphertext || tag)` with a 12-byte random
//! nonce drawn fresh for every call. It is the stored form of every secret
//! field and passes through export and import untouched.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{
    alphabet,
    engine::{general_purpose::STANDARD, DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use thiserror::Error;

use crate::error::{VaultError, VaultResult};

use super::secure_memory::SecureString;
use super::session_key::SessionKey;

/// Size of the AES-GCM nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Size of the AES-GCM authentication tag in bytes
pub const TAG_SIZE: usize = 16;

/// Text shown in place of a secret whose envelope could not be decrypted
pub const DECRYPTION_SENTINEL: &str = "[Decryption Error]";

/// Accepts envelopes with or without trailing padding
const LENIENT_STANDARD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Why an envelope could not be turned back into plaintext
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecryptionError {
    /// Not valid base64
    #[error("envelope is not valid base64")]
    MalformedEnvelope,

    /// Shorter than a nonce plus an authentication tag
    #[error("envelope is too short to hold a nonce and tag")]
    Truncated,

    /// Wrong key, corrupted data or tampering
    #[error("authentication failed: wrong key or corrupted data")]
    Authentication,

    /// Decrypted bytes are not UTF-8
    #[error("decrypted data is not valid UTF-8")]
    InvalidUtf8,

    /// The session key could not be read or created
    #[error("session key unavailable")]
    KeyUnavailable,
}

impl DecryptionError {
    /// The displayable stand-in for the secret
    pub fn sentinel(&self) -> &'static str {
        DECRYPTION_SENTINEL
    }
}

/// Encrypt a string into a base64 envelope
///
/// Empty input yields an empty envelope.
pub fn encrypt_envelope(plaintext: &str, key: &SessionKey) -> VaultResult<String> {
    if plaintext.is_empty() {
        return Ok(String::new());
    }

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::Encryption(format!("Failed to create cipher: {}", e)))?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|e| VaultError::Encryption(format!("Encryption failed: {}", e)))?;

    let mut packed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    packed.extend_from_slice(&nonce_bytes);
    packed.extend_from_slice(&ciphertext);

    Ok(STANDARD.encode(packed))
}

/// Decrypt a base64 envelope
///
/// Empty input yields an empty string.
pub fn decrypt_envelope(envelope: &str, key: &SessionKey) -> Result<SecureString, DecryptionError> {
    if envelope.is_empty() {
        return Ok(SecureString::new(""));
    }

    let packed = LENIENT_STANDARD
        .decode(envelope.trim())
        .map_err(|_| DecryptionError::MalformedEnvelope)?;

    if packed.len() < NONCE_SIZE + TAG_SIZE {
        return Err(DecryptionError::Truncated);
    }

    let (nonce_bytes, ciphertext) = packed.split_at(NONCE_SIZE);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| DecryptionError::KeyUnavailable)?;

    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| DecryptionError::Authentication)?;

    String::from_utf8(plaintext)
        .map(SecureString::from)
        .map_err(|_| DecryptionError::InvalidUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> SessionKey {
        SessionKey::generate()
    }

    #[test]
    fn test_encrypt_decrypt() {
        let key = test_key();
        let envelope = encrypt_envelope("Hello, World!", &key).unwrap();
        let decrypted = decrypt_envelope(&envelope, &key).unwrap();
        assert_eq!(decrypted, "Hello, World!");
    }

    #[test]
    fn test_unicode_roundtrip() {
        let key = test_key();
        let text = "clé secrète 🔑 ключ";
        let envelope = encrypt_envelope(text, &key).unwrap();
        assert_eq!(decrypt_envelope(&envelope, &key).unwrap(), text);
    }

    #[test]
    fn test_envelope_layout() {
        let key = test_key();
        let envelope = encrypt_envelope("abc", &key).unwrap();
        let packed = STANDARD.decode(&envelope).unwrap();
        assert_eq!(packed.len(), NONCE_SIZE + 3 + TAG_SIZE);
    }

    #[test]
    fn test_different_nonces() {
        let key = test_key();
        let e1 = encrypt_envelope("same", &key).unwrap();
        let e2 = encrypt_envelope("same", &key).unwrap();
        assert_ne!(e1, e2);

        let n1 = &STANDARD.decode(&e1).unwrap()[..NONCE_SIZE];
        let n2 = &STANDARD.decode(&e2).unwrap()[..NONCE_SIZE];
        assert_ne!(n1, n2);
    }

    #[test]
    fn test_empty_is_noop() {
        let key = test_key();
        assert_eq!(encrypt_envelope("", &key).unwrap(), "");
        assert_eq!(decrypt_envelope("", &key).unwrap(), "");
    }

    #[test]
    fn test_wrong_key_fails() {
        let envelope = encrypt_envelope("secret", &test_key()).unwrap();
        let result = decrypt_envelope(&envelope, &test_key());
        assert_eq!(result.unwrap_err(), DecryptionError::Authentication);
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = test_key();
        let envelope = encrypt_envelope("secret", &key).unwrap();

        let mut packed = STANDARD.decode(&envelope).unwrap();
        packed[NONCE_SIZE] ^= 0xFF;
        let tampered = STANDARD.encode(&packed);

        assert_eq!(
            decrypt_envelope(&tampered, &key).unwrap_err(),
            DecryptionError::Authentication
        );
    }

    #[test]
    fn test_malformed_and_truncated() {
        let key = test_key();
        assert_eq!(
            decrypt_envelope("not base64 !!!", &key).unwrap_err(),
            DecryptionError::MalformedEnvelope
        );
        assert_eq!(
            decrypt_envelope(&STANDARD.encode([0u8; 20]), &key).unwrap_err(),
            DecryptionError::Truncated
        );
    }

    #[test]
    fn test_unpadded_envelope_accepted() {
        let key = test_key();
        let envelope = encrypt_envelope("a", &key).unwrap();
        let unpadded = envelope.trim_end_matches('=');
        assert_eq!(decrypt_envelope(unpadded, &key).unwrap(), "a");
    }

    #[test]
    fn test_sentinel() {
        assert_eq!(DecryptionError::Truncated.sentinel(), "[Decryption Error]");
    }
}
