//! Session key material and its JSON Web Key codec
//!
//! The serialized form matches what a browser's WebCrypto `exportKey("jwk")`
//! produces for an extractable AES-GCM-256 key, so keys persisted by either
//! side can be read by the other.

use aes_gcm::aead::{rand_core::RngCore, OsRng};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{VaultError, VaultResult};

/// Size of an AES-256 key in bytes
pub const KEY_SIZE: usize = 32;

/// JWK algorithm identifier for AES-GCM with a 256-bit key
const JWK_ALG: &str = "A256GCM";

/// A 256-bit symmetric key, zeroed on drop
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey {
    bytes: [u8; KEY_SIZE],
}

impl SessionKey {
    /// Generate a fresh key from the operating system RNG
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Wrap existing key bytes
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    /// Get the key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    /// Export as a JWK JSON string
    pub fn to_jwk_json(&self) -> VaultResult<Zeroizing<String>> {
        let jwk = Jwk {
            alg: Some(JWK_ALG.to_string()),
            ext: Some(true),
            k: URL_SAFE_NO_PAD.encode(self.bytes),
            key_ops: vec!["encrypt".to_string(), "decrypt".to_string()],
            kty: "oct".to_string(),
        };
        serde_json::to_string(&jwk)
            .map(Zeroizing::new)
            .map_err(|e| VaultError::Encryption(format!("Failed to export session key: {}", e)))
    }

    /// Import from a JWK JSON string
    pub fn from_jwk_json(json: &str) -> VaultResult<Self> {
        let jwk: Jwk = serde_json::from_str(json)
            .map_err(|e| VaultError::Encryption(format!("Invalid session key: {}", e)))?;

        if jwk.kty != "oct" {
            return Err(VaultError::Encryption(format!(
                "Unsupported key type: {}",
                jwk.kty
            )));
        }
        if let Some(alg) = &jwk.alg {
            if alg != JWK_ALG {
                return Err(VaultError::Encryption(format!(
                    "Unsupported key algorithm: {}",
                    alg
                )));
            }
        }

        // Browsers never pad, but tolerate it
        let raw = Zeroizing::new(
            URL_SAFE_NO_PAD
                .decode(jwk.k.trim_end_matches('='))
                .map_err(|e| VaultError::Encryption(format!("Invalid key encoding: {}", e)))?,
        );
        if raw.len() != KEY_SIZE {
            return Err(VaultError::Encryption(format!(
                "Invalid key size: expected {}, got {}",
                KEY_SIZE,
                raw.len()
            )));
        }

        let mut bytes = [0u8; KEY_SIZE];
        bytes.copy_from_slice(&raw);
        Ok(Self { bytes })
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionKey(***)")
    }
}

/// JSON Web Key for a symmetric key, fields in WebCrypto export order
#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct Jwk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    alg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ext: Option<bool>,
    k: String,
    #[serde(default)]
    key_ops: Vec<String>,
    kty: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_distinct_keys() {
        let k1 = SessionKey::generate();
        let k2 = SessionKey::generate();
        assert_ne!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_jwk_roundtrip() {
        let key = SessionKey::generate();
        let json = key.to_jwk_json().unwrap();
        let restored = SessionKey::from_jwk_json(&json).unwrap();
        assert_eq!(key.as_bytes(), restored.as_bytes());
    }

    #[test]
    fn test_jwk_matches_webcrypto_layout() {
        let key = SessionKey::from_bytes([7u8; KEY_SIZE]);
        let json = key.to_jwk_json().unwrap();
        assert_eq!(
            json.as_str(),
            r#"{"alg":"A256GCM","ext":true,"k":"BwcHBwcHBwcHBwcHBwcHBwcHBwcHBwcHBwcHBwcHBwc","key_ops":["encrypt","decrypt"],"kty":"oct"}"#
        );
    }

    #[test]
    fn test_reject_wrong_size() {
        let json = r#"{"kty":"oct","k":"AAAA"}"#;
        assert!(SessionKey::from_jwk_json(json).is_err());
    }

    #[test]
    fn test_reject_wrong_kty() {
        let key = SessionKey::generate();
        let json = key.to_jwk_json().unwrap().replace("\"oct\"", "\"RSA\"");
        assert!(SessionKey::from_jwk_json(&json).is_err());
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = SessionKey::from_bytes([1u8; KEY_SIZE]);
        assert_eq!(format!("{:?}", key), "SessionKey(***)");
    }
}
