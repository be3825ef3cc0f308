//! Reversible encryption for fields an authorized party must recover.
//!
//! AES-256-GCM under a key derived from the run key text with HKDF-SHA256.
//! The ciphertext text is `base64(nonce || ciphertext || tag)`.
//!
//! Two nonce modes share that format:
//!
//! - [`NonceMode::Random`]: a fresh 96-bit nonce per call. Encrypting the same
//!   value twice gives different text.
//! - [`NonceMode::Synthetic`]: the nonce is `HMAC-SHA256(nonce_key, plaintext)`
//!   truncated to 96 bits, so equal plaintexts under one key give equal text.
//!   Output is deterministic within and across runs and reveals which fields
//!   hold equal values. Distinct plaintexts share a nonce only on a 96-bit
//!   HMAC collision.
//!
//! Decryption does not depend on the mode.

use crate::error::PrimitiveError;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

/// AES-GCM nonce size in bytes.
pub const NONCE_BYTES: usize = 12;

/// AES-GCM authentication tag size in bytes.
pub const TAG_BYTES: usize = 16;

/// AES-256 key size in bytes.
const KEY_BYTES: usize = 32;

/// HKDF extract salt. Fixed: the run key is the only secret input.
const KDF_SALT: &[u8] = b"cardseal.cipher.v1";

/// HKDF info label for the expanded key block.
const KDF_INFO: &[u8] = b"aes-256-gcm key || synthetic nonce key";

/// Capability: reversible transform of text under a shared key.
///
/// Implementations must satisfy `decrypt(encrypt(p, k), k) == p` and must not
/// log or retain the key or the plaintext.
pub trait CipherProducer: Send + Sync {
    /// Nonce mode, for reports.
    fn nonce_mode(&self) -> NonceMode;

    /// Encrypt `plaintext` under `key`, returning printable text.
    fn encrypt(&self, plaintext: &str, key: &str) -> Result<String, PrimitiveError>;

    /// Decrypt text produced by [`CipherProducer::encrypt`] with the same key.
    fn decrypt(&self, ciphertext: &str, key: &str) -> Result<String, PrimitiveError>;
}

/// How nonces are chosen on encryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NonceMode {
    /// Fresh random nonce per call.
    #[default]
    Random,
    /// Nonce derived from the plaintext. Deterministic.
    Synthetic,
}

impl std::str::FromStr for NonceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "random" => Ok(NonceMode::Random),
            "synthetic" | "deterministic" => Ok(NonceMode::Synthetic),
            _ => Err(format!("unknown nonce mode: {}", s)),
        }
    }
}

impl std::fmt::Display for NonceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NonceMode::Random => write!(f, "random"),
            NonceMode::Synthetic => write!(f, "synthetic"),
        }
    }
}

/// Keys expanded from the run key text.
struct DerivedKeys {
    cipher_key: Zeroizing<[u8; KEY_BYTES]>,
    nonce_key: Zeroizing<[u8; KEY_BYTES]>,
}

impl DerivedKeys {
    fn derive(key: &str) -> Result<Self, PrimitiveError> {
        let hk = Hkdf::<Sha256>::new(Some(KDF_SALT), key.as_bytes());
        let mut okm = Zeroizing::new([0u8; KEY_BYTES * 2]);
        hk.expand(KDF_INFO, &mut okm[..])
            .map_err(|e| PrimitiveError::Cipher(format!("key derivation failed: {}", e)))?;

        let mut cipher_key = Zeroizing::new([0u8; KEY_BYTES]);
        let mut nonce_key = Zeroizing::new([0u8; KEY_BYTES]);
        cipher_key.copy_from_slice(&okm[..KEY_BYTES]);
        nonce_key.copy_from_slice(&okm[KEY_BYTES..]);
        Ok(Self {
            cipher_key,
            nonce_key,
        })
    }

    fn cipher(&self) -> Result<Aes256Gcm, PrimitiveError> {
        Aes256Gcm::new_from_slice(&self.cipher_key[..])
            .map_err(|e| PrimitiveError::Cipher(format!("invalid cipher key: {}", e)))
    }

    fn synthetic_nonce(&self, plaintext: &[u8]) -> Result<[u8; NONCE_BYTES], PrimitiveError> {
        let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(&self.nonce_key[..])
            .map_err(|e| PrimitiveError::Cipher(format!("invalid nonce key: {}", e)))?;
        mac.update(plaintext);
        let tag = mac.finalize().into_bytes();

        let mut nonce = [0u8; NONCE_BYTES];
        nonce.copy_from_slice(&tag[..NONCE_BYTES]);
        Ok(nonce)
    }
}

fn random_nonce() -> Result<[u8; NONCE_BYTES], PrimitiveError> {
    let mut nonce = [0u8; NONCE_BYTES];
    getrandom::getrandom(&mut nonce)
        .map_err(|e| PrimitiveError::Cipher(format!("failed to generate nonce: {}", e)))?;
    Ok(nonce)
}

/// AES-256-GCM cipher.
#[derive(Debug, Clone, Copy, Default)]
pub struct AesGcmCipher {
    mode: NonceMode,
}

impl AesGcmCipher {
    /// Create a cipher with the given nonce mode.
    pub fn new(mode: NonceMode) -> Self {
        Self { mode }
    }

    /// Cipher with a fresh nonce per call.
    pub fn random() -> Self {
        Self::new(NonceMode::Random)
    }

    /// Deterministic cipher.
    pub fn synthetic() -> Self {
        Self::new(NonceMode::Synthetic)
    }
}

impl CipherProducer for AesGcmCipher {
    fn nonce_mode(&self) -> NonceMode {
        self.mode
    }

    fn encrypt(&self, plaintext: &str, key: &str) -> Result<String, PrimitiveError> {
        let keys = DerivedKeys::derive(key)?;
        let nonce_bytes = match self.mode {
            NonceMode::Random => random_nonce()?,
            NonceMode::Synthetic => keys.synthetic_nonce(plaintext.as_bytes())?,
        };

        let sealed = keys
            .cipher()?
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|_| PrimitiveError::Cipher("encryption failed".to_string()))?;

        let mut out = Vec::with_capacity(NONCE_BYTES + sealed.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&sealed);
        Ok(base64::engine::general_purpose::STANDARD.encode(out))
    }

    fn decrypt(&self, ciphertext: &str, key: &str) -> Result<String, PrimitiveError> {
        let raw = base64::engine::general_purpose::STANDARD
            .decode(ciphertext)
            .map_err(|_| PrimitiveError::Cipher("ciphertext is not valid base64".to_string()))?;

        if raw.len() < NONCE_BYTES + TAG_BYTES {
            return Err(PrimitiveError::Cipher(format!(
                "ciphertext too short: {} bytes, minimum {}",
                raw.len(),
                NONCE_BYTES + TAG_BYTES
            )));
        }

        let (nonce_bytes, sealed) = raw.split_at(NONCE_BYTES);
        let keys = DerivedKeys::derive(key)?;
        let plaintext = keys
            .cipher()?
            .decrypt(Nonce::from_slice(nonce_bytes), sealed)
            .map_err(|_| {
                PrimitiveError::Cipher(
                    "authentication failed (wrong key or tampered data)".to_string(),
                )
            })?;

        String::from_utf8(plaintext)
            .map_err(|_| PrimitiveError::Encoding("decrypted bytes are not valid UTF-8".to_string()))
    }
}
