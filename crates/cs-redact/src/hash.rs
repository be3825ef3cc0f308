//! Salted one-way digests for irreversible fields.
//!
//! Output is a fixed 32-byte digest in standard base64 (44 characters), so
//! the encoded length never reveals the input length. Equal (secret, salt)
//! pairs always produce equal output, which is what makes a stored digest
//! matchable later.

use crate::error::PrimitiveError;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Raw digest size in bytes.
pub const DIGEST_BYTES: usize = 32;

/// Length of a digest once base64 encoded.
pub const DIGEST_TEXT_LEN: usize = 44;

/// Capability: turn a secret plus a salt into an opaque digest.
///
/// Implementations must be deterministic and must not log or retain their
/// inputs.
pub trait DigestProducer: Send + Sync {
    /// Algorithm identifier, for reports.
    fn algorithm(&self) -> DigestAlgorithm;

    /// Digest `secret` under `salt`.
    fn digest(&self, secret: &str, salt: &str) -> Result<String, PrimitiveError>;

    /// Check a candidate secret against a stored digest, in constant time.
    fn verify(&self, secret: &str, salt: &str, expected: &str) -> Result<bool, PrimitiveError> {
        let computed = self.digest(secret, salt)?;
        Ok(computed.as_bytes().ct_eq(expected.as_bytes()).into())
    }
}

/// Selectable digest algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DigestAlgorithm {
    /// SHA-256 over `secret || salt`.
    #[default]
    SaltedSha256,
    /// HMAC-SHA256 with the salt as the MAC key.
    HmacSha256,
}

impl DigestAlgorithm {
    /// Build the producer for this algorithm.
    pub fn producer(&self) -> Box<dyn DigestProducer> {
        match self {
            DigestAlgorithm::SaltedSha256 => Box::new(SaltedSha256),
            DigestAlgorithm::HmacSha256 => Box::new(HmacSha256),
        }
    }
}

impl std::str::FromStr for DigestAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "salted-sha256" | "sha256" => Ok(DigestAlgorithm::SaltedSha256),
            "hmac-sha256" | "hmac" => Ok(DigestAlgorithm::HmacSha256),
            _ => Err(format!("unknown digest algorithm: {}", s)),
        }
    }
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DigestAlgorithm::SaltedSha256 => write!(f, "salted-sha256"),
            DigestAlgorithm::HmacSha256 => write!(f, "hmac-sha256"),
        }
    }
}

/// SHA-256 over the secret followed by the salt.
///
/// Concatenation is ambiguous at the boundary (`"12" + "3S"` and `"123" + "S"`
/// digest the same). With a single run-wide salt that cannot happen between
/// two fields of one run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SaltedSha256;

impl DigestProducer for SaltedSha256 {
    fn algorithm(&self) -> DigestAlgorithm {
        DigestAlgorithm::SaltedSha256
    }

    fn digest(&self, secret: &str, salt: &str) -> Result<String, PrimitiveError> {
        Ok(encode(&Self::raw(secret, salt)))
    }

    /// Compares raw digest bytes in constant time.
    fn verify(&self, secret: &str, salt: &str, expected: &str) -> Result<bool, PrimitiveError> {
        let stored = match base64::engine::general_purpose::STANDARD.decode(expected) {
            Ok(stored) if stored.len() == DIGEST_BYTES => stored,
            _ => return Ok(false),
        };
        Ok(Self::raw(secret, salt).as_slice().ct_eq(&stored).into())
    }
}

impl SaltedSha256 {
    fn raw(secret: &str, salt: &str) -> [u8; DIGEST_BYTES] {
        let mut hasher = Sha256::new();
        hasher.update(secret.as_bytes());
        hasher.update(salt.as_bytes());
        hasher.finalize().into()
    }
}

/// HMAC-SHA256 keyed by the salt.
#[derive(Debug, Clone, Copy, Default)]
pub struct HmacSha256;

impl HmacSha256 {
    fn mac(secret: &str, salt: &str) -> Result<Hmac<Sha256>, PrimitiveError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(salt.as_bytes())
            .map_err(|e| PrimitiveError::Encoding(format!("salt rejected as MAC key: {}", e)))?;
        mac.update(secret.as_bytes());
        Ok(mac)
    }
}

impl DigestProducer for HmacSha256 {
    fn algorithm(&self) -> DigestAlgorithm {
        DigestAlgorithm::HmacSha256
    }

    fn digest(&self, secret: &str, salt: &str) -> Result<String, PrimitiveError> {
        let mac = Self::mac(secret, salt)?;
        Ok(encode(&mac.finalize().into_bytes()))
    }

    /// Constant-time comparison against the stored tag.
    fn verify(&self, secret: &str, salt: &str, expected: &str) -> Result<bool, PrimitiveError> {
        let tag = match base64::engine::general_purpose::STANDARD.decode(expected) {
            Ok(tag) => tag,
            Err(_) => return Ok(false),
        };
        Ok(Self::mac(secret, salt)?.verify_slice(&tag).is_ok())
    }
}

fn encode(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}
