//! Transformation classes.

use serde::{Deserialize, Serialize};

/// How a field is transformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformClass {
    /// Replace with a salted one-way digest. The original cannot be recovered,
    /// only matched.
    Digest,
    /// Replace with ciphertext under the run key. An authorized holder of the
    /// key can recover the original.
    Encrypt,
}

impl TransformClass {
    /// Parse a class from a string.
    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "digest" | "hash" => Some(TransformClass::Digest),
            "encrypt" | "cipher" => Some(TransformClass::Encrypt),
            _ => None,
        }
    }
}

impl std::fmt::Display for TransformClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TransformClass::Digest => "digest",
            TransformClass::Encrypt => "encrypt",
        };
        write!(f, "{}", s)
    }
}
