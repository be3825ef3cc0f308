//! Run secrets.

use zeroize::Zeroizing;

/// Salt and key for one run.
///
/// Both are wiped from memory on drop and never appear in `Debug` output.
#[derive(Clone)]
pub struct Secrets {
    salt: Zeroizing<String>,
    key: Zeroizing<String>,
}

impl Secrets {
    pub fn new(salt: String, key: String) -> Self {
        Self {
            salt: Zeroizing::new(salt),
            key: Zeroizing::new(key),
        }
    }

    /// Salt for the digest primitive.
    pub fn salt(&self) -> &str {
        self.salt.as_str()
    }

    /// Key text for the cipher primitive.
    pub fn key(&self) -> &str {
        self.key.as_str()
    }
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("salt", &"[REDACTED]")
            .field("key", &"[REDACTED]")
            .finish()
    }
}
