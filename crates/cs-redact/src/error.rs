//! Error types for the card redaction pipeline.
//!
//! Messages never carry plaintext, salt, or key material. They name the
//! operation and the field, nothing more.

use crate::CardField;
use thiserror::Error;

/// Result type for redaction operations.
pub type Result<T> = std::result::Result<T, RedactionError>;

/// Failure raised by a digest or cipher primitive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrimitiveError {
    /// The value cannot be represented in the byte encoding the primitive needs.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Decryption failed: malformed ciphertext, wrong key, or tampered bytes.
    #[error("cipher error: {0}")]
    Cipher(String),
}

impl PrimitiveError {
    /// Returns whether this is an encoding failure.
    pub fn is_encoding(&self) -> bool {
        matches!(self, PrimitiveError::Encoding(_))
    }

    /// Returns whether this is a cipher failure.
    pub fn is_cipher(&self) -> bool {
        matches!(self, PrimitiveError::Cipher(_))
    }
}

/// A record could not be transformed because one of its fields failed.
///
/// Carries enough context for the caller to skip the record and continue.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("record {record_index}: field '{field}' failed: {source}")]
pub struct FieldTransformError {
    /// Position of the record in the input batch.
    pub record_index: usize,
    /// The field whose transform failed.
    pub field: CardField,
    /// Underlying primitive failure.
    #[source]
    pub source: PrimitiveError,
}

/// Errors that can occur in the redaction crate.
#[derive(Error, Debug)]
pub enum RedactionError {
    /// A primitive failed outside of record processing.
    #[error(transparent)]
    Primitive(#[from] PrimitiveError),

    /// A record failed during batch processing.
    #[error(transparent)]
    FieldTransform(#[from] FieldTransformError),

    /// Failed to load, parse, or validate the field policy.
    #[error("policy error: {0}")]
    Policy(String),

    /// I/O error during policy file operations.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
