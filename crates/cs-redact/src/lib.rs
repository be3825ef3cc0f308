//! Field-level redaction for payment-card records.
//!
//! This crate turns a batch of card records into a variant that is safe to
//! store or transmit: the card number and verification code become salted
//! one-way digests, and the holder name and expiry fields become ciphertext
//! that the holder of the key can recover.
//!
//! # Key Features
//!
//! - **Declarative policy**: a [`FieldPolicy`] table decides, per field,
//!   whether to digest or encrypt. The transformer never hardcodes a field.
//! - **Substitutable primitives**: [`DigestProducer`] and [`CipherProducer`]
//!   are capability traits; the transformer works with any implementation.
//! - **Authenticated encryption**: AES-256-GCM with an HKDF-derived key, so a
//!   wrong key or a tampered value is an error rather than garbage.
//! - **Atomic records**: a record is either fully transformed or reported as
//!   a [`FieldTransformError`] naming the record index and field.
//! - **Order-preserving parallelism**: batches can be split across threads
//!   and come back in input order.
//!
//! # Example
//!
//! ```no_run
//! use cs_redact::{CardRecord, RecordTransformer};
//!
//! let transformer = RecordTransformer::default();
//! let batch = vec![CardRecord::new("Ann", "Lee", "123", "07", "2026", "4111111111111111")];
//!
//! let sealed = transformer.transform(&batch, "salt", "key").unwrap();
//! assert_ne!(sealed[0].number, batch[0].number);
//!
//! let revealed = transformer.reveal(&sealed, "key").unwrap();
//! assert_eq!(revealed[0].name, "Ann");
//! ```

pub mod action;
pub mod cipher;
pub mod engine;
pub mod error;
pub mod field_class;
pub mod hash;
pub mod policy;
pub mod record;

pub use action::TransformClass;
pub use cipher::{AesGcmCipher, CipherProducer, NonceMode};
pub use engine::{RecordOutcome, RecordTransformer};
pub use error::{FieldTransformError, PrimitiveError, RedactionError, Result};
pub use field_class::CardField;
pub use hash::{DigestAlgorithm, DigestProducer, HmacSha256, SaltedSha256};
pub use policy::{FieldPolicy, POLICY_SCHEMA_VERSION};
pub use record::{CardRecord, RecordBatch};
