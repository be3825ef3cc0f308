//! Record transformer.
//!
//! The RecordTransformer walks a batch of card records and replaces every
//! field with the output of the primitive its policy class names. It depends
//! on the primitives only through [`DigestProducer`] and [`CipherProducer`].

use crate::{
    AesGcmCipher, CardField, CardRecord, CipherProducer, DigestAlgorithm, DigestProducer,
    FieldPolicy, FieldTransformError, NonceMode, RecordBatch, RedactionError, Result,
    SaltedSha256, TransformClass,
};
use std::thread;

/// Per-record outcome, in input order.
pub type RecordOutcome = std::result::Result<CardRecord, FieldTransformError>;

/// Applies the field policy to card records.
///
/// Holds no state between batches. Salt and key are passed per call and are
/// never stored.
pub struct RecordTransformer {
    /// Field-to-class table.
    policy: FieldPolicy,

    /// Primitive for irreversible fields.
    digest: Box<dyn DigestProducer>,

    /// Primitive for reversible fields.
    cipher: Box<dyn CipherProducer>,
}

impl RecordTransformer {
    /// Create a transformer from a policy and two primitives.
    pub fn new<D, C>(policy: FieldPolicy, digest: D, cipher: C) -> Self
    where
        D: DigestProducer + 'static,
        C: CipherProducer + 'static,
    {
        Self::from_boxed(policy, Box::new(digest), Box::new(cipher))
    }

    /// Create a transformer from boxed primitives.
    pub fn from_boxed(
        policy: FieldPolicy,
        digest: Box<dyn DigestProducer>,
        cipher: Box<dyn CipherProducer>,
    ) -> Self {
        Self {
            policy,
            digest,
            cipher,
        }
    }

    /// Create a transformer from algorithm selections.
    pub fn with_algorithms(policy: FieldPolicy, digest: DigestAlgorithm, nonce_mode: NonceMode) -> Self {
        Self::from_boxed(policy, digest.producer(), Box::new(AesGcmCipher::new(nonce_mode)))
    }

    /// Get a reference to the policy.
    pub fn policy(&self) -> &FieldPolicy {
        &self.policy
    }

    /// Get the current policy version.
    pub fn policy_version(&self) -> &str {
        &self.policy.schema_version
    }

    /// Digest algorithm in use.
    pub fn digest_algorithm(&self) -> DigestAlgorithm {
        self.digest.algorithm()
    }

    /// Cipher nonce mode in use.
    pub fn nonce_mode(&self) -> NonceMode {
        self.cipher.nonce_mode()
    }

    /// Transform one record.
    ///
    /// Works on a copy; the caller sees either the fully transformed record
    /// or the error for the first field that failed.
    pub fn transform_record(
        &self,
        record: &CardRecord,
        record_index: usize,
        salt: &str,
        key: &str,
    ) -> RecordOutcome {
        let mut out = record.clone();

        for field in CardField::ALL {
            let value = record.get(field);
            let transformed = match self.policy.class_for(field) {
                TransformClass::Digest => self.digest.digest(value, salt),
                TransformClass::Encrypt => self.cipher.encrypt(value, key),
            }
            .map_err(|source| FieldTransformError {
                record_index,
                field,
                source,
            })?;
            out.set(field, transformed);
        }

        Ok(out)
    }

    /// Transform every record, reporting each outcome separately.
    ///
    /// For callers that skip failed records and continue.
    pub fn transform_each(&self, batch: &[CardRecord], salt: &str, key: &str) -> Vec<RecordOutcome> {
        self.transform_range(batch, 0, salt, key)
    }

    /// Transform a batch, stopping at the first failed record.
    pub fn transform(&self, batch: &[CardRecord], salt: &str, key: &str) -> Result<RecordBatch> {
        batch
            .iter()
            .enumerate()
            .map(|(i, record)| self.transform_record(record, i, salt, key))
            .collect::<std::result::Result<RecordBatch, _>>()
            .map_err(RedactionError::from)
    }

    /// Transform a batch across up to `workers` threads.
    ///
    /// The batch is split into contiguous chunks, one per thread, and the
    /// chunk results are concatenated in input order.
    pub fn transform_parallel(
        &self,
        batch: &[CardRecord],
        salt: &str,
        key: &str,
        workers: usize,
    ) -> Vec<RecordOutcome> {
        let workers = workers.max(1).min(batch.len().max(1));
        if workers == 1 {
            return self.transform_each(batch, salt, key);
        }

        let chunk_size = batch.len().div_ceil(workers);

        thread::scope(|s| {
            let handles: Vec<_> = batch
                .chunks(chunk_size)
                .enumerate()
                .map(|(n, chunk)| {
                    let offset = n * chunk_size;
                    s.spawn(move || self.transform_range(chunk, offset, salt, key))
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|h| match h.join() {
                    Ok(outcomes) => outcomes,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        })
    }

    fn transform_range(
        &self,
        records: &[CardRecord],
        offset: usize,
        salt: &str,
        key: &str,
    ) -> Vec<RecordOutcome> {
        records
            .iter()
            .enumerate()
            .map(|(i, record)| self.transform_record(record, offset + i, salt, key))
            .collect()
    }

    /// Decrypt the reversible fields of a transformed record.
    ///
    /// Digested fields are returned as they are.
    pub fn reveal_record(&self, record: &CardRecord, record_index: usize, key: &str) -> RecordOutcome {
        let mut out = record.clone();

        for field in self.policy.fields_in(TransformClass::Encrypt) {
            let plaintext = self
                .cipher
                .decrypt(record.get(field), key)
                .map_err(|source| FieldTransformError {
                    record_index,
                    field,
                    source,
                })?;
            out.set(field, plaintext);
        }

        Ok(out)
    }

    /// Decrypt the reversible fields of every record, stopping at the first failure.
    pub fn reveal(&self, batch: &[CardRecord], key: &str) -> Result<RecordBatch> {
        batch
            .iter()
            .enumerate()
            .map(|(i, record)| self.reveal_record(record, i, key))
            .collect::<std::result::Result<RecordBatch, _>>()
            .map_err(RedactionError::from)
    }

    /// Check a candidate value against the stored digest of a digested field.
    pub fn matches_digest(
        &self,
        field: CardField,
        candidate: &str,
        salt: &str,
        stored: &str,
    ) -> Result<bool> {
        if self.policy.class_for(field) != TransformClass::Digest {
            return Err(RedactionError::Policy(format!(
                "field '{}' is not digested (class: {})",
                field,
                self.policy.class_for(field)
            )));
        }
        Ok(self.digest.verify(candidate, salt, stored)?)
    }
}

impl Default for RecordTransformer {
    fn default() -> Self {
        Self::new(FieldPolicy::default(), SaltedSha256, AesGcmCipher::default())
    }
}
