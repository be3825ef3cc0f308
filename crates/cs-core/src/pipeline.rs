//! Batch driver: read a card document, transform it, write the result.
//!
//! Each entry point returns a serializable report for stdout. Records that fail
//! are either fatal ([`OnError::Abort`], nothing written) or dropped from the
//! output and listed in the report ([`OnError::Skip`]).

use crate::config::{ConfigError, OnError, SealConfig};
use crate::document::{read_document, write_document, CardDocument, DocumentError};
use crate::exit_codes::ExitCode;
use chrono::{DateTime, Utc};
use cs_redact::{
    CardField, CardRecord, DigestAlgorithm, FieldTransformError, NonceMode, RecordOutcome,
    RedactionError,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("run aborted: {0}")]
    Record(#[from] FieldTransformError),

    #[error(transparent)]
    Redaction(#[from] RedactionError),
}

impl PipelineError {
    /// Exit code for this failure.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            PipelineError::Config(_) => ExitCode::ConfigError,
            PipelineError::Document(DocumentError::Parse { .. }) => ExitCode::ArgsError,
            PipelineError::Document(DocumentError::Serialize(_)) => ExitCode::InternalError,
            PipelineError::Document(_) => ExitCode::IoError,
            PipelineError::Record(_) => ExitCode::RecordError,
            PipelineError::Redaction(RedactionError::Policy(_)) => ExitCode::ArgsError,
            PipelineError::Redaction(RedactionError::FieldTransform(_)) => ExitCode::RecordError,
            PipelineError::Redaction(RedactionError::Io(_)) => ExitCode::IoError,
            PipelineError::Redaction(_) => ExitCode::InternalError,
        }
    }
}

/// Which direction a batch went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Process,
    Reveal,
}

/// One skipped record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFailure {
    pub record_index: usize,
    pub field: CardField,
    /// Primitive error text; never contains field values.
    pub error: String,
}

impl From<&FieldTransformError> for RecordFailure {
    fn from(err: &FieldTransformError) -> Self {
        Self {
            record_index: err.record_index,
            field: err.field,
            error: err.source.to_string(),
        }
    }
}

/// Summary of one batch run, printed as JSON on stdout.
///
/// Under [`OnError::Skip`] the written document is compacted: failed records
/// are left out, so output record `i` matches input record `i` only when
/// `failures` is empty. `failures[].record_index` always counts input records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub run_id: String,
    pub operation: Operation,
    pub timestamp: DateTime<Utc>,
    pub input: PathBuf,
    pub output: PathBuf,
    pub records_in: usize,
    pub records_transformed: usize,
    pub records_skipped: usize,
    pub failures: Vec<RecordFailure>,
    pub digest_algorithm: DigestAlgorithm,
    pub nonce_mode: NonceMode,
    pub policy_version: String,
    pub on_error: OnError,
    pub workers: usize,
    pub duration_ms: u64,
}

impl BatchReport {
    /// Clean when nothing was skipped, partial otherwise.
    pub fn exit_code(&self) -> ExitCode {
        if self.records_skipped == 0 {
            ExitCode::Clean
        } else {
            ExitCode::PartialFail
        }
    }
}

/// Result of checking a candidate against a stored digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    pub field: CardField,
    pub digest_algorithm: DigestAlgorithm,
    pub matches: bool,
}

impl VerifyReport {
    pub fn exit_code(&self) -> ExitCode {
        if self.matches {
            ExitCode::Clean
        } else {
            ExitCode::DigestMismatch
        }
    }
}

/// Transform `input` and write the result to `output`.
pub fn run_process(
    config: &SealConfig,
    input: &Path,
    output: &Path,
    run_id: &str,
) -> Result<BatchReport, PipelineError> {
    run_batch(config, Operation::Process, input, output, run_id)
}

/// Decrypt the reversible fields of `input` and write the result to `output`.
pub fn run_reveal(
    config: &SealConfig,
    input: &Path,
    output: &Path,
    run_id: &str,
) -> Result<BatchReport, PipelineError> {
    run_batch(config, Operation::Reveal, input, output, run_id)
}

/// Check `candidate` against `stored` for a digested field.
pub fn run_verify(
    config: &SealConfig,
    field: CardField,
    candidate: &str,
    stored: &str,
) -> Result<VerifyReport, PipelineError> {
    let transformer = config.transformer();
    let matches = transformer.matches_digest(field, candidate, config.secrets.salt(), stored)?;
    debug!(field = %field, matches, "digest verified");

    Ok(VerifyReport {
        field,
        digest_algorithm: config.digest,
        matches,
    })
}

fn run_batch(
    config: &SealConfig,
    operation: Operation,
    input: &Path,
    output: &Path,
    run_id: &str,
) -> Result<BatchReport, PipelineError> {
    let started = Instant::now();
    let doc = read_document(input)?;
    let transformer = config.transformer();

    info!(
        run_id,
        operation = ?operation,
        records = doc.len(),
        digest = %config.digest,
        nonce_mode = %config.nonce_mode,
        workers = config.workers,
        "batch started"
    );

    let outcomes: Vec<RecordOutcome> = match operation {
        Operation::Process => transformer.transform_parallel(
            &doc.cards,
            config.secrets.salt(),
            config.secrets.key(),
            config.workers,
        ),
        Operation::Reveal => doc
            .cards
            .iter()
            .enumerate()
            .map(|(i, record)| transformer.reveal_record(record, i, config.secrets.key()))
            .collect(),
    };

    let (records, failures) = partition_outcomes(outcomes);

    if let Some(first) = failures.first() {
        match config.on_error {
            OnError::Abort => {
                warn!(
                    run_id,
                    record_index = first.record_index,
                    field = %first.field,
                    "record failed, aborting"
                );
                return Err(PipelineError::Record(first.clone()));
            }
            OnError::Skip => {
                for failure in &failures {
                    warn!(
                        run_id,
                        record_index = failure.record_index,
                        field = %failure.field,
                        "record skipped"
                    );
                }
            }
        }
    }

    let written = records.len();
    write_document(output, &CardDocument::new(records))?;

    let report = BatchReport {
        run_id: run_id.to_string(),
        operation,
        timestamp: Utc::now(),
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        records_in: doc.len(),
        records_transformed: written,
        records_skipped: failures.len(),
        failures: failures.iter().map(RecordFailure::from).collect(),
        digest_algorithm: transformer.digest_algorithm(),
        nonce_mode: transformer.nonce_mode(),
        policy_version: transformer.policy_version().to_string(),
        on_error: config.on_error,
        workers: config.workers,
        duration_ms: started.elapsed().as_millis() as u64,
    };

    info!(
        run_id,
        transformed = report.records_transformed,
        skipped = report.records_skipped,
        duration_ms = report.duration_ms,
        "batch finished"
    );
    Ok(report)
}

/// Split outcomes into surviving records and failures, both in input order.
fn partition_outcomes(outcomes: Vec<RecordOutcome>) -> (Vec<CardRecord>, Vec<FieldTransformError>) {
    let mut records = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(record) => records.push(record),
            Err(err) => failures.push(err),
        }
    }
    (records, failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Secrets;
    use crate::document::processed_path;
    use cs_redact::{AesGcmCipher, CipherProducer, DigestProducer, FieldPolicy, SaltedSha256};
    use tempfile::TempDir;

    fn config(on_error: OnError, workers: usize) -> SealConfig {
        SealConfig {
            digest: DigestAlgorithm::SaltedSha256,
            nonce_mode: NonceMode::Random,
            on_error,
            workers,
            policy: FieldPolicy::default(),
            policy_path: None,
            config_path: None,
            secrets: Secrets::new("S".to_string(), "K".to_string()),
        }
    }

    fn ann() -> CardRecord {
        CardRecord::new("Ann", "Lee", "123", "07", "2026", "4111111111111111")
    }

    fn write_input(dir: &TempDir, records: Vec<CardRecord>) -> PathBuf {
        let path = dir.path().join("cards.json");
        write_document(&path, &CardDocument::new(records)).unwrap();
        path
    }

    #[test]
    fn test_process_writes_transformed_document() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, vec![ann()]);
        let output = processed_path(&input);

        let report = run_process(&config(OnError::Abort, 1), &input, &output, "run-test").unwrap();
        assert_eq!(report.records_in, 1);
        assert_eq!(report.records_transformed, 1);
        assert_eq!(report.records_skipped, 0);
        assert_eq!(report.exit_code(), ExitCode::Clean);
        assert_eq!(report.policy_version, "1.0.0");

        let out = read_document(&output).unwrap();
        assert_eq!(out.cards[0].number, SaltedSha256.digest("4111111111111111", "S").unwrap());
        assert_eq!(AesGcmCipher::random().decrypt(&out.cards[0].name, "K").unwrap(), "Ann");
    }

    #[test]
    fn test_process_then_reveal() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, vec![ann(), CardRecord::new("Bo", "Yu", "999", "12", "2030", "5500000000000004")]);
        let processed = dir.path().join("p.json");
        let revealed = dir.path().join("r.json");
        let cfg = config(OnError::Abort, 2);

        run_process(&cfg, &input, &processed, "run-a").unwrap();
        let report = run_reveal(&cfg, &processed, &revealed, "run-b").unwrap();
        assert_eq!(report.operation, Operation::Reveal);

        let back = read_document(&revealed).unwrap();
        assert_eq!(back.cards[0].name, "Ann");
        assert_eq!(back.cards[1].family, "Yu");
        assert_eq!(back.cards[1].month, "12");
        // Digests stay digests.
        assert_ne!(back.cards[0].cvc, "123");
    }

    #[test]
    fn test_reveal_abort_on_foreign_ciphertext() {
        let dir = TempDir::new().unwrap();
        // Plaintext input is not valid ciphertext.
        let input = write_input(&dir, vec![ann()]);
        let output = dir.path().join("r.json");

        let err = run_reveal(&config(OnError::Abort, 1), &input, &output, "run-c").unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::RecordError);
        assert!(!output.exists());
    }

    #[test]
    fn test_reveal_skip_reports_failures() {
        let dir = TempDir::new().unwrap();
        let cfg = config(OnError::Skip, 1);
        let good = dir.path().join("good.json");
        write_document(&good, &CardDocument::new(vec![ann(), ann()])).unwrap();
        let processed = dir.path().join("p.json");
        run_process(&cfg, &good, &processed, "run-d").unwrap();

        // Corrupt the second record's name.
        let mut doc = read_document(&processed).unwrap();
        doc.cards[1].name = "not-ciphertext".to_string();
        write_document(&processed, &doc).unwrap();

        let revealed = dir.path().join("r.json");
        let report = run_reveal(&cfg, &processed, &revealed, "run-e").unwrap();
        assert_eq!(report.records_transformed, 1);
        assert_eq!(report.records_skipped, 1);
        assert_eq!(report.failures[0].record_index, 1);
        assert_eq!(report.failures[0].field, CardField::Name);
        assert!(!report.failures[0].error.contains("not-ciphertext"));
        assert_eq!(report.exit_code(), ExitCode::PartialFail);
        assert_eq!(read_document(&revealed).unwrap().len(), 1);
    }

    #[test]
    fn test_skip_output_is_compacted() {
        let dir = TempDir::new().unwrap();
        let cfg = config(OnError::Skip, 1);
        let input = write_input(
            &dir,
            vec![
                ann(),
                CardRecord::new("Bo", "Yu", "042", "12", "2030", "5500000000000004"),
                CardRecord::new("Cy", "Ng", "777", "01", "2031", "340000000000009"),
            ],
        );
        let processed = dir.path().join("p.json");
        run_process(&cfg, &input, &processed, "run-f").unwrap();

        let mut doc = read_document(&processed).unwrap();
        doc.cards[1].year = "garbage".to_string();
        write_document(&processed, &doc).unwrap();

        let revealed = dir.path().join("r.json");
        let report = run_reveal(&cfg, &processed, &revealed, "run-g").unwrap();
        assert_eq!(report.records_in, 3);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].record_index, 1);

        let back = read_document(&revealed).unwrap();
        let names: Vec<&str> = back.cards.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Ann", "Cy"]);
    }

    #[test]
    fn test_empty_document() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, vec![]);
        let output = dir.path().join("out.json");

        let report = run_process(&config(OnError::Abort, 4), &input, &output, "run-f").unwrap();
        assert_eq!(report.records_in, 0);
        assert!(read_document(&output).unwrap().is_empty());
    }

    #[test]
    fn test_missing_input() {
        let dir = TempDir::new().unwrap();
        let err = run_process(
            &config(OnError::Abort, 1),
            &dir.path().join("absent.json"),
            &dir.path().join("out.json"),
            "run-g",
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::IoError);
    }

    #[test]
    fn test_malformed_input() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("bad.json");
        std::fs::write(&input, r#"{"Cards": [{"Name": 1}]}"#).unwrap();
        let err = run_process(&config(OnError::Abort, 1), &input, &dir.path().join("o.json"), "run-h")
            .unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::ArgsError);
    }

    #[test]
    fn test_verify() {
        let cfg = config(OnError::Abort, 1);
        let stored = SaltedSha256.digest("123", "S").unwrap();

        let hit = run_verify(&cfg, CardField::Cvc, "123", &stored).unwrap();
        assert!(hit.matches);
        assert_eq!(hit.exit_code(), ExitCode::Clean);

        let miss = run_verify(&cfg, CardField::Cvc, "124", &stored).unwrap();
        assert!(!miss.matches);
        assert_eq!(miss.exit_code(), ExitCode::DigestMismatch);
    }

    #[test]
    fn test_verify_rejects_encrypted_field() {
        let err = run_verify(&config(OnError::Abort, 1), CardField::Name, "Ann", "x").unwrap_err();
        assert_eq!(err.exit_code(), ExitCode::ArgsError);
    }

    #[test]
    fn test_report_serializes() {
        let dir = TempDir::new().unwrap();
        let input = write_input(&dir, vec![ann()]);
        let report = run_process(&config(OnError::Abort, 1), &input, &dir.path().join("o.json"), "run-i")
            .unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["run_id"], "run-i");
        assert_eq!(json["operation"], "process");
        assert_eq!(json["digest_algorithm"], "salted-sha256");
        assert_eq!(json["nonce_mode"], "random");
        assert_eq!(json["on_error"], "abort");
        let text = json.to_string();
        assert!(!text.contains("4111111111111111"));
    }
}
