//! cardseal core library
//!
//! Everything the `cardseal` binary needs around the redaction engine:
//! - Exit codes for CLI operations
//! - Configuration and secret resolution
//! - Structured logging setup
//! - Card document reading and writing
//! - The batch pipeline that ties them together
//!
//! The binary entry point is in `main.rs`.

pub mod config;
pub mod document;
pub mod exit_codes;
pub mod logging;
pub mod pipeline;

pub use config::{load_config, ConfigError, ConfigOptions, OnError, SealConfig, Secrets};
pub use document::{processed_path, read_document, revealed_path, write_document, CardDocument};
pub use exit_codes::ExitCode;
pub use pipeline::{run_process, run_reveal, run_verify, BatchReport, PipelineError, VerifyReport};
