//! cardseal - field-level protection for payment-card documents
//!
//! Digests the card number and verification code, encrypts the holder and
//! expiry fields, and writes the result next to the input.

use clap::{Args, Parser, Subcommand};
use cs_core::config::{load_config, load_policy, ConfigOptions, OnError};
use cs_core::document::{processed_path, revealed_path};
use cs_core::exit_codes::ExitCode;
use cs_core::logging::{generate_run_id, init_logging, LogConfig, LogFormat, LogLevel};
use cs_core::pipeline::{run_process, run_reveal, run_verify, PipelineError};
use cs_redact::{CardField, DigestAlgorithm, NonceMode};
use serde::Serialize;
use std::path::PathBuf;

/// Protect payment-card fields with salted digests and authenticated encryption
#[derive(Parser)]
#[command(name = "cardseal")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Config file (default: $XDG_CONFIG_HOME/cardseal/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Digest salt (prefer CARDSEAL_SALT)
    #[arg(long, global = true)]
    salt: Option<String>,

    /// Encryption key text (prefer CARDSEAL_KEY)
    #[arg(long, global = true)]
    key: Option<String>,

    /// Digest algorithm: salted-sha256 or hmac-sha256
    #[arg(long, global = true)]
    digest: Option<DigestAlgorithm>,

    /// Nonce mode: random or synthetic (deterministic, equal values encrypt equally)
    #[arg(long, global = true)]
    nonce_mode: Option<NonceMode>,

    /// On a failing record: abort (write nothing) or skip (drop failed
    /// records; the output is compacted and the report lists input indices)
    #[arg(long, global = true)]
    on_error: Option<OnError>,

    /// Worker threads for transformation
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Field policy JSON file
    #[arg(long, global = true)]
    policy: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format on stderr: human or json
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

impl GlobalOpts {
    fn config_options(&self) -> ConfigOptions {
        ConfigOptions {
            config_path: self.config.clone(),
            salt: self.salt.clone(),
            key: self.key.clone(),
            digest: self.digest,
            nonce_mode: self.nonce_mode,
            on_error: self.on_error,
            workers: self.workers,
            policy_path: self.policy.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Transform a card document (digest + encrypt)
    Process(ProcessArgs),

    /// Decrypt the reversible fields of a processed document
    Reveal(RevealArgs),

    /// Check a value against a stored digest
    Verify(VerifyArgs),

    /// Print the effective field policy
    Policy,
}

#[derive(Args, Debug)]
struct ProcessArgs {
    /// Input card document
    input: PathBuf,

    /// Output path (default: <input stem>_processed.json)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RevealArgs {
    /// Processed card document
    input: PathBuf,

    /// Output path (default: <input stem>_revealed.json)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct VerifyArgs {
    /// Digested field the value belongs to (CVC or Number)
    #[arg(long)]
    field: CardField,

    /// Candidate plaintext
    #[arg(long)]
    value: String,

    /// Stored digest text
    #[arg(long)]
    digest_text: String,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            let _ = err.print();
            std::process::exit(code.as_i32());
        }
    };

    let log_config = LogConfig::from_env(
        LogLevel::from_verbosity(cli.global.verbose, cli.global.quiet),
        cli.global.log_format,
    );
    init_logging(&log_config);

    let run_id = generate_run_id();
    tracing::debug!(run_id = %run_id, "cardseal starting");

    let exit_code = match run(&cli, &run_id) {
        Ok(code) => code,
        Err(err) => output_error(&run_id, &err),
    };

    std::process::exit(exit_code.as_i32());
}

fn run(cli: &Cli, run_id: &str) -> Result<ExitCode, PipelineError> {
    match &cli.command {
        Commands::Process(args) => {
            let config = load_config(&cli.global.config_options())?;
            let output = args
                .output
                .clone()
                .unwrap_or_else(|| processed_path(&args.input));
            let report = run_process(&config, &args.input, &output, run_id)?;
            print_json(&report)?;
            Ok(report.exit_code())
        }
        Commands::Reveal(args) => {
            let config = load_config(&cli.global.config_options())?;
            let output = args
                .output
                .clone()
                .unwrap_or_else(|| revealed_path(&args.input));
            let report = run_reveal(&config, &args.input, &output, run_id)?;
            print_json(&report)?;
            Ok(report.exit_code())
        }
        Commands::Verify(args) => {
            let config = load_config(&cli.global.config_options())?;
            let report = run_verify(&config, args.field, &args.value, &args.digest_text)?;
            print_json(&report)?;
            Ok(report.exit_code())
        }
        Commands::Policy => {
            let (policy, _) = load_policy(&cli.global.config_options())?;
            print_json(&policy)?;
            Ok(ExitCode::Clean)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), PipelineError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| PipelineError::Redaction(e.into()))?;
    println!("{}", text);
    Ok(())
}

fn output_error(run_id: &str, error: &PipelineError) -> ExitCode {
    let exit_code = error.exit_code();
    tracing::debug!(run_id = %run_id, code = exit_code.code_name(), "{}", error);

    let response = serde_json::json!({
        "run_id": run_id,
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "status": "error",
        "error": {
            "code": exit_code.code_name(),
            "exit_code": exit_code.as_i32(),
            "message": error.to_string(),
        }
    });
    eprintln!("{}", response);

    exit_code
}
