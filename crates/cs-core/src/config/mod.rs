//! Configuration loading for cardseal.
//!
//! Resolution order (highest to lowest priority):
//! 1. Explicit CLI flags (via [`ConfigOptions`])
//! 2. Environment variables (`CARDSEAL_SALT`, `CARDSEAL_KEY`, `CARDSEAL_CONFIG`)
//! 3. Config file (`--config`, `$CARDSEAL_CONFIG`, or `<config dir>/cardseal/config.toml`)
//! 4. Built-in defaults
//!
//! Salt and key have no default. A run without both is a [`ConfigError`].

mod secrets;

pub use secrets::Secrets;

use cs_redact::{DigestAlgorithm, FieldPolicy, NonceMode, RecordTransformer, RedactionError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config directory name under the platform config home.
const CONFIG_DIR_NAME: &str = "cardseal";

/// Default config file name.
const CONFIG_FILE_NAME: &str = "config.toml";

pub const SALT_ENV: &str = "CARDSEAL_SALT";
pub const KEY_ENV: &str = "CARDSEAL_KEY";
pub const CONFIG_ENV: &str = "CARDSEAL_CONFIG";

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid TOML in config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No {name} configured (use --{name}, ${env}, or the config file)")]
    MissingSecret { name: &'static str, env: &'static str },

    #[error("Configured {name} is empty")]
    EmptySecret { name: &'static str },

    #[error("Invalid policy file {path}: {source}")]
    Policy {
        path: PathBuf,
        #[source]
        source: RedactionError,
    },

    #[error("Invalid value for {name}: {message}")]
    InvalidValue { name: &'static str, message: String },
}

/// What to do when a record fails to transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnError {
    /// Stop at the first failing record and write nothing.
    #[default]
    Abort,
    /// Drop failing records, report them, and write the rest.
    Skip,
}

impl std::str::FromStr for OnError {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "abort" | "fail" => Ok(OnError::Abort),
            "skip" | "continue" => Ok(OnError::Skip),
            _ => Err(format!("unknown error mode: {}", s)),
        }
    }
}

impl std::fmt::Display for OnError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OnError::Abort => write!(f, "abort"),
            OnError::Skip => write!(f, "skip"),
        }
    }
}

/// On-disk config file shape. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub digest: Option<DigestAlgorithm>,
    pub nonce_mode: Option<NonceMode>,
    pub on_error: Option<OnError>,
    pub workers: Option<usize>,
    pub policy_path: Option<PathBuf>,
    /// Accepted, but prefer the environment for secrets.
    pub salt: Option<String>,
    pub key: Option<String>,
}

impl FileConfig {
    /// Parse a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::IoError {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Configuration resolution options (the CLI layer).
#[derive(Debug, Default, Clone)]
pub struct ConfigOptions {
    pub config_path: Option<PathBuf>,
    pub salt: Option<String>,
    pub key: Option<String>,
    pub digest: Option<DigestAlgorithm>,
    pub nonce_mode: Option<NonceMode>,
    pub on_error: Option<OnError>,
    pub workers: Option<usize>,
    pub policy_path: Option<PathBuf>,
}

/// Fully resolved run configuration.
#[derive(Debug, Clone)]
pub struct SealConfig {
    pub digest: DigestAlgorithm,
    pub nonce_mode: NonceMode,
    pub on_error: OnError,
    /// Worker threads; 1 means sequential.
    pub workers: usize,
    pub policy: FieldPolicy,
    pub policy_path: Option<PathBuf>,
    /// Config file that contributed, if any.
    pub config_path: Option<PathBuf>,
    pub secrets: Secrets,
}

impl SealConfig {
    /// Build the record transformer this config describes.
    pub fn transformer(&self) -> RecordTransformer {
        RecordTransformer::with_algorithms(self.policy.clone(), self.digest, self.nonce_mode)
    }
}

/// Load configuration from the process environment.
pub fn load_config(options: &ConfigOptions) -> Result<SealConfig, ConfigError> {
    resolve_config(options, |name| std::env::var(name).ok())
}

/// Load configuration against an arbitrary variable lookup.
pub fn resolve_config<F>(options: &ConfigOptions, lookup: F) -> Result<SealConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let (file, config_path) = load_file_layer(options, &lookup)?;

    let workers = options.workers.or(file.workers).unwrap_or(1);
    if workers == 0 {
        return Err(ConfigError::InvalidValue {
            name: "workers",
            message: "must be at least 1".to_string(),
        });
    }

    let (policy, policy_path) = resolve_policy(options, &file, config_path.as_deref())?;

    let salt = pick_secret("salt", SALT_ENV, &options.salt, &lookup, &file.salt)?;
    let key = pick_secret("key", KEY_ENV, &options.key, &lookup, &file.key)?;

    Ok(SealConfig {
        digest: options.digest.or(file.digest).unwrap_or_default(),
        nonce_mode: options.nonce_mode.or(file.nonce_mode).unwrap_or_default(),
        on_error: options.on_error.or(file.on_error).unwrap_or_default(),
        workers,
        policy,
        policy_path,
        config_path,
        secrets: Secrets::new(salt, key),
    })
}

/// Load only the field policy a run would use. Needs no secrets.
pub fn load_policy(options: &ConfigOptions) -> Result<(FieldPolicy, Option<PathBuf>), ConfigError> {
    let lookup = |name: &str| std::env::var(name).ok();
    let (file, config_path) = load_file_layer(options, &lookup)?;
    resolve_policy(options, &file, config_path.as_deref())
}

/// CLI policy path, else the file's (relative to the file), else the default.
fn resolve_policy(
    options: &ConfigOptions,
    file: &FileConfig,
    config_path: Option<&Path>,
) -> Result<(FieldPolicy, Option<PathBuf>), ConfigError> {
    let policy_path = match (&options.policy_path, &file.policy_path) {
        (Some(path), _) => Some(path.clone()),
        (None, Some(path)) if path.is_relative() => Some(
            config_path
                .and_then(Path::parent)
                .map(|dir| dir.join(path))
                .unwrap_or_else(|| path.clone()),
        ),
        (None, Some(path)) => Some(path.clone()),
        (None, None) => None,
    };

    let policy = match &policy_path {
        Some(path) => FieldPolicy::load(path).map_err(|e| ConfigError::Policy {
            path: path.clone(),
            source: e,
        })?,
        None => FieldPolicy::default(),
    };
    Ok((policy, policy_path))
}

/// Locate and parse the config file, if there is one.
///
/// An explicitly named file must exist; the default location is optional.
fn load_file_layer<F>(
    options: &ConfigOptions,
    lookup: &F,
) -> Result<(FileConfig, Option<PathBuf>), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let explicit = options
        .config_path
        .clone()
        .or_else(|| lookup(CONFIG_ENV).filter(|v| !v.is_empty()).map(PathBuf::from));

    if let Some(path) = explicit {
        let file = FileConfig::load(&path)?;
        return Ok((file, Some(path)));
    }

    match default_config_path(lookup) {
        Some(path) if path.is_file() => {
            let file = FileConfig::load(&path)?;
            Ok((file, Some(path)))
        }
        _ => Ok((FileConfig::default(), None)),
    }
}

/// `$XDG_CONFIG_HOME/cardseal/config.toml`, falling back to `~/.config`.
pub fn default_config_path<F>(lookup: &F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    let base = lookup("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))?;
    Some(base.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

fn pick_secret<F>(
    name: &'static str,
    env: &'static str,
    cli: &Option<String>,
    lookup: &F,
    file: &Option<String>,
) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = cli
        .clone()
        .or_else(|| lookup(env))
        .or_else(|| file.clone())
        .ok_or(ConfigError::MissingSecret { name, env })?;

    if value.is_empty() {
        return Err(ConfigError::EmptySecret { name });
    }
    Ok(value)
}
