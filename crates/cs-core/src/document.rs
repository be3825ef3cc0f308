//! Card document I/O.
//!
//! A card document is a JSON object with a single `Cards` array of records,
//! each using the PascalCase field names of the source system.

use cs_redact::{CardRecord, RecordBatch};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Suffix added to the input stem for transformed output.
pub const PROCESSED_SUFFIX: &str = "_processed";

/// Suffix added to the input stem for revealed output.
pub const REVEALED_SUFFIX: &str = "_revealed";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Card document not found: {path}")]
    NotFound { path: PathBuf },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid card document {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize card document: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Top-level card document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDocument {
    #[serde(rename = "Cards")]
    pub cards: RecordBatch,
}

impl CardDocument {
    pub fn new(cards: RecordBatch) -> Self {
        Self { cards }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Parse a document from a JSON string.
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }

    /// Pretty-printed JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl From<Vec<CardRecord>> for CardDocument {
    fn from(cards: Vec<CardRecord>) -> Self {
        Self::new(cards)
    }
}

/// Read a card document from disk.
pub fn read_document(path: &Path) -> Result<CardDocument, DocumentError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DocumentError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            DocumentError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;

    CardDocument::from_json(&content).map_err(|e| DocumentError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Write a card document to disk as pretty-printed JSON.
///
/// The document is written to a sibling temp file and renamed into place so
/// a failed run never leaves a half-written output.
pub fn write_document(path: &Path, doc: &CardDocument) -> Result<(), DocumentError> {
    let mut content = doc.to_json_pretty().map_err(DocumentError::Serialize)?;
    content.push('\n');

    let tmp = sibling_with_suffix(path, ".tmp");
    let io_err = |source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    };
    std::fs::write(&tmp, content).map_err(io_err)?;
    std::fs::rename(&tmp, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        io_err(e)
    })
}

/// Default output path for a processed document.
///
/// `cards.json` becomes `cards_processed.json`. A file without a `.json`
/// extension gets `_processed.json` appended to its full name.
pub fn processed_path(input: &Path) -> PathBuf {
    derived_path(input, PROCESSED_SUFFIX)
}

/// Default output path for a revealed document.
pub fn revealed_path(input: &Path) -> PathBuf {
    derived_path(input, REVEALED_SUFFIX)
}

fn derived_path(input: &Path, suffix: &str) -> PathBuf {
    let is_json = input
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let base = if is_json {
        input.file_stem()
    } else {
        input.file_name()
    };

    let mut name = base.map(OsString::from).unwrap_or_default();
    name.push(suffix);
    name.push(".json");
    input.with_file_name(name)
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}
