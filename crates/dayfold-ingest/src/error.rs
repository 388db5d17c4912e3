//! Error and warning types for record loading.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that stop a batch from loading.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The record file could not be read.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON array of records could not be parsed.
    #[error("Malformed record list: {0}")]
    Malformed(#[source] serde_json::Error),

    /// One line of a JSON-lines file could not be parsed.
    #[error("Malformed record on line {line}: {source}")]
    MalformedLine {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

impl IngestError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Kind of ingest warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Record had an empty object key and was dropped.
    EmptyKey,
    /// Another record in the batch already used this key.
    DuplicateKey,
    /// Timestamp cannot be placed on a calendar; the record is treated as undated.
    InvalidTimestamp,
}

/// Non-fatal data-quality issue found while loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestWarning {
    /// Position of the record in the batch.
    pub index: usize,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl IngestWarning {
    /// Create a new warning.
    pub fn new(index: usize, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            index,
            message: message.into(),
            kind,
        }
    }

    /// Create an empty key warning.
    pub fn empty_key(index: usize) -> Self {
        Self::new(index, "Empty object key, record dropped", WarningKind::EmptyKey)
    }

    /// Create a duplicate key warning.
    pub fn duplicate_key(index: usize, key: &str) -> Self {
        Self::new(
            index,
            format!("Duplicate object key: {key}"),
            WarningKind::DuplicateKey,
        )
    }

    /// Create an invalid timestamp warning.
    pub fn invalid_timestamp(index: usize, key: &str, secs: i64) -> Self {
        Self::new(
            index,
            format!("Timestamp {secs} of {key} is out of range, treating as undated"),
            WarningKind::InvalidTimestamp,
        )
    }
}
