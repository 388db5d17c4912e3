//! Upload record loading for dayfold.
//!
//! Reads a batch of upload records from disk and validates it before it is
//! handed to the tree builder. Two layouts are supported:
//!
//! - a JSON array of records (`*.json`, or any other extension)
//! - JSON lines, one record per line (`*.jsonl`, `*.ndjson`)
//!
//! Each record carries `object_key`, `size_bytes` and an optional
//! `taken_at_sec`. Data-quality problems are reported as warnings, never
//! as errors:
//!
//! - **Empty keys** - the record is dropped
//! - **Duplicate keys** - kept; the tree builder keeps the first
//! - **Out-of-range timestamps** - kept; the record ends up unclassified.
//!   Range is checked in the configured timezone
//!
//! # Example
//!
//! ```rust,no_run
//! use dayfold_core::GroupingConfig;
//! use dayfold_ingest::load_records;
//!
//! let report = load_records("uploads.jsonl", &GroupingConfig::default()).unwrap();
//! println!("{} records, {} warnings", report.records.len(), report.warnings.len());
//! ```

mod error;
mod loader;

pub use error::{IngestError, IngestWarning, WarningKind};
pub use loader::{IngestReport, RecordFormat, load_records, parse_records};

// Re-export core types for convenience
pub use dayfold_core::UploadRecord;
