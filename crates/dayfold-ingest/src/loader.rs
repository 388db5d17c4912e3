//! JSON and JSON-lines record loading.

use std::collections::HashSet;
use std::path::Path;

use compact_str::CompactString;

use dayfold_core::{GroupingConfig, UploadRecord};

use crate::error::{IngestError, IngestWarning};

/// On-disk layout of a record batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    /// A single JSON array of records.
    Json,
    /// One JSON record per line; blank lines are ignored.
    JsonLines,
}

impl RecordFormat {
    /// Pick a format from the file extension (`.jsonl`/`.ndjson` are lines).
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("jsonl") || ext.eq_ignore_ascii_case("ndjson") => {
                RecordFormat::JsonLines
            }
            _ => RecordFormat::Json,
        }
    }
}

/// Validated records plus the data-quality issues found on the way.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// Records to hand to the tree builder, in input order.
    pub records: Vec<UploadRecord>,
    /// Non-fatal warnings.
    pub warnings: Vec<IngestWarning>,
}

impl IngestReport {
    /// Check if there were any warnings.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Load and validate a record file, detecting the format from its extension.
///
/// Timestamps are checked in the timezone of `config`, the same one the tree
/// builder dates records in.
pub fn load_records(
    path: impl AsRef<Path>,
    config: &GroupingConfig,
) -> Result<IngestReport, IngestError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| IngestError::io(path, e))?;
    let report = parse_records(&content, RecordFormat::from_path(path), config)?;
    tracing::info!(
        path = %path.display(),
        records = report.records.len(),
        warnings = report.warnings.len(),
        "loaded upload records"
    );
    Ok(report)
}

/// Parse and validate records from a string.
pub fn parse_records(
    content: &str,
    format: RecordFormat,
    config: &GroupingConfig,
) -> Result<IngestReport, IngestError> {
    let raw = match format {
        RecordFormat::Json => serde_json::from_str(content).map_err(IngestError::Malformed)?,
        RecordFormat::JsonLines => parse_lines(content)?,
    };
    Ok(validate(raw, config))
}

fn parse_lines(content: &str) -> Result<Vec<UploadRecord>, IngestError> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line)
                .map_err(|source| IngestError::MalformedLine { line: i + 1, source })
        })
        .collect()
}

/// Drop records that cannot be placed in a tree and flag suspicious ones.
fn validate(raw: Vec<UploadRecord>, config: &GroupingConfig) -> IngestReport {
    let tz = config.timezone();
    let mut report = IngestReport::default();
    let mut seen: HashSet<CompactString> = HashSet::with_capacity(raw.len());

    for (index, record) in raw.into_iter().enumerate() {
        if record.object_key.is_empty() {
            report.warnings.push(IngestWarning::empty_key(index));
            continue;
        }
        if !seen.insert(record.object_key.clone()) {
            report
                .warnings
                .push(IngestWarning::duplicate_key(index, &record.object_key));
        }
        if let Some(secs) = record.taken_at_sec {
            if record.capture_date(&tz).is_none() {
                report
                    .warnings
                    .push(IngestWarning::invalid_timestamp(index, &record.object_key, secs));
            }
        }
        report.records.push(record);
    }

    for warning in &report.warnings {
        tracing::warn!(index = warning.index, kind = ?warning.kind, "{}", warning.message);
    }
    report
}
