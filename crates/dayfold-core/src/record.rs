//! Upload records handed to the tree builder.

use chrono::{DateTime, Datelike, FixedOffset};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// One uploaded object waiting to be grouped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRecord {
    /// Object identifier, unique within a batch.
    pub object_key: CompactString,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Capture time in epoch seconds. `None` is distinct from zero.
    #[serde(default)]
    pub taken_at_sec: Option<i64>,
}

impl UploadRecord {
    /// Create a record with a capture timestamp.
    pub fn dated(key: impl Into<CompactString>, size_bytes: u64, taken_at_sec: i64) -> Self {
        Self {
            object_key: key.into(),
            size_bytes,
            taken_at_sec: Some(taken_at_sec),
        }
    }

    /// Create a record without capture metadata.
    pub fn undated(key: impl Into<CompactString>, size_bytes: u64) -> Self {
        Self {
            object_key: key.into(),
            size_bytes,
            taken_at_sec: None,
        }
    }

    /// Calendar date of capture in the given timezone.
    ///
    /// `None` when the record has no timestamp or the timestamp is outside
    /// the representable calendar range.
    pub fn capture_date(&self, tz: &FixedOffset) -> Option<CalendarDate> {
        self.taken_at_sec
            .and_then(|secs| CalendarDate::from_timestamp(secs, tz))
    }
}

/// A year/month/day triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CalendarDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl CalendarDate {
    /// Split an epoch timestamp into a date in `tz`.
    ///
    /// `None` when either the UTC instant or its local wall-clock time falls
    /// outside chrono's calendar range.
    pub fn from_timestamp(secs: i64, tz: &FixedOffset) -> Option<Self> {
        let local = DateTime::from_timestamp(secs, 0)?
            .naive_utc()
            .checked_add_offset(*tz)?;
        Some(Self {
            year: local.year(),
            month: local.month(),
            day: local.day(),
        })
    }
}
