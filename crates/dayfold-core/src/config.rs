//! Grouping configuration types.

use std::path::Path;

use chrono::{FixedOffset, Offset, Utc};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default byte threshold an archive group must exceed (500 MiB).
pub const DEFAULT_ARCHIVE_MIN_BYTES: u64 = 500 * 1024 * 1024;

/// Default object threshold an archive group must exceed.
pub const DEFAULT_ARCHIVE_MIN_OBJECTS: u64 = 20;

/// Default name of the directory holding files without capture metadata.
pub const DEFAULT_UNCLASSIFIED_KEY: &str = "No metadata";

const SECONDS_PER_DAY: i32 = 24 * 60 * 60;

/// What to do with day directories still pending when grouping ends.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum LeftoverPolicy {
    /// Leave them as plain day directories.
    #[default]
    Keep,
    /// Turn them into their own, possibly undersized, archive.
    Flush,
    /// Fold them into the preceding archive of the same month, else keep.
    MergePrevious,
}

/// Configuration for building and grouping a tree.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[serde(default)]
pub struct GroupingConfig {
    /// A group is flushed once its bytes exceed this (and objects exceed theirs).
    #[builder(default = "DEFAULT_ARCHIVE_MIN_BYTES")]
    pub archive_min_bytes: u64,

    /// A group is flushed once its objects exceed this (and bytes exceed theirs).
    #[builder(default = "DEFAULT_ARCHIVE_MIN_OBJECTS")]
    pub archive_min_objects: u64,

    /// Fixed timezone offset used to split capture times into dates.
    #[builder(default = "0")]
    pub utc_offset_secs: i32,

    /// Key of the directory for files without capture metadata.
    #[builder(default = "DEFAULT_UNCLASSIFIED_KEY.to_string()")]
    pub unclassified_key: String,

    /// Handling of the trailing group after traversal.
    #[builder(default)]
    pub leftover_policy: LeftoverPolicy,
}

fn check_offset(secs: i32) -> Result<(), String> {
    if secs <= -SECONDS_PER_DAY || secs >= SECONDS_PER_DAY {
        return Err(format!(
            "UTC offset must be within ±{} seconds, got {secs}",
            SECONDS_PER_DAY - 1
        ));
    }
    Ok(())
}

fn check_unclassified_key(key: &str) -> Result<(), String> {
    if key.is_empty() {
        return Err("Unclassified directory key cannot be empty".to_string());
    }
    Ok(())
}

impl GroupingConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(offset) = self.utc_offset_secs {
            check_offset(offset)?;
        }
        if let Some(ref key) = self.unclassified_key {
            check_unclassified_key(key)?;
        }
        Ok(())
    }
}

impl GroupingConfig {
    /// Create a new config builder.
    pub fn builder() -> GroupingConfigBuilder {
        GroupingConfigBuilder::default()
    }

    /// Check a config that did not come through the builder.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_offset(self.utc_offset_secs).map_err(ConfigError::invalid)?;
        check_unclassified_key(&self.unclassified_key).map_err(ConfigError::invalid)?;
        Ok(())
    }

    /// Parse and validate a TOML document. Missing fields take defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Timezone used for date decomposition.
    pub fn timezone(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_secs).unwrap_or_else(|| Utc.fix())
    }

    /// Whether a group with these totals crosses both thresholds.
    pub fn exceeds_thresholds(&self, bytes: u64, objects: u64) -> bool {
        bytes > self.archive_min_bytes && objects > self.archive_min_objects
    }
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            archive_min_bytes: DEFAULT_ARCHIVE_MIN_BYTES,
            archive_min_objects: DEFAULT_ARCHIVE_MIN_OBJECTS,
            utc_offset_secs: 0,
            unclassified_key: DEFAULT_UNCLASSIFIED_KEY.to_string(),
            leftover_policy: LeftoverPolicy::Keep,
        }
    }
}
