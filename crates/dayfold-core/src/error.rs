//! Error types for configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or validating a [`GroupingConfig`].
///
/// [`GroupingConfig`]: crate::GroupingConfig
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field holds a value outside its allowed range.
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    /// The config file is not valid TOML for this schema.
    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config file could not be read.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Create an invalid-value error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}
