//! Core types for dayfold.
//!
//! This crate provides the object model (files, directories and archives),
//! the naturally ordered node tree, the upload record type, and the builder
//! that lays records out as a `/year/month/day/` hierarchy.

mod config;
mod error;
mod node;
mod record;
mod tree;

pub use config::{
    DEFAULT_ARCHIVE_MIN_BYTES, DEFAULT_ARCHIVE_MIN_OBJECTS, DEFAULT_UNCLASSIFIED_KEY,
    GroupingConfig, GroupingConfigBuilder, LeftoverPolicy,
};
pub use error::ConfigError;
pub use node::{Archive, Dir, DirLevel, File, Node, NodeKey, Object};
pub use record::{CalendarDate, UploadRecord};
pub use tree::{ArchiveEntry, ObjectTree, ROOT_KEY, TreeStats};
