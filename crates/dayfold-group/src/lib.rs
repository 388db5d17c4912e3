//! Aggregation and archive grouping for dayfold.
//!
//! Grouping a batch of upload records is a fixed pipeline over one
//! in-memory tree:
//!
//! 1. **Build** - lay records out as `/year/month/day/file`
//!    ([`ObjectTree::from_records`])
//! 2. **Aggregate** - annotate every directory with the bytes and file count
//!    beneath it ([`aggregate`])
//! 3. **Group** - fold runs of day directories into archives that exceed the
//!    configured thresholds, never spanning two months
//!    ([`ArchiveGrouper::group_by_day`])
//!
//! ```rust
//! use dayfold_core::{GroupingConfig, UploadRecord};
//! use dayfold_group::plan_archives;
//!
//! let records = vec![
//!     UploadRecord::dated("beach.jpg", 4_000_000, 1_693_310_400),
//!     UploadRecord::undated("scan.png", 120_000),
//! ];
//! let grouped = plan_archives(&records, &GroupingConfig::default());
//!
//! assert_eq!(grouped.totals.objects, 2);
//! assert!(grouped.report.archives.is_empty());
//! ```

mod aggregate;
mod grouper;
mod naming;

pub use aggregate::{Totals, aggregate};
pub use grouper::{
    ArchiveGrouper, ArchivePlan, FlushReason, GroupingReport, PendingGroup, apply_plans,
};
pub use naming::archive_name;

use serde::{Deserialize, Serialize};

// Re-export core types
pub use dayfold_core::{GroupingConfig, LeftoverPolicy, ObjectTree, UploadRecord};

/// Result of running the full pipeline over a batch of records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupedTree {
    /// The rewritten tree.
    pub tree: ObjectTree,
    /// Totals of the batch, computed before grouping.
    pub totals: Totals,
    /// Archives created and any trailing days left ungrouped.
    pub report: GroupingReport,
}

/// Build, aggregate and group a batch of records.
pub fn plan_archives(records: &[UploadRecord], config: &GroupingConfig) -> GroupedTree {
    let mut tree = ObjectTree::from_records(records, config);
    let totals = aggregate(&mut tree);
    tracing::info!(
        objects = totals.objects,
        bytes = totals.bytes,
        "grouping new objects"
    );
    let report = ArchiveGrouper::with_config(config.clone()).group_by_day(&mut tree);
    GroupedTree {
        tree,
        totals,
        report,
    }
}
