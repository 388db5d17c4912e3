//! Greedy day-to-archive grouping.
//!
//! Grouping runs in two phases. A read-only depth-first traversal walks the
//! day directories in ascending key order and decides which runs of days
//! become archives ([`ArchivePlan`]). The apply phase then replaces each run
//! with one archive node under the same month directory.
//!
//! A run is closed when its totals exceed both thresholds, or as soon as the
//! traversal enters a different month or year, so no archive spans months.

use std::collections::BTreeMap;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use dayfold_core::{
    Archive, DirLevel, GroupingConfig, LeftoverPolicy, Node, Object, ObjectTree,
};

use crate::aggregate::Totals;
use crate::naming::archive_name;

/// Why a run of day directories became an archive.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FlushReason {
    /// Bytes and objects both exceeded their thresholds.
    Threshold,
    /// The traversal entered a new month or year.
    Boundary,
    /// The run was still pending when traversal ended.
    Leftover,
}

/// Day directories accumulated under one month but not yet archived.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingGroup {
    /// Keys from the root to the month directory holding the days.
    pub parent_path: Vec<CompactString>,
    /// Day keys in traversal order.
    pub days: Vec<CompactString>,
    /// Totals of the accumulated days.
    pub totals: Totals,
}

impl PendingGroup {
    /// Check whether no day has been accumulated.
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// A decided archive: which day directories fold into it, and where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivePlan {
    /// Generated archive name.
    pub name: CompactString,
    /// Keys from the root to the month directory that will hold the archive.
    pub parent_path: Vec<CompactString>,
    /// Absorbed day keys in traversal order.
    pub days: Vec<CompactString>,
    /// Totals of the absorbed days.
    pub totals: Totals,
    /// What closed the run.
    pub reason: FlushReason,
}

/// Outcome of a grouping pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingReport {
    /// Archives in traversal order.
    pub archives: Vec<ArchivePlan>,
    /// Trailing days left as plain directories, if any.
    pub leftover: Option<PendingGroup>,
}

impl GroupingReport {
    /// Totals across every planned archive.
    pub fn archived_totals(&self) -> Totals {
        self.archives
            .iter()
            .fold(Totals::default(), |acc, plan| acc + plan.totals)
    }

    /// Number of day directories absorbed into archives.
    pub fn archived_days(&self) -> usize {
        self.archives.iter().map(|plan| plan.days.len()).sum()
    }
}

/// Accumulator threaded through the traversal.
#[derive(Debug, Default)]
struct GroupingState {
    pending: PendingGroup,
    current_year: Option<CompactString>,
    current_month: Option<CompactString>,
}

impl GroupingState {
    /// Hand back the pending run and start a new one. The current year and
    /// month are kept.
    fn reset(&mut self) -> PendingGroup {
        std::mem::take(&mut self.pending)
    }
}

/// Folds day directories of an aggregated tree into archives.
pub struct ArchiveGrouper {
    config: GroupingConfig,
}

impl Default for ArchiveGrouper {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveGrouper {
    /// Create a grouper with default thresholds.
    pub fn new() -> Self {
        Self {
            config: GroupingConfig::default(),
        }
    }

    /// Create a grouper with custom config.
    pub fn with_config(config: GroupingConfig) -> Self {
        Self { config }
    }

    /// Group day directories into archives, rewriting the tree in place.
    ///
    /// The tree must have been aggregated first; thresholds are tested
    /// against the directory totals aggregation writes.
    pub fn group_by_day(&self, tree: &mut ObjectTree) -> GroupingReport {
        let report = self.plan(tree);
        apply_plans(tree, &report.archives);
        report
    }

    /// Decide the archives without touching the tree.
    pub fn plan(&self, tree: &ObjectTree) -> GroupingReport {
        let mut planner = Planner {
            config: &self.config,
            state: GroupingState::default(),
            plans: Vec::new(),
        };
        let mut path = Vec::new();
        planner.visit(&mut path, &tree.root);
        planner.finish()
    }
}

struct Planner<'a> {
    config: &'a GroupingConfig,
    state: GroupingState,
    plans: Vec<ArchivePlan>,
}

impl Planner<'_> {
    /// `path` holds the keys from the root to `node`'s parent.
    fn visit(&mut self, path: &mut Vec<CompactString>, node: &Node) {
        let Object::Dir(dir) = &node.object else {
            return;
        };
        if !dir.level.is_above_day() && dir.level != DirLevel::Day {
            return;
        }

        if !self.state.pending.is_empty() {
            let year_changed = dir.level == DirLevel::Year
                && self.state.current_year.as_ref() != Some(&dir.key);
            let month_changed = dir.level == DirLevel::Month
                && self.state.current_month.as_ref() != Some(&dir.key);
            if year_changed || month_changed {
                tracing::debug!(
                    year = ?self.state.current_year,
                    month = ?self.state.current_month,
                    entering = %dir.key,
                    "crossing month boundary with pending days"
                );
                self.flush(FlushReason::Boundary);
            }
        }

        match dir.level {
            DirLevel::Year => self.state.current_year = Some(dir.key.clone()),
            DirLevel::Month => self.state.current_month = Some(dir.key.clone()),
            _ => {}
        }

        self.state.pending.parent_path.clone_from(path);

        if dir.level.is_above_day() {
            // The root is not part of any key path.
            let keyed = dir.level != DirLevel::Root;
            if keyed {
                path.push(dir.key.clone());
            }
            for child in node.children.values() {
                self.visit(path, child);
            }
            if keyed {
                path.pop();
            }
            return;
        }

        if path.len() != 2 {
            tracing::debug!(day = %dir.key, "day directory outside a year/month, skipping");
            return;
        }

        self.state.pending.totals += Totals::new(dir.size_bytes, dir.objects_inside);
        self.state.pending.days.push(dir.key.clone());

        let totals = self.state.pending.totals;
        let ready = self.config.exceeds_thresholds(totals.bytes, totals.objects);
        tracing::debug!(
            objects = totals.objects,
            bytes = totals.bytes,
            ready,
            "accumulated day directory"
        );
        if ready {
            self.flush(FlushReason::Threshold);
        }
    }

    /// Turn the pending run into a plan. A run that cannot be named stays
    /// pending.
    fn flush(&mut self, reason: FlushReason) {
        let name = match (&self.state.current_year, &self.state.current_month) {
            (Some(year), Some(month)) => archive_name(year, month, &self.state.pending.days),
            _ => None,
        };
        let Some(name) = name else {
            tracing::warn!(
                days = self.state.pending.days.len(),
                "pending days have no year/month, not archiving"
            );
            return;
        };
        let pending = self.state.reset();

        tracing::info!(
            archive = %name,
            days = pending.days.len(),
            objects = pending.totals.objects,
            bytes = pending.totals.bytes,
            reason = reason.as_ref(),
            "planned archive"
        );
        self.plans.push(ArchivePlan {
            name,
            parent_path: pending.parent_path,
            days: pending.days,
            totals: pending.totals,
            reason,
        });
    }

    fn finish(mut self) -> GroupingReport {
        let mut leftover = None;
        if !self.state.pending.is_empty() {
            match self.config.leftover_policy {
                LeftoverPolicy::Keep => leftover = Some(self.state.reset()),
                LeftoverPolicy::Flush => {
                    self.flush(FlushReason::Leftover);
                    if !self.state.pending.is_empty() {
                        leftover = Some(self.state.reset());
                    }
                }
                LeftoverPolicy::MergePrevious => {
                    let pending = self.state.reset();
                    match self.plans.last_mut() {
                        Some(last) if last.parent_path == pending.parent_path => {
                            merge_into(last, pending);
                        }
                        _ => leftover = Some(pending),
                    }
                }
            }
        }

        if let Some(ref group) = leftover {
            tracing::info!(
                policy = %self.config.leftover_policy,
                days = group.days.len(),
                objects = group.totals.objects,
                bytes = group.totals.bytes,
                "trailing days left ungrouped"
            );
        }

        GroupingReport {
            archives: self.plans,
            leftover,
        }
    }
}

/// Extend an archive plan with trailing days from the same month.
fn merge_into(plan: &mut ArchivePlan, pending: PendingGroup) {
    plan.days.extend(pending.days);
    plan.totals += pending.totals;
    let (year, month) = match plan.parent_path.as_slice() {
        [.., year, month] => (year.clone(), month.clone()),
        _ => return,
    };
    if let Some(name) = archive_name(&year, &month, &plan.days) {
        tracing::info!(from = %plan.name, to = %name, "merged trailing days into archive");
        plan.name = name;
    }
}

/// Replace each plan's day directories with a single archive node.
///
/// Plans whose parent cannot be found are skipped.
pub fn apply_plans(tree: &mut ObjectTree, plans: &[ArchivePlan]) {
    for plan in plans {
        let Some(parent) = tree.find_mut(&plan.parent_path) else {
            tracing::warn!(archive = %plan.name, "archive parent not found, skipping");
            continue;
        };
        let archive = create_archive(parent, plan);
        tracing::debug!(archive = %archive.object, "attaching archive");
        parent.attach(archive);
    }
}

/// Detach the plan's day directories from `parent` and collect their
/// children under a new archive node. Later keys overwrite earlier ones.
fn create_archive(parent: &mut Node, plan: &ArchivePlan) -> Node {
    let mut children = BTreeMap::new();
    for day in &plan.days {
        match parent.detach(day) {
            Some(dir) => children.extend(dir.children),
            None => tracing::debug!(archive = %plan.name, day = %day, "day directory already gone"),
        }
    }
    let archive = Archive::new(plan.name.clone(), plan.totals.bytes, plan.totals.objects);
    Node::with_children(archive, children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use dayfold_core::{CalendarDate, Dir, File};

    const MB: u64 = 1024 * 1024;

    fn tree_with(days: &[(i32, u32, u32, usize)], file_size: u64) -> ObjectTree {
        let mut tree = ObjectTree::new();
        for &(year, month, day, count) in days {
            for n in 0..count {
                tree.insert_dated(
                    CalendarDate { year, month, day },
                    File::new(format!("img-{year}-{month}-{day}-{n}.jpg"), file_size, Some(0)),
                );
            }
        }
        aggregate(&mut tree);
        tree
    }

    fn small_config(policy: LeftoverPolicy) -> GroupingConfig {
        GroupingConfig::builder()
            .archive_min_bytes(10 * MB)
            .archive_min_objects(2u64)
            .leftover_policy(policy)
            .build()
            .unwrap()
    }

    #[test]
    fn test_threshold_flush_single_day() {
        let mut tree = tree_with(&[(2023, 9, 8, 120)], 5 * MB);
        let report = ArchiveGrouper::new().group_by_day(&mut tree);

        assert_eq!(report.archives.len(), 1);
        let plan = &report.archives[0];
        assert_eq!(plan.name, "2023.09.08.zip");
        assert_eq!(plan.reason, FlushReason::Threshold);
        assert_eq!(plan.totals, Totals::new(600 * MB, 120));

        let month = tree.find(&["2023", "9"]).unwrap();
        assert!(month.child("8").is_none());
        let archive = month.child("2023.09.08.zip").unwrap();
        assert_eq!(archive.child_count(), 120);
    }

    #[test]
    fn test_count_without_size_is_not_enough() {
        let mut tree = tree_with(&[(2023, 9, 8, 16), (2023, 9, 9, 6)], 5 * MB);
        let report = ArchiveGrouper::new().group_by_day(&mut tree);

        assert!(report.archives.is_empty());
        let leftover = report.leftover.unwrap();
        assert_eq!(leftover.days, ["8", "9"]);
        assert_eq!(leftover.totals, Totals::new(110 * MB, 22));
        assert!(tree.find(&["2023", "9", "8"]).is_some());
    }

    #[test]
    fn test_month_boundary_flush() {
        let mut tree = tree_with(&[(2023, 8, 31, 1), (2023, 9, 1, 1)], MB);
        let grouper = ArchiveGrouper::with_config(small_config(LeftoverPolicy::Keep));
        let report = grouper.group_by_day(&mut tree);

        assert_eq!(report.archives.len(), 1);
        let plan = &report.archives[0];
        assert_eq!(plan.name, "2023.08.31.zip");
        assert_eq!(plan.reason, FlushReason::Boundary);
        assert_eq!(plan.parent_path, ["2023", "8"]);
        assert!(tree.find(&["2023", "8", "2023.08.31.zip"]).is_some());
        assert!(tree.find(&["2023", "9", "1"]).is_some());
    }

    #[test]
    fn test_year_boundary_flush() {
        let mut tree = tree_with(&[(2022, 12, 31, 1), (2023, 12, 1, 1)], MB);
        let grouper = ArchiveGrouper::with_config(small_config(LeftoverPolicy::Flush));
        let report = grouper.group_by_day(&mut tree);

        let names: Vec<&str> = report.archives.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["2022.12.31.zip", "2023.12.01.zip"]);
        assert_eq!(report.archives[0].reason, FlushReason::Boundary);
        assert_eq!(report.archives[1].reason, FlushReason::Leftover);
        assert!(report.leftover.is_none());
    }

    #[test]
    fn test_days_visited_in_numeric_order() {
        let mut tree = tree_with(&[(2023, 9, 9, 2), (2023, 9, 10, 2), (2023, 9, 11, 2)], 6 * MB);
        let grouper = ArchiveGrouper::with_config(small_config(LeftoverPolicy::Keep));
        let report = grouper.group_by_day(&mut tree);

        assert_eq!(report.archives[0].days, ["9", "10"]);
        assert_eq!(report.archives[0].name, "2023.09.09-10.zip");
        assert_eq!(report.leftover.unwrap().days, ["11"]);
    }

    #[test]
    fn test_merge_previous_same_month() {
        let mut tree = tree_with(&[(2023, 9, 1, 3), (2023, 9, 2, 1)], 5 * MB);
        let grouper = ArchiveGrouper::with_config(small_config(LeftoverPolicy::MergePrevious));
        let report = grouper.group_by_day(&mut tree);

        assert_eq!(report.archives.len(), 1);
        let plan = &report.archives[0];
        assert_eq!(plan.name, "2023.09.01-02.zip");
        assert_eq!(plan.totals, Totals::new(20 * MB, 4));
        assert!(report.leftover.is_none());
        assert_eq!(tree.find(&["2023", "9"]).unwrap().child_count(), 1);
    }

    #[test]
    fn test_merge_previous_never_crosses_months() {
        let mut tree = tree_with(&[(2023, 8, 1, 3), (2023, 9, 2, 1)], 5 * MB);
        let grouper = ArchiveGrouper::with_config(small_config(LeftoverPolicy::MergePrevious));
        let report = grouper.group_by_day(&mut tree);

        assert_eq!(report.archives.len(), 1);
        assert_eq!(report.archives[0].name, "2023.08.01.zip");
        assert_eq!(report.leftover.unwrap().days, ["2"]);
    }

    #[test]
    fn test_unclassified_is_never_grouped() {
        let mut tree = ObjectTree::new();
        tree.insert_unclassified("No metadata", File::new("a.jpg", 600 * MB, None));
        for n in 0..30 {
            tree.insert_unclassified("No metadata", File::new(format!("{n}.jpg"), MB, None));
        }
        aggregate(&mut tree);
        let report = ArchiveGrouper::new().group_by_day(&mut tree);

        assert!(report.archives.is_empty());
        assert!(report.leftover.is_none());
        assert_eq!(tree.find(&["No metadata"]).unwrap().child_count(), 31);
    }

    #[test]
    fn test_existing_archives_are_skipped() {
        let mut tree = tree_with(&[(2023, 9, 8, 120)], 5 * MB);
        let grouper = ArchiveGrouper::new();
        grouper.group_by_day(&mut tree);
        let again = grouper.group_by_day(&mut tree);
        assert!(again.archives.is_empty());
        assert_eq!(tree.stats().archives, 1);
    }

    #[test]
    fn test_day_outside_month_is_left_in_place() {
        let mut tree = tree_with(&[(2023, 9, 8, 3)], 5 * MB);
        let stray = tree.root.insert(Dir::new("7", DirLevel::Day));
        for n in 0..4 {
            stray.insert(File::new(format!("stray-{n}.jpg"), 5 * MB, None));
        }
        aggregate(&mut tree);

        let report = ArchiveGrouper::with_config(small_config(LeftoverPolicy::Flush))
            .group_by_day(&mut tree);

        assert_eq!(report.archives.len(), 1);
        assert_eq!(report.archives[0].name, "2023.09.08.zip");
        assert_eq!(report.archives[0].days, ["8"]);
        assert!(report.leftover.is_none());
        assert_eq!(tree.find(&["7"]).unwrap().child_count(), 4);
        assert_eq!(tree.files().len(), 7);
    }

    #[test]
    fn test_unnamed_run_is_reported_as_leftover() {
        // Month directly under the root: no year to name an archive with.
        let mut tree = ObjectTree::new();
        let month = tree.root.insert(Dir::new("9", DirLevel::Month));
        let inner = month.insert(Dir::new("9", DirLevel::Month));
        let day = inner.insert(Dir::new("1", DirLevel::Day));
        for n in 0..4 {
            day.insert(File::new(format!("{n}.jpg"), 5 * MB, None));
        }
        aggregate(&mut tree);

        let report = ArchiveGrouper::with_config(small_config(LeftoverPolicy::Flush))
            .group_by_day(&mut tree);

        assert!(report.archives.is_empty());
        let leftover = report.leftover.unwrap();
        assert_eq!(leftover.days, ["1"]);
        assert_eq!(leftover.totals, Totals::new(20 * MB, 4));
        assert_eq!(tree.find(&["9", "9", "1"]).unwrap().child_count(), 4);
    }
}
