//! Bottom-up size and object-count aggregation.

use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use dayfold_core::{Node, Object, ObjectTree};

/// Byte and file totals for a subtree or a group of day directories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    /// Total size in bytes.
    pub bytes: u64,
    /// Number of files.
    pub objects: u64,
}

impl Totals {
    /// Create new totals.
    pub fn new(bytes: u64, objects: u64) -> Self {
        Self { bytes, objects }
    }

    /// Check whether nothing has been counted.
    pub fn is_empty(&self) -> bool {
        self.bytes == 0 && self.objects == 0
    }
}

impl Add for Totals {
    type Output = Totals;

    fn add(self, rhs: Self) -> Self::Output {
        Totals::new(self.bytes + rhs.bytes, self.objects + rhs.objects)
    }
}

impl AddAssign for Totals {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Annotate every directory with the totals of the files beneath it.
///
/// Returns the totals of the whole tree. Archive nodes contribute nothing to
/// their parent, so this is meant to run once, before grouping.
pub fn aggregate(tree: &mut ObjectTree) -> Totals {
    let totals = aggregate_node(&mut tree.root);
    tracing::info!(
        bytes = totals.bytes,
        objects = totals.objects,
        "aggregated object tree"
    );
    totals
}

fn aggregate_node(node: &mut Node) -> Totals {
    let mut below = Totals::default();
    for child in node.children.values_mut() {
        below += aggregate_node(child);
    }

    match &mut node.object {
        Object::File(file) => Totals::new(file.size_bytes, 1),
        Object::Dir(dir) => {
            // Directories are not objects themselves; only files count.
            dir.size_bytes = below.bytes;
            dir.objects_inside = below.objects;
            tracing::debug!(dir = %dir.key, bytes = below.bytes, objects = below.objects, "aggregated directory");
            below
        }
        Object::Archive(_) => Totals::default(),
    }
}
