//! Object tree container and the record-to-tree builder.

use compact_str::{CompactString, ToCompactString};
use serde::{Deserialize, Serialize};

use crate::config::GroupingConfig;
use crate::node::{Dir, DirLevel, File, Node, Object};
use crate::record::{CalendarDate, UploadRecord};

/// Key of the tree root.
pub const ROOT_KEY: &str = "/";

/// Summary counts over a tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeStats {
    /// Number of file leaves.
    pub files: u64,
    /// Number of directories, root included.
    pub dirs: u64,
    /// Number of archive nodes.
    pub archives: u64,
    /// Sum of file sizes.
    pub total_bytes: u64,
}

/// An archive found in a tree, with the keys leading to its parent.
#[derive(Debug, Clone)]
pub struct ArchiveEntry<'a> {
    /// Keys from the root (exclusive) to the archive's parent.
    pub parent_path: Vec<&'a str>,
    /// The archive node; its children are the absorbed files.
    pub node: &'a Node,
}

/// Tree of directories, files and archives rooted at `/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectTree {
    /// Root directory node.
    pub root: Node,
}

impl Default for ObjectTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            root: Node::new(Dir::new(ROOT_KEY, DirLevel::Root)),
        }
    }

    /// Build a tree from upload records.
    ///
    /// Dated records land under `/year/month/day/`; records without a usable
    /// timestamp land under the unclassified directory. Duplicate keys under
    /// the same parent keep the first record.
    pub fn from_records<'a, I>(records: I, config: &GroupingConfig) -> Self
    where
        I: IntoIterator<Item = &'a UploadRecord>,
    {
        let tz = config.timezone();
        let mut tree = Self::new();
        let mut dated = 0u64;
        let mut undated = 0u64;

        for record in records {
            let file = File::new(
                record.object_key.clone(),
                record.size_bytes,
                record.taken_at_sec,
            );
            match record.capture_date(&tz) {
                Some(date) => {
                    tree.insert_dated(date, file);
                    dated += 1;
                }
                None => {
                    tree.insert_unclassified(&config.unclassified_key, file);
                    undated += 1;
                }
            }
        }

        tracing::debug!(dated, undated, "built object tree");
        tree
    }

    /// Insert a file under its year/month/day directories, creating them as needed.
    pub fn insert_dated(&mut self, date: CalendarDate, file: File) -> &mut Node {
        let year = self
            .root
            .insert(Dir::new(date.year.to_compact_string(), DirLevel::Year));
        let month = year.insert(Dir::new(date.month.to_compact_string(), DirLevel::Month));
        let day = month.insert(Dir::new(date.day.to_compact_string(), DirLevel::Day));
        day.insert(file)
    }

    /// Insert a file under the unclassified directory, creating it as needed.
    pub fn insert_unclassified(&mut self, dir_key: &str, file: File) -> &mut Node {
        self.root
            .insert(Dir::new(dir_key, DirLevel::Unclassified))
            .insert(file)
    }

    /// Follow a key path from the root.
    pub fn find(&self, path: &[&str]) -> Option<&Node> {
        path.iter().try_fold(&self.root, |node, key| node.child(key))
    }

    /// Follow a key path from the root, mutably.
    pub fn find_mut<K: AsRef<str>>(&mut self, path: &[K]) -> Option<&mut Node> {
        path.iter()
            .try_fold(&mut self.root, |node, key| node.child_mut(key.as_ref()))
    }

    /// Visit every node in pre-order, children in ascending key order.
    ///
    /// The visitor receives the keys from the root (exclusive) to the node's
    /// parent, and the node itself.
    pub fn walk<'a, F>(&'a self, mut visit: F)
    where
        F: FnMut(&[&'a str], &'a Node),
    {
        let mut path = Vec::new();
        visit(&path, &self.root);
        for child in self.root.children.values() {
            walk_node(child, &mut path, &mut visit);
        }
    }

    /// All archive nodes, in traversal order.
    pub fn archives(&self) -> Vec<ArchiveEntry<'_>> {
        let mut archives = Vec::new();
        self.walk(|parent, node| {
            if node.object.is_archive() {
                archives.push(ArchiveEntry {
                    parent_path: parent.to_vec(),
                    node,
                });
            }
        });
        archives
    }

    /// All file leaves, in traversal order.
    pub fn files(&self) -> Vec<&File> {
        let mut files = Vec::new();
        self.walk(|_, node| {
            if let Object::File(file) = &node.object {
                files.push(file);
            }
        });
        files
    }

    /// Count nodes by kind.
    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats::default();
        self.walk(|_, node| match &node.object {
            Object::File(file) => {
                stats.files += 1;
                stats.total_bytes += file.size_bytes;
            }
            Object::Dir(_) => stats.dirs += 1,
            Object::Archive(_) => stats.archives += 1,
        });
        stats
    }

    /// Join a key path into a display path such as `/2023/8/29`.
    pub fn display_path(path: &[&str]) -> CompactString {
        let mut out = CompactString::new("");
        for key in path {
            out.push('/');
            out.push_str(key);
        }
        if out.is_empty() {
            out.push_str(ROOT_KEY);
        }
        out
    }
}

fn walk_node<'a, F>(node: &'a Node, path: &mut Vec<&'a str>, visit: &mut F)
where
    F: FnMut(&[&'a str], &'a Node),
{
    visit(path, node);
    if node.children.is_empty() {
        return;
    }
    path.push(node.key());
    for child in node.children.values() {
        walk_node(child, path, visit);
    }
    path.pop();
}
