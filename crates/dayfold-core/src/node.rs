//! Object variants and tree nodes.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Key of a node, unique among its siblings.
///
/// Keys order naturally: digit-only keys compare by numeric value and come
/// before every other key, so day `"9"` is visited before day `"10"`. Other
/// keys compare lexically. Digit keys with equal value (`"08"`, `"8"`) fall
/// back to a lexical comparison so distinct strings never compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKey(pub CompactString);

impl NodeKey {
    /// Create a new key.
    pub fn new(key: impl Into<CompactString>) -> Self {
        Self(key.into())
    }

    /// Get the key as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

impl Ord for NodeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (self.as_str(), other.as_str());
        match (is_numeric(a), is_numeric(b)) {
            (true, true) => {
                let ta = a.trim_start_matches('0');
                let tb = b.trim_start_matches('0');
                ta.len()
                    .cmp(&tb.len())
                    .then_with(|| ta.cmp(tb))
                    .then_with(|| a.cmp(b))
            }
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => a.cmp(b),
        }
    }
}

impl PartialOrd for NodeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<&str> for NodeKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<CompactString> for NodeKey {
    fn from(key: CompactString) -> Self {
        Self(key)
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Depth marker of a directory.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DirLevel {
    /// The tree root (`/`).
    Root,
    /// A calendar year.
    Year,
    /// A calendar month within a year.
    Month,
    /// A calendar day within a month; the unit absorbed into archives.
    Day,
    /// Container for files without capture metadata. Never grouped.
    Unclassified,
}

impl DirLevel {
    /// Whether this level sits above day level on the calendar path.
    pub fn is_above_day(self) -> bool {
        matches!(self, DirLevel::Root | DirLevel::Year | DirLevel::Month)
    }
}

/// An uploaded object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    /// Object identifier.
    pub key: CompactString,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Capture time in epoch seconds, if the object carried metadata.
    pub taken_at_sec: Option<i64>,
}

impl File {
    /// Create a new file object.
    pub fn new(key: impl Into<CompactString>, size_bytes: u64, taken_at_sec: Option<i64>) -> Self {
        Self {
            key: key.into(),
            size_bytes,
            taken_at_sec,
        }
    }
}

/// A directory. Size and object count are written by aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dir {
    /// Directory name.
    pub key: CompactString,
    /// Depth marker.
    pub level: DirLevel,
    /// Total bytes of all files beneath (zero until aggregated).
    pub size_bytes: u64,
    /// Number of files beneath (zero until aggregated).
    pub objects_inside: u64,
}

impl Dir {
    /// Create an empty, unaggregated directory.
    pub fn new(key: impl Into<CompactString>, level: DirLevel) -> Self {
        Self {
            key: key.into(),
            level,
            size_bytes: 0,
            objects_inside: 0,
        }
    }
}

/// A group of absorbed day directories destined for one storage unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Archive {
    /// Generated archive name, e.g. `2023.09.01-05.zip`.
    pub key: CompactString,
    /// Total bytes of the absorbed files.
    pub size_bytes: u64,
    /// Number of absorbed files.
    pub objects_inside: u64,
}

impl Archive {
    /// Create a new archive object.
    pub fn new(key: impl Into<CompactString>, size_bytes: u64, objects_inside: u64) -> Self {
        Self {
            key: key.into(),
            size_bytes,
            objects_inside,
        }
    }
}

/// Any object that can live in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Object {
    File(File),
    Dir(Dir),
    Archive(Archive),
}

impl Object {
    /// Key unique among the object's siblings.
    pub fn key(&self) -> &str {
        match self {
            Object::File(f) => &f.key,
            Object::Dir(d) => &d.key,
            Object::Archive(a) => &a.key,
        }
    }

    /// Check if this is a file.
    pub fn is_file(&self) -> bool {
        matches!(self, Object::File(_))
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, Object::Dir(_))
    }

    /// Check if this is an archive.
    pub fn is_archive(&self) -> bool {
        matches!(self, Object::Archive(_))
    }

    /// Borrow as a directory.
    pub fn as_dir(&self) -> Option<&Dir> {
        match self {
            Object::Dir(d) => Some(d),
            _ => None,
        }
    }

    /// Borrow as a file.
    pub fn as_file(&self) -> Option<&File> {
        match self {
            Object::File(f) => Some(f),
            _ => None,
        }
    }

    /// Borrow as an archive.
    pub fn as_archive(&self) -> Option<&Archive> {
        match self {
            Object::Archive(a) => Some(a),
            _ => None,
        }
    }

    /// Bytes recorded on the object (aggregate for dirs and archives).
    pub fn size_bytes(&self) -> u64 {
        match self {
            Object::File(f) => f.size_bytes,
            Object::Dir(d) => d.size_bytes,
            Object::Archive(a) => a.size_bytes,
        }
    }
}

impl From<File> for Object {
    fn from(file: File) -> Self {
        Object::File(file)
    }
}

impl From<Dir> for Object {
    fn from(dir: Dir) -> Self {
        Object::Dir(dir)
    }
}

impl From<Archive> for Object {
    fn from(archive: Archive) -> Self {
        Object::Archive(archive)
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::File(file) => match file.taken_at_sec {
                Some(ts) => write!(
                    f,
                    "File[key: {}, size: {}, taken_at: {ts}]",
                    file.key, file.size_bytes
                ),
                None => write!(f, "File[key: {}, size: {}]", file.key, file.size_bytes),
            },
            Object::Dir(dir) => write!(
                f,
                "Dir[key: {}, level: {}, size: {}, inside: {}]",
                dir.key, dir.level, dir.size_bytes, dir.objects_inside
            ),
            Object::Archive(archive) => write!(
                f,
                "Archive[key: {}, size: {}, inside: {}]",
                archive.key, archive.size_bytes, archive.objects_inside
            ),
        }
    }
}

/// A tree node: one object plus its children in ascending key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// The object held by this node.
    pub object: Object,

    /// Children keyed by object key. Iteration is in [`NodeKey`] order.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub children: BTreeMap<NodeKey, Node>,
}

impl Node {
    /// Create a childless node.
    pub fn new(object: impl Into<Object>) -> Self {
        Self {
            object: object.into(),
            children: BTreeMap::new(),
        }
    }

    /// Create a node with the given children.
    pub fn with_children(object: impl Into<Object>, children: BTreeMap<NodeKey, Node>) -> Self {
        Self {
            object: object.into(),
            children,
        }
    }

    /// Key of the held object.
    pub fn key(&self) -> &str {
        self.object.key()
    }

    /// Look up a direct child by key.
    pub fn child(&self, key: &str) -> Option<&Node> {
        self.children.get(&NodeKey::from(key))
    }

    /// Look up a direct child by key, mutably.
    pub fn child_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.children.get_mut(&NodeKey::from(key))
    }

    /// Insert a child holding `object`.
    ///
    /// Idempotent: if a child with the same key exists it is returned
    /// untouched and `object` is dropped.
    pub fn insert(&mut self, object: impl Into<Object>) -> &mut Node {
        let object = object.into();
        self.children
            .entry(NodeKey::from(object.key()))
            .or_insert_with(|| Node::new(object))
    }

    /// Attach a fully built child, replacing any child with the same key.
    pub fn attach(&mut self, node: Node) -> Option<Node> {
        self.children.insert(NodeKey::from(node.key()), node)
    }

    /// Detach a child by key.
    pub fn detach(&mut self, key: &str) -> Option<Node> {
        self.children.remove(&NodeKey::from(key))
    }

    /// Get the number of direct children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Count file leaves anywhere beneath this node.
    pub fn file_count(&self) -> u64 {
        match self.object {
            Object::File(_) => 1,
            _ => self.children.values().map(Node::file_count).sum(),
        }
    }

    /// Sum file sizes anywhere beneath this node.
    pub fn file_bytes(&self) -> u64 {
        match &self.object {
            Object::File(f) => f.size_bytes,
            _ => self.children.values().map(Node::file_bytes).sum(),
        }
    }
}
