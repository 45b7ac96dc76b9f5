//! Values document model
//!
//! A parsed `values.yaml` is a tree of [`Node`]s. Mappings keep their keys in
//! document order and remember, per key, the source line of the key and the
//! comments found around it. Those two pieces of metadata are what the
//! comment extractor needs to describe a parameter.

pub mod comments;
pub mod parser;
pub mod traverse;

pub use comments::{CommentToken, Nested, clean_comment, flatten, get_comment};
pub use parser::parse_values;
pub use traverse::{Parameter, encode_default, traverse};

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

/// A node of a values document
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Null,
    Bool(bool),
    Integer(i128),
    Float(f64),
    String(String),
    Sequence(Vec<Node>),
    Mapping(Mapping),
}

/// Per-key record of a mapping
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// The value stored under the key
    pub value: Node,
    /// Zero-based source line of the key, when parsed from text
    pub key_line: Option<usize>,
    /// Comment tokens associated with the key, possibly nested
    pub comments: Option<Nested<CommentToken>>,
}

impl Entry {
    /// An entry with no source metadata
    #[must_use]
    pub const fn new(value: Node) -> Self {
        Self {
            value,
            key_line: None,
            comments: None,
        }
    }
}

/// Insertion-ordered mapping with per-key comment metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping {
    entries: IndexMap<String, Entry>,
}

/// Capability the comment extractor relies on
///
/// Any mapping that can report its keys in order, the value under a key,
/// the comment tokens attached to a key and the source line of a key can
/// be described.
pub trait CommentedMapping {
    /// Keys in document order
    fn keys(&self) -> impl Iterator<Item = &str>;

    /// Value stored under `key`
    fn value(&self, key: &str) -> Option<&Node>;

    /// Comment tokens associated with `key`, if any were recorded
    fn comments(&self, key: &str) -> Option<&Nested<CommentToken>>;

    /// Source line of `key`, if known
    fn key_line(&self, key: &str) -> Option<usize>;
}

impl Mapping {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) const fn from_entries(entries: IndexMap<String, Entry>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over keys and entries in document order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.get(key).map(|entry| &entry.value)
    }

    #[must_use]
    pub fn entry(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    pub(crate) fn entry_mut(&mut self, key: &str) -> Option<&mut Entry> {
        self.entries.get_mut(key)
    }

    /// Insert a value without source metadata, returning the previous value
    ///
    /// An existing key keeps its position.
    pub fn insert<K: Into<String>>(&mut self, key: K, value: Node) -> Option<Node> {
        match self.entries.entry(key.into()) {
            indexmap::map::Entry::Occupied(mut slot) => {
                Some(core::mem::replace(&mut slot.get_mut().value, value))
            }
            indexmap::map::Entry::Vacant(slot) => {
                slot.insert(Entry::new(value));
                None
            }
        }
    }

    /// Insert a value together with a ready-made description
    pub fn insert_described<K, D>(&mut self, key: K, value: Node, description: D)
    where
        K: Into<String>,
        D: Into<String>,
    {
        let entry = Entry {
            value,
            key_line: None,
            comments: Some(Nested::Leaf(Some(CommentToken::Resolved(description.into())))),
        };
        self.entries.insert(key.into(), entry);
    }

    /// Add the entries of `other` whose keys this mapping does not define
    pub(crate) fn merge_missing(&mut self, other: &Self) {
        for (key, entry) in &other.entries {
            if !self.entries.contains_key(key) {
                self.entries.insert(key.clone(), entry.clone());
            }
        }
    }
}

impl CommentedMapping for Mapping {
    fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    fn value(&self, key: &str) -> Option<&Node> {
        self.get(key)
    }

    fn comments(&self, key: &str) -> Option<&Nested<CommentToken>> {
        self.entries.get(key).and_then(|entry| entry.comments.as_ref())
    }

    fn key_line(&self, key: &str) -> Option<usize> {
        self.entries.get(key).and_then(|entry| entry.key_line)
    }
}

impl Node {
    /// Returns the mapping if this node is one
    #[must_use]
    pub const fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Self::Mapping(mapping) => Some(mapping),
            _ => None,
        }
    }
}

/// YAML spelling of a float JSON cannot represent
fn non_finite_spelling(value: f64) -> &'static str {
    if value.is_nan() {
        ".nan"
    } else if value.is_sign_negative() {
        "-.inf"
    } else {
        ".inf"
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(value) => serializer.serialize_bool(*value),
            Self::Integer(value) => serializer.serialize_i128(*value),
            Self::Float(value) if value.is_finite() => serializer.serialize_f64(*value),
            Self::Float(value) => serializer.serialize_str(non_finite_spelling(*value)),
            Self::String(value) => serializer.serialize_str(value),
            Self::Sequence(items) => serializer.collect_seq(items),
            Self::Mapping(mapping) => mapping.serialize(serializer),
        }
    }
}

impl Serialize for Mapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(key, entry)| (key, &entry.value)))
    }
}
