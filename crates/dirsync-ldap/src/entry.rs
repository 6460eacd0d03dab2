//! In-memory representation of directory entries.
//!
//! Directory attributes are inherently multi-valued. Instead of the usual
//! "string or list of strings" juggling, every attribute is an [`AttrValue`]
//! and all call sites go through the same accessors.

use crate::dn::DistinguishedName;
use std::collections::{BTreeMap, HashMap};

/// A directory attribute value: a single string or an ordered sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// Exactly one value.
    Single(String),
    /// Zero or more values in server order.
    Multi(Vec<String>),
}

impl AttrValue {
    /// First value, if any.
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::Single(value) => Some(value),
            Self::Multi(values) => values.first().map(String::as_str),
        }
    }

    /// Iterates over all values in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        match self {
            Self::Single(value) => std::slice::from_ref(value).iter(),
            Self::Multi(values) => values.iter(),
        }
        .map(String::as_str)
    }

    /// Number of values held.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Multi(values) => values.len(),
        }
    }

    /// Returns true when no value is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Display form: a single value unchanged, multiple values joined by a
    /// comma in original order.
    #[must_use]
    pub fn joined(&self) -> String {
        match self {
            Self::Single(value) => value.clone(),
            Self::Multi(values) => values.join(","),
        }
    }

    /// Case-insensitive membership test across all values.
    #[must_use]
    pub fn contains_ignore_case(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.iter().any(|value| value.to_lowercase() == needle)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(mut values: Vec<String>) -> Self {
        if values.len() == 1 {
            Self::Single(values.remove(0))
        } else {
            Self::Multi(values)
        }
    }
}

/// A single directory entry: its DN plus attribute map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Distinguished name identifying the entry.
    pub dn: DistinguishedName,
    /// Attribute name to value mapping.
    pub attributes: HashMap<String, AttrValue>,
}

impl DirectoryEntry {
    /// Creates an entry from a DN and attribute map.
    #[must_use]
    pub fn new(dn: DistinguishedName, attributes: HashMap<String, AttrValue>) -> Self {
        Self { dn, attributes }
    }

    /// Looks up an attribute value.
    #[must_use]
    pub fn get(&self, attribute: &str) -> Option<&AttrValue> {
        self.attributes.get(attribute)
    }

    /// Display form of an attribute: comma-joined values, empty string when
    /// the attribute is absent.
    #[must_use]
    pub fn text(&self, attribute: &str) -> String {
        self.get(attribute).map(AttrValue::joined).unwrap_or_default()
    }

    /// The entry's uid, taken from its DN.
    ///
    /// Entries fetched from a user subtree always carry a `uid` leaf RDN;
    /// arbitrary DNs may not, in which case this is `None` rather than a
    /// panic.
    #[must_use]
    pub fn uid(&self) -> Option<&str> {
        self.dn.get("uid")
    }
}

/// Snapshot of a directory subtree, keyed by canonical DN string.
///
/// Populated once at client construction; DN uniqueness is enforced by the
/// directory itself.
pub type DirectorySnapshot = BTreeMap<String, DirectoryEntry>;
