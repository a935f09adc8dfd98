//! Per-version string interning tables.
//!
//! An [`InterningTable`] maps small integer keys to canonical strings. Encoding looks strings up
//! case-insensitively through a reverse index built once when the table is created; decoding maps
//! keys back to the canonical spelling. Tables are immutable: switching to another version means
//! switching to another table.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::iter::FromIterator;

/// The string an interned key decodes to when the active table has no entry for it.
pub const UNKNOWN_STRING: &str = "<unknown>";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<u16, String>", into = "BTreeMap<u16, String>")]
pub struct InterningTable {
    strings: BTreeMap<u16, String>,
    reverse: HashMap<String, u16>,
}

impl InterningTable {
    /// Build a table from a sparse key-to-string mapping.
    ///
    /// If several entries are equal once lowercased, lookups resolve to the lowest key.
    pub fn new(strings: BTreeMap<u16, String>) -> Self {
        let mut reverse = HashMap::with_capacity(strings.len());
        // BTreeMap iterates in ascending key order, so the first insert is the lowest key.
        for (key, s) in strings.iter() {
            reverse.entry(s.to_lowercase()).or_insert(*key);
        }
        Self { strings, reverse }
    }

    /// Get the canonical string for a key.
    pub fn get(&self, key: u16) -> Option<&str> {
        self.strings.get(&key).map(|s| s.as_str())
    }

    /// Get the canonical string for a key, or [`UNKNOWN_STRING`] if there isn't one.
    pub fn resolve(&self, key: u16) -> &str {
        self.get(key).unwrap_or(UNKNOWN_STRING)
    }

    /// Case-insensitively find the key for a string.
    pub fn lookup(&self, s: &str) -> Option<u16> {
        self.reverse.get(&s.to_lowercase()).copied()
    }

    pub fn contains_key(&self, key: u16) -> bool {
        self.strings.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Iterate over all entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &str)> {
        self.strings.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

impl From<BTreeMap<u16, String>> for InterningTable {
    fn from(strings: BTreeMap<u16, String>) -> Self {
        Self::new(strings)
    }
}

impl From<InterningTable> for BTreeMap<u16, String> {
    fn from(table: InterningTable) -> Self {
        table.strings
    }
}

impl<S: Into<String>> FromIterator<(u16, S)> for InterningTable {
    fn from_iter<T: IntoIterator<Item = (u16, S)>>(iter: T) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}
