//! Non-fatal events seen while decoding.
//!
//! The decoder tolerates a few kinds of bad input instead of failing: unrecognized tag bytes become
//! `Null` where a value belongs and are skipped between object members, unknown interned keys
//! become [`UNKNOWN_STRING`][crate::UNKNOWN_STRING], and a missing terminator is ignored. Each of
//! these is recorded here so callers can tell when data was lost. An unrecognized tag in object key
//! position is not tolerated.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Warning {
    /// A tag byte that isn't part of the format was decoded as `Null`, or skipped between object
    /// members.
    UnknownTag { offset: usize, tag: u8 },
    /// An interned key had no entry in the active table.
    UnknownInternedKey { offset: usize, key: u16 },
    /// The document ended without its terminator tag, or with some other tag in its place.
    MissingTerminator { offset: usize },
    /// Bytes were left over after the terminator.
    TrailingBytes { offset: usize, len: usize },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Warning::UnknownTag { offset, tag } => write!(
                f,
                "Unknown tag 0x{:02x} at offset {} decoded as null",
                tag, offset
            ),
            Warning::UnknownInternedKey { offset, key } => write!(
                f,
                "Interned key {} at offset {} isn't in the active table",
                key, offset
            ),
            Warning::MissingTerminator { offset } => {
                write!(f, "Document terminator missing at offset {}", offset)
            }
            Warning::TrailingBytes { offset, len } => write!(
                f,
                "{} bytes left over after the terminator at offset {}",
                len, offset
            ),
        }
    }
}

/// Every warning raised by one decode, in the order they were found.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, warning: Warning) {
        tracing::warn!(%warning, "lenient ISON decode");
        self.warnings.push(warning);
    }

    /// True if the decode raised no warnings at all.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Warning> {
        self.warnings.iter()
    }

    /// How many unknown tag bytes were turned into `Null`.
    pub fn unknown_tags(&self) -> usize {
        self.iter()
            .filter(|w| matches!(w, Warning::UnknownTag { .. }))
            .count()
    }

    /// How many interned keys resolved to the unknown-string sentinel.
    pub fn unknown_keys(&self) -> usize {
        self.iter()
            .filter(|w| matches!(w, Warning::UnknownInternedKey { .. }))
            .count()
    }

    pub fn missing_terminator(&self) -> bool {
        self.iter()
            .any(|w| matches!(w, Warning::MissingTerminator { .. }))
    }

    pub fn into_vec(self) -> Vec<Warning> {
        self.warnings
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Warning;
    type IntoIter = std::slice::Iter<'a, Warning>;

    fn into_iter(self) -> Self::IntoIter {
        self.warnings.iter()
    }
}
