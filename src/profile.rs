//! Version profiles.
//!
//! A [`VersionProfile`] bundles everything that has to agree between the writer and the reader of
//! a container: its capacity, its compression strategy, and its interning table. Callers pick the
//! profile for a record's format version; nothing in this crate tries to detect it.
//!
//! Profiles can be built directly, or deserialized from configuration:
//!
//! ```
//! # use ison_pack::VersionProfile;
//! let profile: VersionProfile = serde_json::from_str(r#"{
//!     "name": "legacy",
//!     "capacity": 503,
//!     "compress": { "Deflate": { "level": 9 } },
//!     "strings": { "1": "loadouts", "2": "slotType" }
//! }"#).unwrap();
//! assert_eq!(profile.capacity(), 503);
//! assert_eq!(profile.strings().lookup("SLOTTYPE"), Some(2));
//! ```

use crate::compress::Compress;
use crate::error::{Error, Result};
use crate::intern::InterningTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::sync::Arc;

/// Container capacity of the larger record field layout.
pub const LARGE_CAPACITY: usize = 503;
/// Container capacity of the smaller record field layout.
pub const SMALL_CAPACITY: usize = 377;

/// Smallest usable capacity: the 2-byte length prefix plus at least one payload byte.
const MIN_CAPACITY: usize = 3;
/// Largest capacity whose whole payload length fits in the 2-byte prefix.
const MAX_CAPACITY: usize = u16::MAX as usize + 2;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProfileSerde", into = "ProfileSerde")]
pub struct VersionProfile {
    name: String,
    capacity: usize,
    compress: Compress,
    strings: Arc<InterningTable>,
}

impl VersionProfile {
    /// Create a new profile, checking that its settings are usable.
    pub fn new(
        name: impl Into<String>,
        capacity: usize,
        compress: Compress,
        strings: Arc<InterningTable>,
    ) -> Result<Self> {
        let name = name.into();
        if !(MIN_CAPACITY..=MAX_CAPACITY).contains(&capacity) {
            return Err(Error::BadConfig(format!(
                "Profile {} has capacity {}, must be between {} and {}",
                name, capacity, MIN_CAPACITY, MAX_CAPACITY
            )));
        }
        if let Compress::Deflate { level } = compress {
            if level > 9 {
                return Err(Error::BadConfig(format!(
                    "Profile {} has deflate level {}, must be 0-9",
                    name, level
                )));
            }
        }
        Ok(Self {
            name,
            capacity,
            compress,
            strings,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total size of a container, including its length prefix and padding.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn compress(&self) -> &Compress {
        &self.compress
    }

    /// The interning table used to encode and decode documents under this profile.
    pub fn strings(&self) -> &InterningTable {
        &self.strings
    }

    /// A shared handle to the interning table, for handing to other profiles or threads.
    pub fn shared_strings(&self) -> Arc<InterningTable> {
        Arc::clone(&self.strings)
    }
}

// Struct used solely for serialization/deserialization
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProfileSerde {
    name: String,
    capacity: usize,
    #[serde(default)]
    compress: Compress,
    strings: Arc<InterningTable>,
}

impl TryFrom<ProfileSerde> for VersionProfile {
    type Error = Error;
    fn try_from(value: ProfileSerde) -> Result<Self> {
        VersionProfile::new(value.name, value.capacity, value.compress, value.strings)
    }
}

impl From<VersionProfile> for ProfileSerde {
    fn from(value: VersionProfile) -> Self {
        Self {
            name: value.name,
            capacity: value.capacity,
            compress: value.compress,
            strings: value.strings,
        }
    }
}

/// Profiles keyed by the caller's version tag.
///
/// Replacing a profile swaps it out whole. Since that takes `&mut self`, it can't happen while
/// any encode or decode still borrows the old one.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileRegistry {
    profiles: BTreeMap<String, VersionProfile>,
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a profile under a version tag, returning whatever profile it replaced.
    pub fn insert(
        &mut self,
        version: impl Into<String>,
        profile: VersionProfile,
    ) -> Option<VersionProfile> {
        let version = version.into();
        tracing::debug!(
            version = %version,
            profile = profile.name(),
            capacity = profile.capacity(),
            compress = profile.compress().name(),
            strings = profile.strings().len(),
            "registering ISON profile"
        );
        self.profiles.insert(version, profile)
    }

    pub fn get(&self, version: &str) -> Option<&VersionProfile> {
        self.profiles.get(version)
    }

    pub fn remove(&mut self, version: &str) -> Option<VersionProfile> {
        self.profiles.remove(version)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(|k| k.as_str())
    }
}
