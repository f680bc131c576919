//! Projection of walked entries into the externally consumed record set.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::entry::PathEntry;

/// One element of an enumeration result
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PathRecord {
    pub path: String,
    pub file_size: u64,
}

impl PathRecord {
    pub fn new<P: Into<String>>(path: P, file_size: u64) -> Self {
        Self {
            path: path.into(),
            file_size,
        }
    }

    /// Returns the set identity of the record.
    ///
    /// The digest covers the length-prefixed path followed by the size, both
    /// little-endian, so it is stable across processes and platforms.
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        let mut hasher = blake3::Hasher::new();
        let _ = hasher.update(&(self.path.len() as u64).to_le_bytes());
        let _ = hasher.update(self.path.as_bytes());
        let _ = hasher.update(&self.file_size.to_le_bytes());
        Fingerprint(*hasher.finalize().as_bytes())
    }
}

impl From<PathEntry> for PathRecord {
    fn from(entry: PathEntry) -> Self {
        let (path, file_size) = entry.into_parts();
        Self { path, file_size }
    }
}

/// BLAKE3 digest identifying a [`PathRecord`]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", blake3::Hash::from(self.0).to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({self})")
    }
}

/// Duplicate-free, order-independent set of records.
///
/// Records are keyed by their [`Fingerprint`], so iteration follows fingerprint order
/// and never the order in which entries were discovered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathSet {
    records: BTreeMap<Fingerprint, PathRecord>,
}

impl PathSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record, returning `false` if an identical one was already present
    pub fn insert(&mut self, record: PathRecord) -> bool {
        self.records.insert(record.fingerprint(), record).is_none()
    }

    #[must_use]
    pub fn contains(&self, record: &PathRecord) -> bool {
        self.records.contains_key(&record.fingerprint())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathRecord> {
        self.records.values()
    }

    pub fn fingerprints(&self) -> impl Iterator<Item = &Fingerprint> {
        self.records.keys()
    }
}

impl FromIterator<PathRecord> for PathSet {
    fn from_iter<I: IntoIterator<Item = PathRecord>>(iter: I) -> Self {
        let mut set = Self::new();
        for record in iter {
            let _ = set.insert(record);
        }
        set
    }
}

impl IntoIterator for PathSet {
    type Item = PathRecord;
    type IntoIter = std::collections::btree_map::IntoValues<Fingerprint, PathRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_values()
    }
}

impl Serialize for PathSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for PathSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Vec::<PathRecord>::deserialize(deserializer)?
            .into_iter()
            .collect())
    }
}

/// Converts walked entries into the result set, dropping any directories.
pub fn project<I>(entries: I) -> PathSet
where
    I: IntoIterator<Item = PathEntry>,
{
    entries
        .into_iter()
        .filter(|entry| !entry.is_dir())
        .map(PathRecord::from)
        .collect()
}
