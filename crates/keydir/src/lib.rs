//! # Keydir - the Bitcask in-memory index
//!
//! Maps every key to the location of its most recent record:
//!
//! ```text
//! key ──► KeydirEntry { generation_index, value_size, value_offset, timestamp }
//!                              │
//!                              ▼
//!                      files[generation_index] ──► DataFileReader
//! ```
//!
//! `generation_index` is a position in the keydir's own list of registered
//! data files, not the generation id from the file name. Files are registered
//! in the order they are first loaded, which for a full load is oldest to
//! newest.
//!
//! A key whose newest record is a tombstone keeps its entry, flagged
//! [`tombstone`](KeydirEntry::tombstone), so an older write in a later file
//! cannot resurrect it. [`live_len`](Keydir::live_len) and
//! [`live_keys`](Keydir::live_keys) leave those keys out.

use datafile::DataFileReader;
use std::collections::BTreeMap;
use std::path::Path;

/// Location and timestamp of the newest record seen for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeydirEntry {
    /// Index into [`Keydir::files`].
    pub generation_index: usize,
    /// Encoded length of the data record.
    pub value_size: u32,
    /// Byte offset of the data record.
    pub value_offset: u64,
    pub timestamp: u32,
    /// The record is a delete marker.
    pub tombstone: bool,
}

impl KeydirEntry {
    /// Last-write-wins: `self` replaces `current` when its timestamp is at
    /// least as new.
    ///
    /// Ties go to `self` because candidates are offered in processing order
    /// (oldest generation first, file order within a generation), so the
    /// later physical write wins.
    #[must_use]
    pub fn supersedes(&self, current: &KeydirEntry) -> bool {
        self.timestamp >= current.timestamp
    }
}

/// The in-memory index plus the data files it points into.
///
/// Owns every registered [`DataFileReader`]; dropping the keydir closes all
/// of their file handles.
#[derive(Debug, Default)]
pub struct Keydir {
    entries: BTreeMap<Vec<u8>, KeydirEntry>,
    files: Vec<DataFileReader>,
}

impl Keydir {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &[u8]) -> Option<&KeydirEntry> {
        self.entries.get(key)
    }

    /// Unconditional overwrite. Use [`merge`](Keydir::merge) to apply
    /// last-write-wins.
    pub fn put(&mut self, key: Vec<u8>, entry: KeydirEntry) {
        self.entries.insert(key, entry);
    }

    /// Offers `candidate` for `key`, keeping it only if it supersedes the
    /// current entry. Returns `true` if the keydir changed.
    pub fn merge(&mut self, key: Vec<u8>, candidate: KeydirEntry) -> bool {
        match self.entries.get(&key) {
            Some(current) if !candidate.supersedes(current) => false,
            _ => {
                self.put(key, candidate);
                true
            }
        }
    }

    /// Registers a data file and returns its generation index.
    ///
    /// Files are identified by canonical path, so two spellings of the same
    /// file share one index. If the file is already registered, `reader` is
    /// dropped and the existing index is returned.
    pub fn register_file(&mut self, reader: DataFileReader) -> usize {
        if let Some(index) = self.position_of(reader.canonical_path()) {
            return index;
        }
        self.files.push(reader);
        self.files.len() - 1
    }

    /// Generation index of the registered file at `path`, if any. `path`
    /// matches either the path a file was opened with or its canonical form.
    pub fn position_of(&self, path: &Path) -> Option<usize> {
        self.files
            .iter()
            .position(|f| f.path() == path || f.canonical_path() == path)
    }

    /// Registered data files, indexed by generation index.
    pub fn files(&self) -> &[DataFileReader] {
        &self.files
    }

    pub fn files_mut(&mut self) -> &mut [DataFileReader] {
        &mut self.files
    }

    pub fn file_mut(&mut self, generation_index: usize) -> Option<&mut DataFileReader> {
        self.files.get_mut(generation_index)
    }

    /// All indexed keys. Order is not meaningful.
    pub fn keys(&self) -> impl Iterator<Item = &[u8]> {
        self.entries.keys().map(|k| k.as_slice())
    }

    /// Keys whose newest record is not a tombstone.
    pub fn live_keys(&self) -> impl Iterator<Item = &[u8]> {
        self.entries
            .iter()
            .filter(|(_, e)| !e.tombstone)
            .map(|(k, _)| k.as_slice())
    }

    /// All `(key, entry)` pairs. Order is not meaningful.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &KeydirEntry)> {
        self.entries.iter().map(|(k, e)| (k.as_slice(), e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Number of keys whose newest record is not a tombstone.
    pub fn live_len(&self) -> usize {
        self.entries.values().filter(|e| !e.tombstone).count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
