/// Read path: get(), scan() and keydir accessors.
///
/// Every lookup goes through the keydir and then reads the exact byte extent
/// of the record from its data file, validating the checksum. A lookup that
/// lands on a tombstone reports the key as missing.
use datafile::DataEntry;
use std::path::Path;
use std::vec;

use crate::{Bitcask, BitcaskError, Result};

impl Bitcask {
    /// Looks up `key` and returns its newest record.
    ///
    /// # Errors
    ///
    /// - [`BitcaskError::KeyNotFound`] if the key is not in the keydir or its
    ///   newest record is a tombstone.
    /// - [`BitcaskError::Checksum`] / [`BitcaskError::Truncated`] if the
    ///   record on disk is damaged. Corrupt data is never returned.
    /// - [`BitcaskError::IndexMismatch`] if the record found belongs to a
    ///   different key.
    pub fn get(&mut self, key: &[u8]) -> Result<DataEntry> {
        let entry = *self
            .keydir
            .get(key)
            .ok_or_else(|| BitcaskError::KeyNotFound(key.to_vec()))?;

        let file = self
            .keydir
            .file_mut(entry.generation_index)
            .ok_or_else(|| BitcaskError::KeyNotFound(key.to_vec()))?;
        let record = file.read_at(entry.value_offset, Some(entry.value_size))?;

        if record.key != key {
            return Err(BitcaskError::IndexMismatch {
                generation: file.generation(),
                offset: entry.value_offset,
            });
        }
        if record.is_tombstone() {
            return Err(BitcaskError::KeyNotFound(key.to_vec()));
        }
        Ok(record)
    }

    /// Like [`get`](Bitcask::get) but returns only the value.
    pub fn get_value(&mut self, key: &[u8]) -> Result<Vec<u8>> {
        self.get(key).map(|record| record.value)
    }

    /// Iterates the newest record of every live key.
    ///
    /// The set of keys is taken when `scan` is called; each record is read
    /// lazily as the iterator advances. Tombstoned keys are skipped, so an
    /// undamaged bitcask yields exactly [`size`](Bitcask::size) entries.
    /// Order follows the keydir and carries no meaning.
    pub fn scan(&mut self) -> Scan<'_> {
        let keys: Vec<Vec<u8>> = self.keydir.live_keys().map(<[u8]>::to_vec).collect();
        Scan {
            bitcask: self,
            keys: keys.into_iter(),
        }
    }

    /// Number of live keys. Keys whose newest record is a tombstone are not
    /// counted.
    #[must_use]
    pub fn size(&self) -> usize {
        self.keydir.live_len()
    }

    /// All live keys. Order is not meaningful.
    pub fn keys(&self) -> impl Iterator<Item = &[u8]> {
        self.keydir.live_keys()
    }

    /// Paths of the data files registered so far, by generation index.
    pub fn data_file_list(&self) -> Vec<&Path> {
        self.keydir.files().iter().map(|f| f.path()).collect()
    }
}

/// Iterator returned by [`Bitcask::scan`].
pub struct Scan<'a> {
    bitcask: &'a mut Bitcask,
    keys: vec::IntoIter<Vec<u8>>,
}

impl Iterator for Scan<'_> {
    type Item = Result<DataEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let key = self.keys.next()?;
            match self.bitcask.get(&key) {
                // tombstone
                Err(BitcaskError::KeyNotFound(_)) => continue,
                other => return Some(other),
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.keys.size_hint().1)
    }
}
