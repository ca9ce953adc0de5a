//! # Bitcask - read path for Bitcask directories
//!
//! Opens a directory of Bitcask data files, rebuilds the in-memory keydir
//! from them, and serves point lookups and full scans.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        BITCASK                           │
//! │                                                          │
//! │ load.rs → list generations (oldest → newest)             │
//! │             |                                            │
//! │             |  for each generation:                      │
//! │             |    .hint present? ── yes ─► HintFileReader │
//! │             |          no                                │
//! │             |          └───────────────► DataFileReader  │
//! │             v                                            │
//! │           Keydir::merge (last write wins)                │
//! │                                                          │
//! │ read.rs → Keydir::get → DataFileReader::read_at          │
//! │            (tombstone ⇒ KeyNotFound)                     │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module    | Purpose                                             |
//! |-----------|-----------------------------------------------------|
//! | `lib.rs`  | `Bitcask` struct, constructors, accessors, `Debug`  |
//! | [`load`]  | generation listing, hint/data loading, `LoadReport` |
//! | `read.rs` | `get()`, `get_value()`, `scan()`, `size()`, `keys()`|
//! | [`error`] | `BitcaskError`                                      |
//!
//! ## Example
//!
//! ```rust,no_run
//! use bitcask::Bitcask;
//!
//! let mut bc = Bitcask::open("/var/lib/riak/bitcask/0");
//! let report = bc.load().unwrap();
//! println!("{} keys from {} generations", bc.size(), report.generations);
//! for entry in bc.scan() {
//!     let entry = entry.unwrap();
//!     println!("{:?} = {:?}", entry.key, entry.value);
//! }
//! ```
pub mod error;
pub mod load;
mod read;

pub use config::BitcaskConfig;
pub use datafile::{DataEntry, TOMBSTONE};
pub use error::{BitcaskError, Result};
pub use keydir::{Keydir, KeydirEntry};
pub use load::{LoadReport, SkipReason, SkippedRecord};
pub use read::Scan;

use std::path::Path;

/// A Bitcask directory opened for reading.
///
/// Construction does no I/O; call [`load`](Bitcask::load) to build the
/// keydir. Data file handles are opened once per generation during loading
/// and owned by the keydir, so they are all released together when the
/// `Bitcask` is dropped, closed, or reset, including after a failed load.
pub struct Bitcask {
    pub(crate) config: BitcaskConfig,
    pub(crate) keydir: Keydir,
}

impl std::fmt::Debug for Bitcask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bitcask")
            .field("dir", &self.config.dir)
            .field("strict", &self.config.strict)
            .field("use_hints", &self.config.use_hints)
            .field("keys", &self.keydir.len())
            .field("data_files", &self.keydir.files().len())
            .finish()
    }
}

impl Bitcask {
    /// Opens the bitcask in `dir` with the default (permissive) settings.
    pub fn open<P: AsRef<Path>>(dir: P) -> Self {
        Self::with_config(BitcaskConfig::new(dir))
    }

    pub fn with_config(config: BitcaskConfig) -> Self {
        Self {
            config,
            keydir: Keydir::new(),
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.config.dir
    }

    #[must_use]
    pub fn config(&self) -> &BitcaskConfig {
        &self.config
    }

    #[must_use]
    pub fn keydir(&self) -> &Keydir {
        &self.keydir
    }

    /// Discards the keydir and closes every data file handle. The next
    /// [`load`](Bitcask::load) starts from empty.
    pub fn reset(&mut self) {
        self.keydir = Keydir::new();
    }

    /// Closes every file handle held by this bitcask.
    pub fn close(self) {
        drop(self);
    }
}

#[cfg(test)]
mod tests;
