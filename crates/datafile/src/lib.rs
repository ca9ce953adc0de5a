//! # Datafile - Bitcask file formats
//!
//! Readers for the two on-disk file kinds of a Bitcask directory.
//!
//! ```text
//! bitcask/
//! ├── 1287525890.data   <- append-only log of every write
//! ├── 1287525890.hint   <- optional compact index of the .data file
//! ├── 1287529012.data
//! └── ...
//! ```
//!
//! ## Data file
//!
//! ```text
//! ┌──────────┬───────────┬──────────┬────────────┬───────┬─────────┐
//! │ crc32 4B │ tstamp 4B │ ksz 2B   │ value_sz 4B│ key   │ value   │
//! └──────────┴───────────┴──────────┴────────────┴───────┴─────────┘
//! ```
//!
//! ## Hint file
//!
//! ```text
//! ┌───────────┬────────┬────────────┬─────────────┬───────┐
//! │ tstamp 4B │ ksz 2B │ value_sz 4B│ value_pos 8B│ key   │
//! └───────────┴────────┴────────────┴─────────────┴───────┘
//! ```
//!
//! All integers are big-endian. A delete is an ordinary record whose value is
//! [`TOMBSTONE`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use datafile::{DataFileReader, ScanMode};
//!
//! let mut f = DataFileReader::open("bitcask/1.data").unwrap();
//! for rec in f.iter(true, ScanMode::Permissive).unwrap() {
//!     match rec {
//!         Ok(r) => println!("{} bytes at {}", r.len, r.offset),
//!         Err(e) => eprintln!("skipping: {}", e),
//!     }
//! }
//! ```

mod error;
mod format;
mod generation;
mod hint;
mod reader;

pub use error::DataFileError;
pub use format::{
    decode_data_record, encode_data_record, encode_hint_record, read_data_record,
    read_hint_record, DataEntry, HintEntry, Located, RecordError, ScanMode, DATA_HEADER_BYTES,
    HINT_HEADER_BYTES, TOMBSTONE,
};
pub use generation::{data_path, generation_id, hint_path, DATA_EXTENSION, HINT_EXTENSION};
pub use hint::{HintEntries, HintFileReader};
pub use reader::{DataEntries, DataFileReader};

#[cfg(test)]
mod tests;
