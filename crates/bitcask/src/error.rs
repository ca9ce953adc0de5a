use std::io;
use std::path::PathBuf;

use datafile::DataFileError;
use thiserror::Error;

/// Errors surfaced by [`Bitcask`](crate::Bitcask).
#[derive(Debug, Error)]
pub enum BitcaskError {
    /// An underlying I/O error (missing directory, permission denied, ...).
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A data record failed CRC32 validation.
    #[error("checksum mismatch in generation {generation} at offset {offset}")]
    Checksum { generation: u64, offset: u64 },

    /// A data record ended before its declared length.
    #[error("truncated record in generation {generation} at offset {offset}")]
    Truncated { generation: u64, offset: u64 },

    /// The requested key is absent or its newest record is a tombstone.
    #[error("key not found: {}", String::from_utf8_lossy(.0))]
    KeyNotFound(Vec<u8>),

    /// A `.data` file's base name is not an integer generation id.
    #[error("malformed generation name: {}", .0.display())]
    MalformedGenerationName(PathBuf),

    /// A keydir entry led to a record for a different key. Hint files carry
    /// no checksum, so this is how a damaged one shows up.
    #[error("keydir entry for generation {generation} at offset {offset} points at another key")]
    IndexMismatch { generation: u64, offset: u64 },
}

impl From<DataFileError> for BitcaskError {
    fn from(err: DataFileError) -> Self {
        match err {
            DataFileError::Io(e) => BitcaskError::Io(e),
            DataFileError::Checksum { generation, offset } => {
                BitcaskError::Checksum { generation, offset }
            }
            DataFileError::Truncated { generation, offset } => {
                BitcaskError::Truncated { generation, offset }
            }
            DataFileError::MalformedGenerationName(path) => {
                BitcaskError::MalformedGenerationName(path)
            }
        }
    }
}

/// Result type used throughout the coordinator.
pub type Result<T> = std::result::Result<T, BitcaskError>;
