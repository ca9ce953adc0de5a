use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::format::RecordError;

/// Errors raised by data and hint file readers.
///
/// Unlike [`RecordError`], these carry the generation and byte offset of the
/// offending record so callers can decide whether to skip it or abort.
#[derive(Debug, Error)]
pub enum DataFileError {
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A data record failed CRC32 validation.
    #[error("checksum mismatch in generation {generation} at offset {offset}")]
    Checksum { generation: u64, offset: u64 },

    /// Fewer bytes remained than a record header or payload declared.
    #[error("truncated record in generation {generation} at offset {offset}")]
    Truncated { generation: u64, offset: u64 },

    /// A file's base name does not parse as an integer generation id.
    #[error("malformed generation name: {}", .0.display())]
    MalformedGenerationName(PathBuf),
}

impl DataFileError {
    pub(crate) fn from_record(err: RecordError, generation: u64, offset: u64) -> Self {
        match err {
            RecordError::Io(e) => DataFileError::Io(e),
            RecordError::Checksum { .. } => DataFileError::Checksum { generation, offset },
            RecordError::Truncated { .. } => DataFileError::Truncated { generation, offset },
        }
    }

    /// Returns `true` for errors that describe a bad record rather than a
    /// failing file system.
    #[must_use]
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            DataFileError::Checksum { .. } | DataFileError::Truncated { .. }
        )
    }
}
