//! Generation ids and sibling file naming.
//!
//! A bitcask directory holds `<generation>.data` files, each optionally paired
//! with a `<generation>.hint` file sharing its base name. Ascending integer
//! order of the base name is chronological order.

use std::path::{Path, PathBuf};

use crate::DataFileError;

/// Extension of data files.
pub const DATA_EXTENSION: &str = "data";

/// Extension of hint files.
pub const HINT_EXTENSION: &str = "hint";

/// Parses the generation id from a file's base name (`"42.data"` -> `42`).
///
/// # Errors
///
/// Returns [`DataFileError::MalformedGenerationName`] if the base name is not
/// an unsigned integer.
pub fn generation_id(path: &Path) -> Result<u64, DataFileError> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.parse::<u64>().ok())
        .ok_or_else(|| DataFileError::MalformedGenerationName(path.to_path_buf()))
}

/// Path of the hint file that pairs with `data_path`.
#[must_use]
pub fn hint_path(data_path: &Path) -> PathBuf {
    data_path.with_extension(HINT_EXTENSION)
}

/// Path of the data file that a hint file at `hint_path` indexes.
#[must_use]
pub fn data_path(hint_path: &Path) -> PathBuf {
    hint_path.with_extension(DATA_EXTENSION)
}
