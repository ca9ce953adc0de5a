
use crate::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes `records` as `<dir>/<generation>.data`, returning the path and the
/// `(offset, len)` of each record.
pub(crate) fn write_data_file(
    dir: &Path,
    generation: u64,
    records: &[(u32, &[u8], &[u8])],
) -> (PathBuf, Vec<(u64, u64)>) {
    let path = dir.join(format!("{}.{}", generation, DATA_EXTENSION));
    let mut bytes = Vec::new();
    let mut extents = Vec::new();
    for (ts, key, value) in records {
        let rec = encode_data_record(*ts, key, value).unwrap();
        extents.push((bytes.len() as u64, rec.len() as u64));
        bytes.extend_from_slice(&rec);
    }
    fs::write(&path, &bytes).unwrap();
    (path, extents)
}

/// Writes a hint file next to `data_path` describing each `(ts, key, offset, len)`.
pub(crate) fn write_hint_file(data_path: &Path, hints: &[(u32, &[u8], u64, u64)]) -> PathBuf {
    let path = hint_path(data_path);
    let mut bytes = Vec::new();
    for (ts, key, offset, len) in hints {
        bytes.extend_from_slice(&encode_hint_record(*ts, key, *len as u32, *offset).unwrap());
    }
    fs::write(&path, &bytes).unwrap();
    path
}
