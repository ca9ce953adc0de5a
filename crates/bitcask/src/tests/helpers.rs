use datafile::{encode_data_record, encode_hint_record};
use std::fs;
use std::path::{Path, PathBuf};

pub type Record<'a> = (u32, &'a [u8], &'a [u8]);

/// Writes `<dir>/<generation>.data` and returns `(offset, len)` per record.
pub fn write_generation(dir: &Path, generation: u64, records: &[Record<'_>]) -> Vec<(u64, u64)> {
    let mut bytes = Vec::new();
    let mut extents = Vec::new();
    for (ts, key, value) in records {
        let rec = encode_data_record(*ts, key, value).unwrap();
        extents.push((bytes.len() as u64, rec.len() as u64));
        bytes.extend_from_slice(&rec);
    }
    fs::write(data_file(dir, generation), &bytes).unwrap();
    extents
}

/// Writes `<dir>/<generation>.hint` from explicit `(ts, key, offset, len)` tuples.
pub fn write_hints(dir: &Path, generation: u64, hints: &[(u32, &[u8], u64, u64)]) -> PathBuf {
    let mut bytes = Vec::new();
    for (ts, key, offset, len) in hints {
        bytes.extend_from_slice(&encode_hint_record(*ts, key, *len as u32, *offset).unwrap());
    }
    let path = hint_file(dir, generation);
    fs::write(&path, &bytes).unwrap();
    path
}

/// Writes a data file and a hint file describing every record in it.
pub fn write_hinted_generation(dir: &Path, generation: u64, records: &[Record<'_>]) -> PathBuf {
    let extents = write_generation(dir, generation, records);
    let hints: Vec<(u32, &[u8], u64, u64)> = records
        .iter()
        .zip(&extents)
        .map(|((ts, key, _), (offset, len))| (*ts, *key, *offset, *len))
        .collect();
    write_hints(dir, generation, &hints)
}

pub fn data_file(dir: &Path, generation: u64) -> PathBuf {
    dir.join(format!("{}.data", generation))
}

pub fn hint_file(dir: &Path, generation: u64) -> PathBuf {
    dir.join(format!("{}.hint", generation))
}

/// Flips the last byte of the record at `extent` in place.
pub fn corrupt_record(path: &Path, extent: (u64, u64)) {
    let mut raw = fs::read(path).unwrap();
    raw[(extent.0 + extent.1 - 1) as usize] ^= 0xFF;
    fs::write(path, &raw).unwrap();
}
