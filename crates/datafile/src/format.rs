//! Bitcask record codec.
//!
//! ## Data record (14-byte header)
//!
//! ```text
//! [crc32: u32 BE][timestamp: u32 BE][key_len: u16 BE][value_len: u32 BE][key][value]
//! ```
//!
//! The CRC32 covers everything after itself: the remaining 10 header bytes,
//! the key and the value.
//!
//! ## Hint record (18-byte header)
//!
//! ```text
//! [timestamp: u32 BE][key_len: u16 BE][value_size: u32 BE][value_offset: u64 BE][key]
//! ```
//!
//! `value_offset` is written as two big-endian 32-bit halves, high word first,
//! which is byte-for-byte identical to a big-endian u64. Hint records carry no
//! checksum.
//!
//! Both decoders treat zero bytes remaining at a record boundary as a clean end
//! of stream (`Ok(None)`). Any shorter read after that is a truncated record.

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use crc32fast::Hasher as Crc32;
use std::io::{self, Read};
use thiserror::Error;

/// Size of a data record header: crc (4) + timestamp (4) + key_len (2) + value_len (4).
pub const DATA_HEADER_BYTES: usize = 4 + 4 + 2 + 4;

/// Size of a hint record header: timestamp (4) + key_len (2) + value_size (4) + value_offset (8).
pub const HINT_HEADER_BYTES: usize = 4 + 2 + 4 + 8;

/// Value payload that marks a key as deleted.
pub const TOMBSTONE: &[u8] = b"bitcask_tombstone";

/// One logical write decoded from a data file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataEntry {
    pub timestamp: u32,
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl DataEntry {
    /// Returns `true` if the value is the tombstone marker.
    #[must_use]
    pub fn is_tombstone(&self) -> bool {
        self.value == TOMBSTONE
    }

    /// Number of bytes this entry occupies in a data file.
    #[must_use]
    pub fn encoded_len(&self) -> u64 {
        (DATA_HEADER_BYTES + self.key.len() + self.value.len()) as u64
    }
}

/// A pointer into a data file, read from a hint file.
///
/// `value_offset` is the byte offset of the full data record and `value_size`
/// its encoded length, so the pair can be handed straight to
/// [`DataFileReader::read_at`](crate::DataFileReader::read_at).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintEntry {
    pub timestamp: u32,
    pub key: Vec<u8>,
    pub value_size: u32,
    pub value_offset: u64,
}

/// A decoded record together with where it sits in its file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located<T> {
    /// Byte offset of the first header byte.
    pub offset: u64,
    /// Encoded length in bytes (header + key + value).
    pub len: u64,
    pub entry: T,
}

/// How a sequential scan reacts to a corrupt data record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanMode {
    /// Report the bad record and keep scanning from the next one.
    #[default]
    Permissive,
    /// Report the bad record and stop.
    Strict,
}

impl ScanMode {
    /// Maps a `strict` flag onto a mode.
    #[must_use]
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            ScanMode::Strict
        } else {
            ScanMode::Permissive
        }
    }
}

/// Errors raised while decoding a single record, without file context.
#[derive(Debug, Error)]
pub enum RecordError {
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The stored CRC32 does not match the record contents.
    #[error("crc32 mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    Checksum { stored: u32, computed: u32 },

    /// The stream ended inside a record.
    #[error("truncated record: needed {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },
}

/// Reads into `buf` until it is full or the source is exhausted.
///
/// Returns the number of bytes read; anything short of `buf.len()` means EOF.
fn fill<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Reads exactly `len` bytes, growing the buffer as data arrives so that a
/// corrupt length field cannot force a huge up-front allocation.
fn read_payload<R: Read>(r: &mut R, len: usize) -> Result<Vec<u8>, RecordError> {
    let mut payload = Vec::new();
    r.take(len as u64).read_to_end(&mut payload)?;
    if payload.len() < len {
        return Err(RecordError::Truncated {
            needed: len,
            available: payload.len(),
        });
    }
    Ok(payload)
}

fn data_checksum(header_tail: &[u8], key: &[u8], value: &[u8]) -> u32 {
    let mut hasher = Crc32::new();
    hasher.update(header_tail);
    hasher.update(key);
    hasher.update(value);
    hasher.finalize()
}

/// Decodes the next data record from `r`.
///
/// Returns `Ok(None)` when `r` is exhausted exactly at a record boundary.
/// On a checksum mismatch the whole record has still been consumed, so the
/// caller may continue reading from the next record.
pub fn read_data_record<R: Read>(r: &mut R) -> Result<Option<DataEntry>, RecordError> {
    let mut header = [0u8; DATA_HEADER_BYTES];
    let n = fill(r, &mut header)?;
    if n == 0 {
        return Ok(None);
    }
    if n < DATA_HEADER_BYTES {
        return Err(RecordError::Truncated {
            needed: DATA_HEADER_BYTES,
            available: n,
        });
    }

    let stored = BigEndian::read_u32(&header[0..4]);
    let timestamp = BigEndian::read_u32(&header[4..8]);
    let key_len = BigEndian::read_u16(&header[8..10]) as usize;
    let value_len = BigEndian::read_u32(&header[10..14]) as usize;

    let mut key = read_payload(r, key_len + value_len)?;
    let value = key.split_off(key_len);

    let computed = data_checksum(&header[4..], &key, &value);
    if computed != stored {
        return Err(RecordError::Checksum { stored, computed });
    }

    Ok(Some(DataEntry {
        timestamp,
        key,
        value,
    }))
}

/// Decodes one data record from the start of `buf`.
///
/// Returns the entry and the number of bytes it occupied.
pub fn decode_data_record(buf: &[u8]) -> Result<Option<(DataEntry, usize)>, RecordError> {
    let mut rest = buf;
    let entry = read_data_record(&mut rest)?;
    Ok(entry.map(|e| (e, buf.len() - rest.len())))
}

/// Decodes the next hint record from `r`.
///
/// Returns `Ok(None)` when `r` is exhausted exactly at a record boundary.
pub fn read_hint_record<R: Read>(r: &mut R) -> Result<Option<HintEntry>, RecordError> {
    let mut header = [0u8; HINT_HEADER_BYTES];
    let n = fill(r, &mut header)?;
    if n == 0 {
        return Ok(None);
    }
    if n < HINT_HEADER_BYTES {
        return Err(RecordError::Truncated {
            needed: HINT_HEADER_BYTES,
            available: n,
        });
    }

    let timestamp = BigEndian::read_u32(&header[0..4]);
    let key_len = BigEndian::read_u16(&header[4..6]) as usize;
    let value_size = BigEndian::read_u32(&header[6..10]);
    let high = BigEndian::read_u32(&header[10..14]) as u64;
    let low = BigEndian::read_u32(&header[14..18]) as u64;
    let value_offset = (high << 32) | low;

    let key = read_payload(r, key_len)?;

    Ok(Some(HintEntry {
        timestamp,
        key,
        value_size,
        value_offset,
    }))
}

fn key_len_u16(key: &[u8]) -> io::Result<u16> {
    u16::try_from(key.len()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "key too large (exceeds u16::MAX bytes)",
        )
    })
}

/// Encodes a data record. The inverse of [`read_data_record`].
///
/// # Errors
///
/// Returns `InvalidInput` if the key exceeds `u16::MAX` bytes or the value
/// exceeds `u32::MAX` bytes.
pub fn encode_data_record(timestamp: u32, key: &[u8], value: &[u8]) -> io::Result<Vec<u8>> {
    let key_len = key_len_u16(key)?;
    let value_len = u32::try_from(value.len()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "value too large (exceeds u32::MAX bytes)",
        )
    })?;

    let mut buf = Vec::with_capacity(DATA_HEADER_BYTES + key.len() + value.len());
    // crc placeholder, filled in once the rest of the record is in place
    buf.extend_from_slice(&[0u8; 4]);
    buf.write_u32::<BigEndian>(timestamp)?;
    buf.write_u16::<BigEndian>(key_len)?;
    buf.write_u32::<BigEndian>(value_len)?;
    buf.extend_from_slice(key);
    buf.extend_from_slice(value);

    let crc = data_checksum(&buf[4..DATA_HEADER_BYTES], key, value);
    BigEndian::write_u32(&mut buf[0..4], crc);
    Ok(buf)
}

/// Encodes a hint record. The inverse of [`read_hint_record`].
///
/// # Errors
///
/// Returns `InvalidInput` if the key exceeds `u16::MAX` bytes.
pub fn encode_hint_record(
    timestamp: u32,
    key: &[u8],
    value_size: u32,
    value_offset: u64,
) -> io::Result<Vec<u8>> {
    let key_len = key_len_u16(key)?;

    let mut buf = Vec::with_capacity(HINT_HEADER_BYTES + key.len());
    buf.write_u32::<BigEndian>(timestamp)?;
    buf.write_u16::<BigEndian>(key_len)?;
    buf.write_u32::<BigEndian>(value_size)?;
    buf.write_u32::<BigEndian>((value_offset >> 32) as u32)?;
    buf.write_u32::<BigEndian>(value_offset as u32)?;
    buf.extend_from_slice(key);
    Ok(buf)
}

/// Read adapter that counts the bytes pulled through it.
pub(crate) struct Counted<'a, R> {
    inner: &'a mut R,
    count: u64,
}

impl<'a, R: Read> Counted<'a, R> {
    pub(crate) fn new(inner: &'a mut R) -> Self {
        Self { inner, count: 0 }
    }

    pub(crate) fn count(&self) -> u64 {
        self.count
    }
}

impl<R: Read> Read for Counted<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.count += n as u64;
        Ok(n)
    }
}
