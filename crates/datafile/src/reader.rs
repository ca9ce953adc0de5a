use std::fs::{self, File};
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::format::{self, Counted, DataEntry, HintEntry, Located, ScanMode};
use crate::generation::generation_id;
use crate::hint::HintFileReader;
use crate::DataFileError;

/// Sequential and random-access reader over one data file.
///
/// The reader owns a single buffered file handle and one cursor, so it is not
/// meant to be shared between threads. Opening another reader over the same
/// path is cheap and shares no state.
///
/// If a sibling `.hint` file exists when the data file is opened, it is opened
/// once alongside it and stays attached for the reader's lifetime (see
/// [`hint_file`](DataFileReader::hint_file)). Dropping the reader closes both
/// handles.
#[derive(Debug)]
pub struct DataFileReader {
    path: PathBuf,
    /// `path` with symlinks and `.`/`..` resolved, used as the file's identity.
    canonical: PathBuf,
    generation: u64,
    file: BufReader<File>,
    /// Cursor position, tracked locally to avoid a seek per record.
    pos: u64,
    hint: Option<HintFileReader>,
}

impl DataFileReader {
    /// Opens a data file named `<generation>.data`, plus its hint file if one
    /// exists next to it.
    ///
    /// # Errors
    ///
    /// Returns [`DataFileError::MalformedGenerationName`] if the base name is
    /// not an integer, or an I/O error if either file cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DataFileError> {
        let path = path.as_ref().to_path_buf();
        let generation = generation_id(&path)?;
        let file = File::open(&path)?;
        let canonical = fs::canonicalize(&path)?;
        let hint = HintFileReader::open_sibling(&path, generation)?;

        Ok(Self {
            path,
            canonical,
            generation,
            file: BufReader::new(file),
            pos: 0,
            hint,
        })
    }

    /// Path as passed to [`open`](DataFileReader::open).
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Absolute path of the file with every symlink and `.`/`..` resolved.
    #[must_use]
    pub fn canonical_path(&self) -> &Path {
        &self.canonical
    }

    /// Generation id parsed from the file name.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Current cursor position in bytes.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Moves the cursor to `offset`.
    pub fn seek(&mut self, offset: u64) -> Result<(), DataFileError> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.pos = offset;
        Ok(())
    }

    /// Moves the cursor back to the start of the file.
    pub fn rewind(&mut self) -> Result<(), DataFileError> {
        self.seek(0)
    }

    /// The hint file paired with this data file, if one was present on open.
    pub fn hint_file(&mut self) -> Option<&mut HintFileReader> {
        self.hint.as_mut()
    }

    #[must_use]
    pub fn has_hint_file(&self) -> bool {
        self.hint.is_some()
    }

    /// Decodes the record at the cursor and advances past it.
    ///
    /// Returns `Ok(None)` at end of file. A checksum failure still advances
    /// the cursor past the bad record.
    pub fn read(&mut self) -> Result<Option<Located<DataEntry>>, DataFileError> {
        let start = self.pos;
        let mut src = Counted::new(&mut self.file);
        let decoded = format::read_data_record(&mut src);
        let consumed = src.count();
        self.pos += consumed;

        match decoded {
            Ok(Some(entry)) => Ok(Some(Located {
                offset: start,
                len: consumed,
                entry,
            })),
            Ok(None) => Ok(None),
            Err(e) => Err(DataFileError::from_record(e, self.generation, start)),
        }
    }

    /// Reads the single record at `offset`.
    ///
    /// With `size`, exactly `size` bytes are read into a buffer and the record
    /// is decoded from that buffer. This is the path used for keydir lookups,
    /// where the record's extent is already known. The checksum is validated
    /// either way.
    ///
    /// # Errors
    ///
    /// Returns [`DataFileError::Truncated`] if the file ends before the
    /// record does (including when `offset` is at end of file) and
    /// [`DataFileError::Checksum`] if the record is corrupt.
    pub fn read_at(&mut self, offset: u64, size: Option<u32>) -> Result<DataEntry, DataFileError> {
        self.seek(offset)?;

        let Some(size) = size else {
            return match self.read()? {
                Some(located) => Ok(located.entry),
                None => Err(DataFileError::Truncated {
                    generation: self.generation,
                    offset,
                }),
            };
        };

        let mut buf = Vec::with_capacity(size as usize);
        (&mut self.file).take(u64::from(size)).read_to_end(&mut buf)?;
        self.pos += buf.len() as u64;

        if buf.len() < size as usize {
            return Err(DataFileError::Truncated {
                generation: self.generation,
                offset,
            });
        }

        match format::decode_data_record(&buf) {
            Ok(Some((entry, _))) => Ok(entry),
            Ok(None) => Err(DataFileError::Truncated {
                generation: self.generation,
                offset,
            }),
            Err(e) => Err(DataFileError::from_record(e, self.generation, offset)),
        }
    }

    /// Reads the record a hint entry points at.
    pub fn resolve(&mut self, hint: &HintEntry) -> Result<DataEntry, DataFileError> {
        self.read_at(hint.value_offset, Some(hint.value_size))
    }

    /// Iterates records from the cursor (or from byte 0 if `rewind`) to end
    /// of file.
    ///
    /// Corrupt records are yielded as `Err` items. In
    /// [`ScanMode::Permissive`] the iterator carries on with the next record
    /// after a checksum failure; in [`ScanMode::Strict`] it stops after the
    /// first error. A truncated record or an I/O error always ends iteration.
    pub fn iter(&mut self, rewind: bool, mode: ScanMode) -> Result<DataEntries<'_>, DataFileError> {
        if rewind {
            self.rewind()?;
        }
        Ok(DataEntries {
            reader: self,
            mode,
            done: false,
        })
    }
}

/// Iterator returned by [`DataFileReader::iter`].
pub struct DataEntries<'a> {
    reader: &'a mut DataFileReader,
    mode: ScanMode,
    done: bool,
}

impl Iterator for DataEntries<'_> {
    type Item = Result<Located<DataEntry>, DataFileError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.reader.read() {
            Ok(Some(located)) => Some(Ok(located)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                let resumable = self.mode == ScanMode::Permissive
                    && matches!(e, DataFileError::Checksum { .. });
                if !resumable {
                    self.done = true;
                }
                Some(Err(e))
            }
        }
    }
}
