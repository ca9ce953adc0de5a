use std::fs::File;
use std::io::{self, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::format::{self, Counted, HintEntry, Located};
use crate::generation::{generation_id, hint_path};
use crate::DataFileError;

/// Sequential and random-access reader over one hint file.
///
/// A hint file is a compact index of a data file: each record names a key and
/// the location of its data record, without the value. Hint records have no
/// checksum, so a damaged hint file can only be noticed when its entries
/// fail to resolve. Hint files can always be rebuilt from their data file.
///
/// The reader remembers the path of the data file it indexes; pass its
/// entries to [`DataFileReader::resolve`](crate::DataFileReader::resolve) on
/// that file to fetch values.
#[derive(Debug)]
pub struct HintFileReader {
    path: PathBuf,
    data_file: PathBuf,
    generation: u64,
    file: BufReader<File>,
    pos: u64,
}

impl HintFileReader {
    /// Opens the hint file at `path` as the index of `data_file`.
    ///
    /// # Errors
    ///
    /// Returns [`DataFileError::MalformedGenerationName`] if `data_file` is
    /// not named after an integer generation, or an I/O error if `path`
    /// cannot be opened.
    pub fn open<P: AsRef<Path>, D: AsRef<Path>>(path: P, data_file: D) -> Result<Self, DataFileError> {
        let data_file = data_file.as_ref().to_path_buf();
        let generation = generation_id(&data_file)?;
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        Ok(Self::from_parts(path, data_file, generation, file))
    }

    /// Opens the sibling hint file of `data_file`, if there is one.
    pub(crate) fn open_sibling(data_file: &Path, generation: u64) -> Result<Option<Self>, DataFileError> {
        let path = hint_path(data_file);
        match File::open(&path) {
            Ok(file) => Ok(Some(Self::from_parts(
                path,
                data_file.to_path_buf(),
                generation,
                file,
            ))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn from_parts(path: PathBuf, data_file: PathBuf, generation: u64, file: File) -> Self {
        Self {
            path,
            data_file,
            generation,
            file: BufReader::new(file),
            pos: 0,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the data file this hint file indexes.
    #[must_use]
    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn position(&self) -> u64 {
        self.pos
    }

    pub fn seek(&mut self, offset: u64) -> Result<(), DataFileError> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.pos = offset;
        Ok(())
    }

    pub fn rewind(&mut self) -> Result<(), DataFileError> {
        self.seek(0)
    }

    /// Decodes the hint record at the cursor and advances past it.
    ///
    /// Returns `Ok(None)` at end of file.
    pub fn read(&mut self) -> Result<Option<Located<HintEntry>>, DataFileError> {
        let start = self.pos;
        let mut src = Counted::new(&mut self.file);
        let decoded = format::read_hint_record(&mut src);
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

    /// Reads the single hint record at `offset`.
    pub fn read_at(&mut self, offset: u64) -> Result<HintEntry, DataFileError> {
        self.seek(offset)?;
        match self.read()? {
            Some(located) => Ok(located.entry),
            None => Err(DataFileError::Truncated {
                generation: self.generation,
                offset,
            }),
        }
    }

    /// Iterates hint records from the cursor (or from byte 0 if `rewind`) to
    /// end of file. Iteration stops after the first error.
    pub fn iter(&mut self, rewind: bool) -> Result<HintEntries<'_>, DataFileError> {
        if rewind {
            self.rewind()?;
        }
        Ok(HintEntries {
            reader: self,
            done: false,
        })
    }
}

/// Iterator returned by [`HintFileReader::iter`].
pub struct HintEntries<'a> {
    reader: &'a mut HintFileReader,
    done: bool,
}

impl Iterator for HintEntries<'_> {
    type Item = Result<Located<HintEntry>, DataFileError>;

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
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
