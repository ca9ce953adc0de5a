/// Keydir construction from the files on disk.
///
/// Generations are processed oldest to newest. Each one is loaded from its
/// hint file when there is one (and hints are enabled), otherwise by scanning
/// the whole data file. Every candidate entry goes through
/// [`Keydir::merge`](keydir::Keydir::merge), so the newest timestamp wins and
/// ties go to the later write.
///
/// A generation's candidates are collected before any of them are merged.
/// That keeps a broken hint file from leaving half its entries behind when
/// the loader falls back to the data file.
use datafile::{
    data_path, generation_id, DataFileError, DataFileReader, HintEntry, HintFileReader, ScanMode,
    DATA_EXTENSION, DATA_HEADER_BYTES, TOMBSTONE,
};
use keydir::KeydirEntry;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::{Bitcask, BitcaskError, Result};

/// Why a data record was left out of the keydir.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Checksum,
    Truncated,
    /// The record is longer than a keydir entry can describe (`u32::MAX`).
    Oversized,
}

/// A data record skipped during a permissive load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub generation: u64,
    pub offset: u64,
    pub reason: SkipReason,
}

/// What a call to [`Bitcask::load`] (or one of the single-generation loaders)
/// did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Generations processed.
    pub generations: usize,
    /// Generations loaded from a hint file.
    pub from_hints: usize,
    /// Generations loaded by scanning the data file.
    pub from_data: usize,
    /// Records (hint or data) offered to the keydir.
    pub records: usize,
    /// Corrupt or unindexable data records that were skipped.
    pub skipped: Vec<SkippedRecord>,
}

enum HintOutcome {
    Loaded,
    Missing,
    Abandoned,
}

impl Bitcask {
    /// Lists the data files in the bitcask directory, oldest to newest.
    ///
    /// Only `*.data` files are considered. Files sharing a generation id are
    /// ordered by path; no other meaning is given to that order.
    ///
    /// # Errors
    ///
    /// Returns [`BitcaskError::MalformedGenerationName`] for a `.data` file
    /// whose base name is not an integer. Loading cannot safely continue
    /// without a total order, so such files are never skipped.
    pub fn list_generations(&self) -> Result<Vec<PathBuf>> {
        let mut generations = Vec::new();
        for dirent in fs::read_dir(&self.config.dir)? {
            let path = dirent?.path();
            let is_data = path
                .extension()
                .map(|ext| ext == DATA_EXTENSION)
                .unwrap_or(false);
            if !is_data || !path.is_file() {
                continue;
            }
            generations.push((generation_id(&path)?, path));
        }

        generations.sort();
        Ok(generations.into_iter().map(|(_, path)| path).collect())
    }

    /// Opens a fresh reader for every generation, oldest to newest.
    ///
    /// The readers are independent of the keydir; dropping them closes their
    /// handles.
    pub fn open_generations(&self) -> Result<Vec<DataFileReader>> {
        self.list_generations()?
            .iter()
            .map(|path| DataFileReader::open(path).map_err(BitcaskError::from))
            .collect()
    }

    /// Loads every generation into the keydir.
    ///
    /// Existing keydir contents are kept and merged with, and data files that
    /// are already registered are reused rather than reopened, so calling
    /// `load` twice is harmless.
    ///
    /// # Errors
    ///
    /// I/O errors and malformed generation names always abort the load. A
    /// corrupt data record aborts it only in strict mode; otherwise it is
    /// logged, listed in [`LoadReport::skipped`], and the scan continues.
    pub fn load(&mut self) -> Result<LoadReport> {
        let mut report = LoadReport::default();

        for path in self.list_generations()? {
            let index = self.register(&path)?;
            self.load_generation(index, &mut report)?;
        }

        info!(
            dir = %self.config.dir.display(),
            generations = report.generations,
            from_hints = report.from_hints,
            from_data = report.from_data,
            keys = self.keydir.len(),
            skipped = report.skipped.len(),
            "bitcask loaded"
        );
        Ok(report)
    }

    /// Loads a single generation by scanning its data file, ignoring any hint
    /// file.
    pub fn load_data_file<P: AsRef<Path>>(&mut self, path: P) -> Result<LoadReport> {
        let mut report = LoadReport::default();
        let index = self.register(path.as_ref())?;
        self.load_from_data(index, &mut report)?;
        report.generations += 1;
        Ok(report)
    }

    /// Loads a single generation from the hint file at `path`.
    ///
    /// `path` itself is read, even if it is not the sibling the data file
    /// picked up when it was opened. The data file is the `.data` file with
    /// the same stem in the same directory and must exist. If the hint file
    /// turns out to be damaged the generation is loaded from the data file
    /// instead, exactly as [`load`](Bitcask::load) would.
    ///
    /// # Errors
    ///
    /// An I/O error with [`std::io::ErrorKind::NotFound`] if `path` does not exist.
    pub fn load_hint_file<P: AsRef<Path>>(&mut self, path: P) -> Result<LoadReport> {
        let path = path.as_ref();
        let mut report = LoadReport::default();
        let index = self.register(&data_path(path))?;

        let mut hint = HintFileReader::open(path, self.keydir.files()[index].path())?;
        match collect_hints(&mut hint)? {
            Some(candidates) => self.merge_hints(index, candidates, &mut report)?,
            None => self.load_from_data(index, &mut report)?,
        }
        report.generations += 1;
        Ok(report)
    }

    /// Returns the generation index of `path`, opening and registering it on
    /// first use.
    fn register(&mut self, path: &Path) -> Result<usize> {
        if let Some(index) = self.keydir.position_of(path) {
            return Ok(index);
        }
        let reader = DataFileReader::open(path)?;
        Ok(self.keydir.register_file(reader))
    }

    fn load_generation(&mut self, index: usize, report: &mut LoadReport) -> Result<()> {
        let outcome = if self.config.use_hints {
            self.load_from_hint(index, report)?
        } else {
            HintOutcome::Missing
        };

        match outcome {
            HintOutcome::Loaded => {}
            HintOutcome::Missing | HintOutcome::Abandoned => self.load_from_data(index, report)?,
        }
        report.generations += 1;
        Ok(())
    }

    /// Loads generation `index` from the hint file its data file owns.
    fn load_from_hint(&mut self, index: usize, report: &mut LoadReport) -> Result<HintOutcome> {
        let Some(hint) = self.keydir.files_mut()[index].hint_file() else {
            return Ok(HintOutcome::Missing);
        };
        match collect_hints(hint)? {
            Some(candidates) => {
                self.merge_hints(index, candidates, report)?;
                Ok(HintOutcome::Loaded)
            }
            None => Ok(HintOutcome::Abandoned),
        }
    }

    /// Merges hint entries for generation `index` into the keydir.
    ///
    /// Hint records carry no value, so an entry whose record length matches
    /// a tombstone for its key is checked against the data file.
    fn merge_hints(
        &mut self,
        index: usize,
        candidates: Vec<HintEntry>,
        report: &mut LoadReport,
    ) -> Result<()> {
        let file = &mut self.keydir.files_mut()[index];
        let generation = file.generation();

        let mut entries = Vec::with_capacity(candidates.len());
        for hint in candidates {
            let tombstone = if may_be_tombstone(&hint) {
                match file.read_at(hint.value_offset, Some(hint.value_size)) {
                    Ok(record) => record.is_tombstone(),
                    Err(e) if e.is_corruption() => {
                        warn!(generation, offset = hint.value_offset, error = %e, "hinted record unreadable");
                        false
                    }
                    Err(e) => return Err(e.into()),
                }
            } else {
                false
            };
            let entry = KeydirEntry {
                generation_index: index,
                value_size: hint.value_size,
                value_offset: hint.value_offset,
                timestamp: hint.timestamp,
                tombstone,
            };
            entries.push((hint.key, entry));
        }

        let count = entries.len();
        for (key, entry) in entries {
            self.keydir.merge(key, entry);
        }

        report.from_hints += 1;
        report.records += count;
        debug!(generation, source = "hint", entries = count, "loaded generation");
        Ok(())
    }

    fn load_from_data(&mut self, index: usize, report: &mut LoadReport) -> Result<()> {
        let mode = ScanMode::from_strict(self.config.strict);
        let file = &mut self.keydir.files_mut()[index];
        let generation = file.generation();

        let mut candidates = Vec::new();
        for item in file.iter(true, mode)? {
            let located = match item {
                Ok(located) => located,
                Err(e) if e.is_corruption() && mode == ScanMode::Permissive => {
                    let (offset, reason) = match e {
                        DataFileError::Checksum { offset, .. } => (offset, SkipReason::Checksum),
                        DataFileError::Truncated { offset, .. } => (offset, SkipReason::Truncated),
                        _ => continue,
                    };
                    warn!(generation, offset, reason = ?reason, "skipping corrupt record");
                    report.skipped.push(SkippedRecord {
                        generation,
                        offset,
                        reason,
                    });
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let Ok(value_size) = u32::try_from(located.len) else {
                warn!(generation, offset = located.offset, len = located.len, "record too large to index");
                report.skipped.push(SkippedRecord {
                    generation,
                    offset: located.offset,
                    reason: SkipReason::Oversized,
                });
                continue;
            };

            let entry = KeydirEntry {
                generation_index: index,
                value_size,
                value_offset: located.offset,
                timestamp: located.entry.timestamp,
                tombstone: located.entry.is_tombstone(),
            };
            candidates.push((located.entry.key, entry));
        }

        let count = candidates.len();
        for (key, entry) in candidates {
            self.keydir.merge(key, entry);
        }

        report.from_data += 1;
        report.records += count;
        debug!(generation, source = "data", entries = count, "loaded generation");
        Ok(())
    }
}

/// Reads every entry of `hint`, or `None` if the file is damaged and the data
/// file should be scanned instead.
fn collect_hints(hint: &mut HintFileReader) -> Result<Option<Vec<HintEntry>>> {
    let generation = hint.generation();
    let mut candidates = Vec::new();
    for item in hint.iter(true)? {
        match item {
            Ok(located) => candidates.push(located.entry),
            Err(DataFileError::Io(e)) => return Err(e.into()),
            Err(e) => {
                warn!(generation, error = %e, "hint file unreadable, scanning data file instead");
                return Ok(None);
            }
        }
    }
    Ok(Some(candidates))
}

fn may_be_tombstone(hint: &HintEntry) -> bool {
    hint.value_size as usize == DATA_HEADER_BYTES + hint.key.len() + TOMBSTONE.len()
}
