//! History store (CSV file).

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use super::{write_atomic, StoreError, StoreResult};
use crate::models::{DisplayRecord, TestRecord, HISTORY_COLUMNS};

/// Outcome of [`HistoryStore::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryLoad {
    /// File read; number of rows
    Loaded(usize),
    /// File read, but some rows could not be parsed and were left out
    Recovered { rows: usize, skipped: usize },
    /// No file yet; started with an empty table
    Missing,
    /// File unreadable or its header is not valid CSV; started with an empty table
    Malformed,
}

/// Ordered collection of test records backed by a CSV file.
///
/// Rows are only ever appended or removed, never edited in place. When a
/// load had to drop data, the original file is copied to `<file>.bak`
/// before it is first overwritten.
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    table: Option<Vec<TestRecord>>,
    backup_pending: bool,
}

/// Path the unreadable original is copied to before the first overwrite.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".bak");
    PathBuf::from(name)
}

impl HistoryStore {
    /// Create a store. Nothing is read until first use.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            table: None,
            backup_pending: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.table.is_some()
    }

    /// Number of rows, reading the file first if it has not been loaded.
    pub fn row_count(&mut self) -> usize {
        self.rows().len()
    }

    /// Read the file into memory, replacing whatever was loaded. Never fails.
    pub fn load(&mut self) -> HistoryLoad {
        self.backup_pending = false;
        match read_records(&self.path) {
            Ok((rows, 0)) => {
                let count = rows.len();
                self.table = Some(rows);
                info!(path = %self.path.display(), rows = count, "History loaded");
                HistoryLoad::Loaded(count)
            }
            Ok((rows, skipped)) => {
                let count = rows.len();
                self.table = Some(rows);
                self.backup_pending = true;
                warn!(
                    path = %self.path.display(),
                    rows = count,
                    skipped,
                    "History loaded with unreadable rows left out"
                );
                HistoryLoad::Recovered {
                    rows: count,
                    skipped,
                }
            }
            Err(StoreError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                self.table = Some(Vec::new());
                warn!(path = %self.path.display(), "History file not found, starting empty");
                HistoryLoad::Missing
            }
            Err(e) => {
                self.table = Some(Vec::new());
                self.backup_pending = true;
                error!(path = %self.path.display(), error = %e, "Could not read history, starting empty");
                HistoryLoad::Malformed
            }
        }
    }

    /// Write the in-memory table, replacing the file. A never-loaded store
    /// has nothing to write and is left alone.
    ///
    /// If the last load dropped rows, the file on disk is copied to
    /// [`backup_path`] first; when that copy fails nothing is written.
    pub fn save(&mut self) -> StoreResult<()> {
        let Some(rows) = self.table.as_ref() else {
            warn!(path = %self.path.display(), "No history in memory, nothing saved");
            return Ok(());
        };

        if self.backup_pending {
            let backup = backup_path(&self.path);
            if let Err(e) = std::fs::copy(&self.path, &backup) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    error!(
                        path = %self.path.display(),
                        backup = %backup.display(),
                        error = %e,
                        "Could not back up history, refusing to overwrite"
                    );
                    return Err(StoreError::io(&backup, e));
                }
            } else {
                warn!(backup = %backup.display(), "Original history kept as backup");
            }
        }

        let result = encode_records(rows).and_then(|bytes| write_atomic(&self.path, &bytes));
        match &result {
            Ok(()) => {
                self.backup_pending = false;
                info!(path = %self.path.display(), rows = rows.len(), "History saved");
            }
            Err(e) => error!(path = %self.path.display(), error = %e, "Failed to save history"),
        }
        result
    }

    /// Append rows at the end and persist. Returns how many rows were added.
    ///
    /// An empty batch is a no-op. If the write fails the rows stay in memory.
    pub fn append_register(&mut self, rows: Vec<TestRecord>) -> StoreResult<usize> {
        self.ensure_loaded();

        if rows.is_empty() {
            warn!("append_register called with no rows, nothing added");
            return Ok(0);
        }

        let added = rows.len();
        self.table.get_or_insert_with(Vec::new).extend(rows);
        self.save()?;
        info!(added, "History updated with new rows");
        Ok(added)
    }

    /// Copy of the history for display, labelled by row position.
    pub fn show(&mut self) -> Vec<DisplayRecord> {
        self.rows()
            .iter()
            .enumerate()
            .map(|(label, record)| DisplayRecord::from_record(label, record))
            .collect()
    }

    /// Remove rows flagged `true` in `mask` and persist. Returns how many
    /// rows were removed.
    ///
    /// The mask must have exactly one entry per current row; anything else
    /// is rejected as a no-op. Surviving rows keep their relative order and
    /// are renumbered from 0.
    pub fn delete_rows(&mut self, mask: Option<&[bool]>) -> StoreResult<usize> {
        self.ensure_loaded();
        let row_count = self.rows().len();

        let Some(mask) = mask.filter(|m| m.len() == row_count) else {
            warn!(
                mask_len = ?mask.map(<[bool]>::len),
                rows = row_count,
                "Invalid or missing delete mask, nothing deleted"
            );
            return Ok(0);
        };

        let removed = mask.iter().filter(|&&flag| flag).count();
        if let Some(table) = self.table.as_mut() {
            let mut flags = mask.iter();
            table.retain(|_| !flags.next().copied().unwrap_or(false));
        }
        self.save()?;
        info!(removed, "Deleted rows from history");
        Ok(removed)
    }

    /// All records in file order, loading first if needed.
    pub fn records(&mut self) -> &[TestRecord] {
        self.rows()
    }

    fn ensure_loaded(&mut self) {
        if self.table.is_none() {
            self.load();
        }
    }

    fn rows(&mut self) -> &[TestRecord] {
        self.ensure_loaded();
        self.table.as_deref().unwrap_or(&[])
    }
}

/// Read every parseable row. Short rows and missing optional columns are
/// accepted; rows that still fail are skipped and counted.
fn read_records(path: &Path) -> StoreResult<(Vec<TestRecord>, usize)> {
    let file = std::fs::File::open(path).map_err(|e| StoreError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);
    reader.headers()?;

    let mut rows = Vec::new();
    let mut skipped = 0;
    for (index, record) in reader.deserialize::<TestRecord>().enumerate() {
        match record {
            Ok(row) => rows.push(row),
            Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => return Err(e.into()),
            Err(e) => {
                skipped += 1;
                warn!(path = %path.display(), row = index, error = %e, "Skipping unreadable history row");
            }
        }
    }
    Ok((rows, skipped))
}

fn encode_records(rows: &[TestRecord]) -> StoreResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    // Header goes out explicitly so an empty table still has one.
    writer.write_record(HISTORY_COLUMNS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| StoreError::Csv(csv::Error::from(e.into_error())))
}
