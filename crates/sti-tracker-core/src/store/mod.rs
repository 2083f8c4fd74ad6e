//! Flat-file persistence for preferences (JSON) and test history (CSV).
//!
//! Every write replaces the whole file through a temporary sibling that is
//! renamed into place, so readers see either the old or the new content.

mod history;
mod preferences;

pub use history::*;
pub use preferences::*;

use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Storage errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Could not replace {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Create the parent directory of a store file.
pub(crate) fn ensure_parent_dir(path: &Path) -> StoreResult<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            std::fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))
        }
        _ => Ok(()),
    }
}

/// Replace `path` with `contents` in one rename.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> StoreResult<()> {
    ensure_parent_dir(path)?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
    let tmp_path = tmp.path().to_path_buf();
    tmp.write_all(contents)
        .map_err(|e| StoreError::io(&tmp_path, e))?;
    tmp.flush().map_err(|e| StoreError::io(&tmp_path, e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| StoreError::io(&tmp_path, e))?;
    tmp.persist(path).map_err(|e| StoreError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}
