//! # Files Module
//!
//! Raw file access for callers reviewing scan results: reading an image
//! back for display and deleting the duplicates a user picked.
//!
//! Deletion is best effort. Every path is attempted; failures are
//! collected instead of aborting the batch.

mod bytes;

pub use bytes::{read_file_bytes, FileBytes};

use crate::error::FileError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Outcome of a batch deletion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteReport {
    /// Number of files removed
    pub deleted_count: usize,
    /// Paths that were missing or could not be removed, in input order
    pub failed_paths: Vec<PathBuf>,
}

impl DeleteReport {
    pub fn failed_count(&self) -> usize {
        self.failed_paths.len()
    }
}

/// Delete every path that names an existing regular file.
pub fn delete_files<I, P>(paths: I) -> DeleteReport
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut report = DeleteReport::default();

    for path in paths {
        let path = path.as_ref();
        match delete_file(path) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "deleted file");
                report.deleted_count += 1;
            }
            Err(e) => {
                tracing::warn!("{}", e);
                report.failed_paths.push(path.to_path_buf());
            }
        }
    }

    report
}

fn delete_file(path: &Path) -> Result<(), FileError> {
    if !path.is_file() {
        return Err(FileError::NotFound {
            path: path.to_path_buf(),
        });
    }

    std::fs::remove_file(path).map_err(|source| FileError::Delete {
        path: path.to_path_buf(),
        source,
    })
}

/// Read the raw bytes of an existing file.
pub fn read_file(path: &Path) -> Result<FileBytes, FileError> {
    if !path.is_file() {
        return Err(FileError::NotFound {
            path: path.to_path_buf(),
        });
    }

    read_file_bytes(path)
}
