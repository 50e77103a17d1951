//! Reading whole files, memory-mapped when large.

use crate::error::FileError;
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// Minimum file size to use memory-mapped I/O (1MB)
const MMAP_THRESHOLD: u64 = 1024 * 1024;

/// Read file bytes, mapping files of 1MB or more instead of copying them.
pub fn read_file_bytes(path: &Path) -> Result<FileBytes, FileError> {
    let metadata = std::fs::metadata(path).map_err(|e| read_error(path, e))?;

    if metadata.len() >= MMAP_THRESHOLD {
        read_mmap(path)
    } else {
        read_standard(path)
    }
}

fn read_mmap(path: &Path) -> Result<FileBytes, FileError> {
    let file = File::open(path).map_err(|e| read_error(path, e))?;

    // SAFETY: the mapping is read-only and owns the file handle for its lifetime.
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| read_error(path, e))?;

    Ok(FileBytes::Mmap(mmap))
}

fn read_standard(path: &Path) -> Result<FileBytes, FileError> {
    let bytes = std::fs::read(path).map_err(|e| read_error(path, e))?;
    Ok(FileBytes::Vec(bytes))
}

fn read_error(path: &Path, source: std::io::Error) -> FileError {
    if source.kind() == std::io::ErrorKind::NotFound {
        FileError::NotFound {
            path: path.to_path_buf(),
        }
    } else {
        FileError::Read {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// File bytes that may be either owned or memory-mapped.
pub enum FileBytes {
    /// Standard heap-allocated bytes
    Vec(Vec<u8>),
    /// Memory-mapped bytes
    Mmap(Mmap),
}

impl AsRef<[u8]> for FileBytes {
    fn as_ref(&self) -> &[u8] {
        match self {
            FileBytes::Vec(v) => v,
            FileBytes::Mmap(m) => m,
        }
    }
}

impl std::ops::Deref for FileBytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_ref()
    }
}
