//! # Loader Module
//!
//! Lists the eligible images of a single folder.
//!
//! ## Eligibility
//! - File names ending in `.jpg`, `.png` or `.jpeg` (case-sensitive)
//! - Regular files only, directly inside the folder (no recursion)
//!
//! The returned order is the byte-wise order of the full path. Pair
//! iteration, original selection and group splitting all depend on it.
//!
//! ## Example
//! ```rust,ignore
//! use near_dup_finder::core::loader::FolderLoader;
//!
//! let images = FolderLoader::new().list_images(Path::new("/photos/trip"))?;
//! ```

mod filter;

pub use filter::ImageFilter;

use crate::error::ScanError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Stable identifier of an image: its path.
///
/// Equality, hashing and ordering all work on the raw path bytes, so two
/// refs compare the way their path strings do.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(PathBuf);

impl ImageRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }

    fn key(&self) -> &[u8] {
        self.0.as_os_str().as_encoded_bytes()
    }
}

impl PartialEq for ImageRef {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for ImageRef {}

impl Hash for ImageRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for ImageRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ImageRef {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(other.key())
    }
}

impl AsRef<Path> for ImageRef {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl From<PathBuf> for ImageRef {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

impl From<&str> for ImageRef {
    fn from(path: &str) -> Self {
        Self(PathBuf::from(path))
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Lists eligible images in one folder
#[derive(Default)]
pub struct FolderLoader {
    filter: ImageFilter,
}

impl FolderLoader {
    pub fn new() -> Self {
        Self {
            filter: ImageFilter::new(),
        }
    }

    /// List the images of `folder`, sorted by full path.
    ///
    /// The emptiness check looks at every directory entry before any
    /// filtering: a folder holding only non-images is not empty, it just
    /// yields no images.
    pub fn list_images(&self, folder: &Path) -> Result<Vec<ImageRef>, ScanError> {
        if !folder.is_dir() {
            return Err(ScanError::FolderNotFound {
                path: folder.to_path_buf(),
            });
        }

        let mut saw_entry = false;
        let mut images = Vec::new();

        let walker = WalkDir::new(folder).min_depth(1).max_depth(1);

        for entry_result in walker {
            let entry = entry_result.map_err(|e| ScanError::ReadDirectory {
                path: folder.to_path_buf(),
                source: e.into(),
            })?;
            saw_entry = true;

            let path = entry.path();
            if !self.filter.should_include(path) {
                continue;
            }

            // Symlinks count when they point at a file
            let is_file = entry.file_type().is_file()
                || (entry.path_is_symlink() && path.is_file());
            if !is_file {
                continue;
            }

            images.push(ImageRef::new(path));
        }

        if !saw_entry {
            return Err(ScanError::EmptyFolder {
                path: folder.to_path_buf(),
            });
        }

        images.sort();

        tracing::debug!(
            folder = %folder.display(),
            images = images.len(),
            "listed folder"
        );

        Ok(images)
    }
}

/// List the images of `folder` with the default filter
pub fn list_images(folder: &Path) -> Result<Vec<ImageRef>, ScanError> {
    FolderLoader::new().list_images(folder)
}
