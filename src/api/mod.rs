//! # API Module
//!
//! The calls an outer layer (CLI, HTTP server) makes into the engine.
//!
//! Paths arrive already resolved: a scan request must name an absolute
//! folder, and nothing here guesses at alternative locations.

use crate::core::clusterer::DEFAULT_MAX_GROUP_SIZE;
use crate::core::files::{self, FileBytes};
use crate::core::formatter::DuplicatePair;
use crate::core::pipeline::Pipeline;
use crate::error::{ConfigError, Result};
use std::path::{Path, PathBuf};

pub use crate::core::files::DeleteReport;

/// A validated scan of one folder
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRequest {
    folder: PathBuf,
    threshold: f64,
    max_group_size: usize,
    parallel: bool,
}

impl ScanRequest {
    /// Validate a folder and threshold.
    ///
    /// The folder must be absolute and the threshold finite and within
    /// `[0.0, 1.0]`. Existence is checked when the scan runs.
    pub fn new(folder: impl Into<PathBuf>, threshold: f64) -> std::result::Result<Self, ConfigError> {
        let folder = folder.into();
        if !folder.is_absolute() {
            return Err(ConfigError::RelativePath { path: folder });
        }
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::InvalidThreshold { value: threshold });
        }

        Ok(Self {
            folder,
            threshold,
            max_group_size: DEFAULT_MAX_GROUP_SIZE,
            parallel: false,
        })
    }

    /// Change the group size cap; must be at least 1
    pub fn with_max_group_size(mut self, max_group_size: usize) -> std::result::Result<Self, ConfigError> {
        if max_group_size == 0 {
            return Err(ConfigError::InvalidMaxGroupSize {
                value: max_group_size,
            });
        }
        self.max_group_size = max_group_size;
        Ok(self)
    }

    /// Score pairs in parallel
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn max_group_size(&self) -> usize {
        self.max_group_size
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }

    /// Pipeline configured from this request
    pub fn into_pipeline(self) -> Pipeline {
        Pipeline::builder()
            .folder(self.folder)
            .threshold(self.threshold)
            .max_group_size(self.max_group_size)
            .parallel(self.parallel)
            .build()
    }
}

/// Scan `folder` and report every near-duplicate pair.
///
/// Groups are capped at five images. Fails if the folder is missing,
/// literally empty, or the arguments are invalid.
pub fn scan(folder: &Path, threshold: f64) -> Result<Vec<DuplicatePair>> {
    let report = ScanRequest::new(folder, threshold)?.into_pipeline().run()?;
    Ok(report.pairs)
}

/// Delete the given files, continuing past failures
pub fn delete_files<P: AsRef<Path>>(paths: &[P]) -> DeleteReport {
    files::delete_files(paths)
}

/// Raw bytes of a file, for display
pub fn read_file(path: &Path) -> Result<FileBytes> {
    Ok(files::read_file(path)?)
}
