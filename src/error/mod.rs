//! # Error Module
//!
//! User-friendly error types for the near-duplicate finder.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Recover locally** where a single bad file should not sink a scan

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum DedupError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Matching error: {0}")]
    Match(#[from] MatchError),

    #[error("File error: {0}")]
    File(#[from] FileError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors that abort a folder scan
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Folder not found: {path}")]
    FolderNotFound { path: PathBuf },

    #[error("Folder is empty: {path}")]
    EmptyFolder { path: PathBuf },

    #[error("Failed to read folder {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while scoring a pair of images.
///
/// These never abort a scan; the clusterer scores the pair as 0.0.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    #[error("Failed to load image {path}: {reason}")]
    ImageLoad { path: PathBuf, reason: String },
}

/// Errors for single-file operations (delete, read)
#[derive(Error, Debug)]
pub enum FileError {
    #[error("File not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Failed to delete {path}: {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors in caller-supplied scan parameters
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid threshold: {value} (must be between 0.0 and 1.0)")]
    InvalidThreshold { value: f64 },

    #[error("Invalid max group size: {value} (must be at least 1)")]
    InvalidMaxGroupSize { value: usize },

    #[error("Folder path must be absolute: {path}")]
    RelativePath { path: PathBuf },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, DedupError>;
