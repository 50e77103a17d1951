//! # Near-Duplicate Finder
//!
//! Finds near-duplicate images in a folder and lets the caller review or
//! delete them.
//!
//! ## Architecture
//! - `core` - The duplicate detection engine (loader, matcher, clusterer, formatter)
//! - `api` - The boundary an outer layer (CLI, HTTP) calls into
//! - `events` - Event-driven progress reporting
//! - `error` - User-friendly error types

pub mod api;
pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use api::{delete_files, read_file, scan, DeleteReport, ScanRequest};
pub use error::{DedupError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point (CLI or server).
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}
