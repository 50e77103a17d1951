//! # Core Module
//!
//! The duplicate detection engine, free of any transport or UI.
//!
//! ## Modules
//! - `loader` - Lists eligible images in a folder
//! - `matcher` - Scores image pairs with ORB features
//! - `clusterer` - Unions similar pairs into capped duplicate groups
//! - `formatter` - Flattens groups into scored pairs
//! - `files` - Raw file reads and batch deletion
//! - `pipeline` - Orchestrates the full workflow

pub mod clusterer;
pub mod files;
pub mod formatter;
pub mod loader;
pub mod matcher;
pub mod pipeline;

// Re-export commonly used types
pub use clusterer::{DuplicateGroup, DuplicateGroups};
pub use formatter::DuplicatePair;
pub use loader::ImageRef;
pub use matcher::{SimilarityMeasure, SimilarityScore};
pub use pipeline::{Pipeline, PipelineBuilder, ScanReport};
