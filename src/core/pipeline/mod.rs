//! # Pipeline Module
//!
//! Orchestrates a full scan of one folder.
//!
//! ## Pipeline Stages
//! 1. **Load** - List the eligible images, sorted by path
//! 2. **Compare** - Score every pair and cluster linked images
//! 3. **Report** - Re-score each original/duplicate pair
//!
//! ## Parallelism
//! Pair scoring can run on rayon; unions are always applied in pair order.

mod executor;

pub use executor::{Pipeline, PipelineBuilder, PipelineConfig, ScanReport};
