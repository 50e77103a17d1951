//! Per-scan memoisation of extracted features.
//!
//! An all-pairs scan over N images would otherwise decode and describe
//! every image N-1 times. The cache lives as long as the matcher, which
//! the pipeline creates fresh for every run.

use super::{similarity, ImageFeatures, OrbMatcher, SimilarityMeasure, SimilarityScore};
use crate::error::MatchError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

type Extracted = Result<Arc<ImageFeatures>, MatchError>;

/// An [`OrbMatcher`] that extracts each image's features at most once
pub struct CachedOrbMatcher {
    matcher: OrbMatcher,
    entries: RwLock<HashMap<PathBuf, Extracted>>,
}

impl CachedOrbMatcher {
    pub fn new(matcher: OrbMatcher) -> Self {
        Self {
            matcher,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Features for `path`, extracting them on first use.
    ///
    /// Load failures are cached too, so a broken file is only read once.
    pub fn features(&self, path: &Path) -> Extracted {
        if let Ok(entries) = self.entries.read() {
            if let Some(cached) = entries.get(path) {
                return cached.clone();
            }
        }

        // Two threads may race to extract the same image; both compute the
        // same value and the second insert is a no-op.
        let extracted = self.matcher.extract(path).map(Arc::new);

        if let Ok(mut entries) = self.entries.write() {
            entries
                .entry(path.to_path_buf())
                .or_insert_with(|| extracted.clone());
        }

        extracted
    }

    /// Number of images extracted so far
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CachedOrbMatcher {
    fn default() -> Self {
        Self::new(OrbMatcher::new())
    }
}

impl SimilarityMeasure for CachedOrbMatcher {
    fn score(&self, image_a: &Path, image_b: &Path) -> Result<SimilarityScore, MatchError> {
        let features_a = self.features(image_a)?;
        let features_b = self.features(image_b)?;
        Ok(similarity(&features_a, &features_b))
    }
}
