//! # Matcher Module
//!
//! Scores how similar two images are from their local features.
//!
//! ## How It Works
//! 1. Load both images as grayscale
//! 2. Detect up to 500 ORB keypoints per image and describe each with a
//!    256-bit binary descriptor
//! 3. Match descriptors by Hamming distance, keeping mutual nearest
//!    neighbours only
//! 4. Score = share of accepted matches closer than [`CLOSE_MATCH_DISTANCE`]
//!
//! ## Score Guide
//! | Score    | Meaning                                  |
//! |----------|------------------------------------------|
//! | 1.0      | Every accepted match is close (identical) |
//! | 0.5-0.99 | Likely the same scene or an edited copy  |
//! | < 0.5    | Mostly unrelated structure               |
//! | 0.0      | No descriptors or no accepted matches    |

mod cache;
pub mod decode;
pub mod descriptor;
pub mod matching;
pub mod orb;
pub mod pyramid;

pub use cache::CachedOrbMatcher;
pub use descriptor::Descriptor;
pub use matching::{cross_check_matches, DescriptorMatch};
pub use orb::{ImageFeatures, Keypoint, OrbConfig, OrbDetector};

use crate::core::loader::ImageRef;
use crate::error::MatchError;
use std::path::Path;

/// Similarity in `[0.0, 1.0]`; higher is more similar
pub type SimilarityScore = f64;

/// Matches with a Hamming distance below this count as close
pub const CLOSE_MATCH_DISTANCE: u32 = 50;

/// Anything that can score a pair of images.
///
/// Implementations must be pure with respect to the pair so scans stay
/// deterministic and pairs can be scored from several threads.
pub trait SimilarityMeasure: Send + Sync {
    /// Score two images; fails only when an image cannot be loaded
    fn score(&self, image_a: &Path, image_b: &Path) -> Result<SimilarityScore, MatchError>;
}

/// Feature matcher: ORB detection plus cross-checked Hamming matching
#[derive(Debug, Clone, Default)]
pub struct OrbMatcher {
    detector: OrbDetector,
}

impl OrbMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: OrbConfig) -> Self {
        Self {
            detector: OrbDetector::new(config),
        }
    }

    /// Load an image and extract its features
    pub fn extract(&self, path: &Path) -> Result<ImageFeatures, MatchError> {
        let image = decode::load_grayscale(path)?;
        Ok(self.detector.detect(&image))
    }
}

impl SimilarityMeasure for OrbMatcher {
    fn score(&self, image_a: &Path, image_b: &Path) -> Result<SimilarityScore, MatchError> {
        let features_a = self.extract(image_a)?;
        let features_b = self.extract(image_b)?;
        Ok(similarity(&features_a, &features_b))
    }
}

/// Score two already-extracted feature sets
pub fn similarity(a: &ImageFeatures, b: &ImageFeatures) -> SimilarityScore {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let matches = cross_check_matches(&a.descriptors, &b.descriptors);
    similarity_from_matches(&matches)
}

/// Close matches divided by accepted matches; 0.0 when nothing matched
pub fn similarity_from_matches(matches: &[DescriptorMatch]) -> SimilarityScore {
    if matches.is_empty() {
        return 0.0;
    }

    let close = matches
        .iter()
        .filter(|m| m.distance < CLOSE_MATCH_DISTANCE)
        .count();
    close as f64 / matches.len() as f64
}

/// Score a pair, treating an unloadable image as "not similar".
pub fn score_or_zero(
    measure: &dyn SimilarityMeasure,
    image_a: &ImageRef,
    image_b: &ImageRef,
) -> SimilarityScore {
    match measure.score(image_a.as_path(), image_b.as_path()) {
        Ok(score) => score,
        Err(e) => {
            tracing::warn!("{}; scoring {} vs {} as 0", e, image_a, image_b);
            0.0
        }
    }
}
