//! File name filtering for the folder loader.

use std::path::Path;

/// Suffixes accepted by default, matched exactly as written
const DEFAULT_SUFFIXES: [&str; 3] = [".jpg", ".png", ".jpeg"];

/// Decides which directory entries are images by their file name suffix
#[derive(Debug, Clone)]
pub struct ImageFilter {
    suffixes: &'static [&'static str],
}

impl ImageFilter {
    /// Create a filter accepting `.jpg`, `.png` and `.jpeg`
    pub fn new() -> Self {
        Self {
            suffixes: &DEFAULT_SUFFIXES,
        }
    }

    /// Check whether a path names an eligible image.
    ///
    /// No case folding: `photo.JPG` is rejected.
    pub fn should_include(&self, path: &Path) -> bool {
        let Some(name) = path.file_name() else {
            return false;
        };
        let name = name.as_encoded_bytes();

        self.suffixes
            .iter()
            .any(|suffix| name.ends_with(suffix.as_bytes()))
    }
}

impl Default for ImageFilter {
    fn default() -> Self {
        Self::new()
    }
}
