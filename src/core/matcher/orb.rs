//! Oriented FAST keypoints with rotated binary descriptors (ORB).
//!
//! Per pyramid level:
//! 1. FAST-9 corners on the level image
//! 2. Harris response for ranking, 3x3 non-maximum suppression
//! 3. Orientation from the intensity centroid of a radius-15 disc
//! 4. 256 rotated intensity tests on a smoothed copy of the level

use super::descriptor::{sampling_pattern, Descriptor, SamplePair, DESCRIPTOR_BYTES, PATTERN_RADIUS};
use super::pyramid::{build_pyramid, PyramidLevel};
use image::{imageops, GrayImage};

/// Radius of the disc used for orientation
const HALF_PATCH: i32 = 15;

/// Keypoints closer than this to a level border are skipped, so every
/// rotated sample and the orientation disc stay inside the image
const EDGE_THRESHOLD: u32 = 19;

/// Harris block size and free parameter
const HARRIS_BLOCK: i32 = 7;
const HARRIS_K: f32 = 0.04;

/// Sigma of the Gaussian applied before sampling descriptors
const DESCRIPTOR_BLUR_SIGMA: f32 = 2.0;

/// Bresenham circle of radius 3, clockwise from 12 o'clock
const FAST_CIRCLE: [(i32, i32); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

/// Contiguous arc length required by FAST-9
const FAST_ARC: usize = 9;

/// Detector parameters
#[derive(Debug, Clone)]
pub struct OrbConfig {
    /// Upper bound on features kept per image
    pub max_features: usize,
    /// Number of pyramid levels
    pub levels: u8,
    /// Size ratio between consecutive levels
    pub scale_factor: f32,
    /// Intensity difference a circle pixel needs to count as brighter/darker
    pub fast_threshold: u8,
}

impl Default for OrbConfig {
    fn default() -> Self {
        Self {
            max_features: 500,
            levels: 8,
            scale_factor: 1.2,
            fast_threshold: 20,
        }
    }
}

/// A detected keypoint, in full-resolution coordinates
#[derive(Debug, Clone, Copy)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// Harris corner response
    pub response: f32,
    /// Orientation in radians
    pub angle: f32,
    pub octave: u8,
}

/// Keypoints and their descriptors, index-aligned
#[derive(Debug, Clone, Default)]
pub struct ImageFeatures {
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Vec<Descriptor>,
}

impl ImageFeatures {
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Stateless ORB feature detector
#[derive(Debug, Clone, Default)]
pub struct OrbDetector {
    config: OrbConfig,
}

impl OrbDetector {
    pub fn new(config: OrbConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OrbConfig {
        &self.config
    }

    /// Detect keypoints and compute descriptors.
    ///
    /// Flat or tiny images give an empty feature set, not an error.
    pub fn detect(&self, image: &GrayImage) -> ImageFeatures {
        let pyramid = build_pyramid(
            image,
            self.config.levels,
            self.config.scale_factor,
            2 * EDGE_THRESHOLD,
        );
        let budgets = self.level_budgets();

        let mut features = ImageFeatures::default();
        for level in &pyramid {
            let budget = budgets.get(level.octave as usize).copied().unwrap_or(0);
            if budget == 0 {
                continue;
            }
            self.detect_level(level, budget, &mut features);
        }

        features
    }

    /// Split the feature budget over levels, shrinking geometrically with
    /// the scale factor.
    fn level_budgets(&self) -> Vec<usize> {
        let levels = self.config.levels.max(1) as usize;
        let factor = 1.0 / self.config.scale_factor as f64;
        let total = self.config.max_features;

        let mut desired = if levels == 1 || (factor - 1.0).abs() < f64::EPSILON {
            total as f64 / levels as f64
        } else {
            total as f64 * (1.0 - factor) / (1.0 - factor.powi(levels as i32))
        };

        let mut budgets = Vec::with_capacity(levels);
        let mut assigned = 0usize;
        for _ in 0..levels - 1 {
            let n = (desired.round() as usize).min(total - assigned);
            budgets.push(n);
            assigned += n;
            desired *= factor;
        }
        budgets.push(total - assigned);
        budgets
    }

    fn detect_level(&self, level: &PyramidLevel, budget: usize, out: &mut ImageFeatures) {
        let image = &level.image;
        let mut corners = self.fast_corners(image);

        // Strongest first; the stable sort keeps raster order among equal responses
        corners.sort_by(|a, b| b.2.total_cmp(&a.2));
        corners.truncate(budget);

        let smoothed = imageops::blur(image, DESCRIPTOR_BLUR_SIGMA);
        let pattern = sampling_pattern();

        for (x, y, response) in corners {
            let angle = intensity_centroid_angle(image, x as i32, y as i32);
            let descriptor = describe(&smoothed, x as i32, y as i32, angle, pattern);

            out.keypoints.push(Keypoint {
                x: x as f32 * level.scale,
                y: y as f32 * level.scale,
                response,
                angle,
                octave: level.octave,
            });
            out.descriptors.push(descriptor);
        }
    }

    /// FAST-9 corners with Harris responses after non-maximum suppression,
    /// in raster order.
    fn fast_corners(&self, image: &GrayImage) -> Vec<(u32, u32, f32)> {
        let (width, height) = image.dimensions();
        if width <= 2 * EDGE_THRESHOLD || height <= 2 * EDGE_THRESHOLD {
            return Vec::new();
        }

        let mut responses = vec![f32::NEG_INFINITY; (width * height) as usize];
        let mut candidates = Vec::new();

        for y in EDGE_THRESHOLD..height - EDGE_THRESHOLD {
            for x in EDGE_THRESHOLD..width - EDGE_THRESHOLD {
                if is_fast_corner(image, x, y, self.config.fast_threshold) {
                    let response = harris_response(image, x as i32, y as i32);
                    responses[(y * width + x) as usize] = response;
                    candidates.push((x, y));
                }
            }
        }

        candidates
            .into_iter()
            .filter_map(|(x, y)| {
                let idx = (y * width + x) as usize;
                let r = responses[idx];
                for dy in -1i32..=1 {
                    for dx in -1i32..=1 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let nidx = ((y as i32 + dy) as u32 * width + (x as i32 + dx) as u32) as usize;
                        let n = responses[nidx];
                        // Ties go to the neighbour earlier in raster order
                        if n > r || (n == r && nidx < idx) {
                            return None;
                        }
                    }
                }
                Some((x, y, r))
            })
            .collect()
    }
}

#[inline]
fn pixel(image: &GrayImage, x: i32, y: i32) -> i32 {
    let x = x.clamp(0, image.width() as i32 - 1) as u32;
    let y = y.clamp(0, image.height() as i32 - 1) as u32;
    image.get_pixel(x, y)[0] as i32
}

fn is_fast_corner(image: &GrayImage, x: u32, y: u32, threshold: u8) -> bool {
    let (cx, cy) = (x as i32, y as i32);
    let center = pixel(image, cx, cy);
    let t = threshold as i32;

    // Any 9-arc covers at least two of the four compass points
    let compass = [0usize, 4, 8, 12].map(|i| {
        let (dx, dy) = FAST_CIRCLE[i];
        pixel(image, cx + dx, cy + dy)
    });
    let bright = compass.iter().filter(|&&p| p > center + t).count();
    let dark = compass.iter().filter(|&&p| p < center - t).count();
    if bright < 2 && dark < 2 {
        return false;
    }

    let ring = FAST_CIRCLE.map(|(dx, dy)| pixel(image, cx + dx, cy + dy));

    let mut bright_run = 0;
    let mut dark_run = 0;
    // Walk the ring twice so arcs wrapping past 12 o'clock are counted
    for i in 0..FAST_CIRCLE.len() * 2 {
        let p = ring[i % FAST_CIRCLE.len()];
        if p > center + t {
            bright_run += 1;
            dark_run = 0;
        } else if p < center - t {
            dark_run += 1;
            bright_run = 0;
        } else {
            bright_run = 0;
            dark_run = 0;
        }
        if bright_run >= FAST_ARC || dark_run >= FAST_ARC {
            return true;
        }
    }

    false
}

/// Harris corner measure over a 7x7 block of Sobel gradients
fn harris_response(image: &GrayImage, x: i32, y: i32) -> f32 {
    let r = HARRIS_BLOCK / 2;
    let (mut a, mut b, mut c) = (0f32, 0f32, 0f32);

    for py in y - r..=y + r {
        for px in x - r..=x + r {
            let ix = (pixel(image, px + 1, py - 1) + 2 * pixel(image, px + 1, py) + pixel(image, px + 1, py + 1))
                - (pixel(image, px - 1, py - 1) + 2 * pixel(image, px - 1, py) + pixel(image, px - 1, py + 1));
            let iy = (pixel(image, px - 1, py + 1) + 2 * pixel(image, px, py + 1) + pixel(image, px + 1, py + 1))
                - (pixel(image, px - 1, py - 1) + 2 * pixel(image, px, py - 1) + pixel(image, px + 1, py - 1));
            let (ix, iy) = (ix as f32, iy as f32);
            a += ix * ix;
            b += iy * iy;
            c += ix * iy;
        }
    }

    let scale = 1.0 / (4.0 * HARRIS_BLOCK as f32 * 255.0);
    let scale4 = scale * scale * scale * scale;
    (a * b - c * c - HARRIS_K * (a + b) * (a + b)) * scale4
}

fn intensity_centroid_angle(image: &GrayImage, x: i32, y: i32) -> f32 {
    let mut m01 = 0i64;
    let mut m10 = 0i64;

    for dy in -HALF_PATCH..=HALF_PATCH {
        for dx in -HALF_PATCH..=HALF_PATCH {
            if dx * dx + dy * dy > HALF_PATCH * HALF_PATCH {
                continue;
            }
            let intensity = pixel(image, x + dx, y + dy) as i64;
            m10 += intensity * dx as i64;
            m01 += intensity * dy as i64;
        }
    }

    (m01 as f32).atan2(m10 as f32)
}

fn describe(
    smoothed: &GrayImage,
    x: i32,
    y: i32,
    angle: f32,
    pattern: &[SamplePair],
) -> Descriptor {
    let (sin, cos) = angle.sin_cos();
    let rotate = |px: i32, py: i32| {
        let rx = (px as f32 * cos - py as f32 * sin).round() as i32;
        let ry = (px as f32 * sin + py as f32 * cos).round() as i32;
        debug_assert!(rx.abs() <= PATTERN_RADIUS * 2 && ry.abs() <= PATTERN_RADIUS * 2);
        (x + rx, y + ry)
    };

    let mut bytes = [0u8; DESCRIPTOR_BYTES];
    for (bit, pair) in pattern.iter().enumerate() {
        let (ax, ay) = rotate(pair.x1, pair.y1);
        let (bx, by) = rotate(pair.x2, pair.y2);
        if pixel(smoothed, ax, ay) < pixel(smoothed, bx, by) {
            bytes[bit / 8] |= 1 << (bit % 8);
        }
    }

    Descriptor::new(bytes)
}
