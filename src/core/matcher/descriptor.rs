//! Binary descriptors and the fixed sampling pattern they are built from.

use std::sync::OnceLock;
use xxhash_rust::xxh3::xxh3_64_with_seed;

/// Bits per descriptor
pub const DESCRIPTOR_BITS: usize = 256;

/// Bytes per descriptor
pub const DESCRIPTOR_BYTES: usize = DESCRIPTOR_BITS / 8;

/// Sampling points lie in `[-PATTERN_RADIUS, PATTERN_RADIUS]` on both axes
pub const PATTERN_RADIUS: i32 = 13;

/// A 256-bit binary descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Descriptor([u8; DESCRIPTOR_BYTES]);

impl Descriptor {
    pub fn new(bytes: [u8; DESCRIPTOR_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; DESCRIPTOR_BYTES] {
        &self.0
    }

    /// Hamming distance: number of differing bits
    pub fn distance(&self, other: &Self) -> u32 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }
}

/// One intensity comparison: bit is set when `I(p1) < I(p2)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplePair {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

/// The sampling pattern shared by every descriptor.
///
/// Points are drawn uniformly from the patch by hashing the test index,
/// so the pattern is identical on every run and every machine.
pub fn sampling_pattern() -> &'static [SamplePair] {
    static PATTERN: OnceLock<Vec<SamplePair>> = OnceLock::new();
    PATTERN.get_or_init(build_pattern)
}

fn build_pattern() -> Vec<SamplePair> {
    let span = (2 * PATTERN_RADIUS + 1) as u64;
    let coord = |bits: u64| ((bits & 0xFFFF) % span) as i32 - PATTERN_RADIUS;

    (0..DESCRIPTOR_BITS as u32)
        .map(|index| {
            let mut seed = 0u64;
            loop {
                let h = xxh3_64_with_seed(&index.to_le_bytes(), seed);
                let pair = SamplePair {
                    x1: coord(h),
                    y1: coord(h >> 16),
                    x2: coord(h >> 32),
                    y2: coord(h >> 48),
                };
                if (pair.x1, pair.y1) != (pair.x2, pair.y2) {
                    break pair;
                }
                seed += 1;
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_self_is_zero() {
        let d = Descriptor::new([0xA5; DESCRIPTOR_BYTES]);
        assert_eq!(d.distance(&d), 0);
    }

    #[test]
    fn distance_counts_differing_bits() {
        let zeros = Descriptor::new([0x00; DESCRIPTOR_BYTES]);
        let ones = Descriptor::new([0xFF; DESCRIPTOR_BYTES]);
        let mut one_bit = [0u8; DESCRIPTOR_BYTES];
        one_bit[31] = 0b1000_0000;

        assert_eq!(zeros.distance(&ones), 256);
        assert_eq!(zeros.distance(&Descriptor::new(one_bit)), 1);
        assert_eq!(ones.distance(&zeros), zeros.distance(&ones));
    }

    #[test]
    fn pattern_has_one_pair_per_bit() {
        assert_eq!(sampling_pattern().len(), DESCRIPTOR_BITS);
    }

    #[test]
    fn pattern_stays_inside_patch_and_never_compares_a_point_with_itself() {
        for pair in sampling_pattern() {
            for c in [pair.x1, pair.y1, pair.x2, pair.y2] {
                assert!((-PATTERN_RADIUS..=PATTERN_RADIUS).contains(&c));
            }
            assert_ne!((pair.x1, pair.y1), (pair.x2, pair.y2));
        }
    }

    #[test]
    fn pattern_is_stable() {
        assert_eq!(build_pattern(), sampling_pattern().to_vec());
    }
}
