//! Brute-force descriptor matching with cross-check.

use super::descriptor::Descriptor;

/// An accepted one-to-one descriptor match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorMatch {
    /// Index into the first descriptor set
    pub query: usize,
    /// Index into the second descriptor set
    pub train: usize,
    /// Hamming distance between the two descriptors
    pub distance: u32,
}

/// Match every descriptor in `a` with its nearest neighbour in `b`,
/// keeping only mutual nearest neighbours.
///
/// Ties resolve to the lowest index on either side. Matches come out in
/// `query` order.
pub fn cross_check_matches(a: &[Descriptor], b: &[Descriptor]) -> Vec<DescriptorMatch> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }

    let distances: Vec<u32> = a
        .iter()
        .flat_map(|da| b.iter().map(move |db| da.distance(db)))
        .collect();
    let at = |i: usize, j: usize| distances[i * b.len() + j];

    // Best train index for each query
    let forward: Vec<usize> = (0..a.len())
        .map(|i| argmin((0..b.len()).map(|j| at(i, j))))
        .collect();

    // Best query index for each train
    let backward: Vec<usize> = (0..b.len())
        .map(|j| argmin((0..a.len()).map(|i| at(i, j))))
        .collect();

    forward
        .iter()
        .enumerate()
        .filter(|&(i, &j)| backward[j] == i)
        .map(|(i, &j)| DescriptorMatch {
            query: i,
            train: j,
            distance: at(i, j),
        })
        .collect()
}

/// Index of the first minimum
fn argmin(values: impl Iterator<Item = u32>) -> usize {
    let mut best = (0, u32::MAX);
    for (idx, value) in values.enumerate() {
        if value < best.1 {
            best = (idx, value);
        }
    }
    best.0
}
