//! Turning connected components into reported groups.

use super::DuplicateGroup;
use crate::core::loader::ImageRef;

/// Split one connected component into groups of at most `max_group_size`.
///
/// Members are sorted first. A component that fits becomes a single group
/// led by its smallest member. A larger one is cut into consecutive chunks
/// of `max_group_size`, each led by its own first member; a chunk left with
/// a single member is dropped. One component can therefore report several
/// originals.
pub fn split_component(mut members: Vec<ImageRef>, max_group_size: usize) -> Vec<DuplicateGroup> {
    if members.len() < 2 {
        return Vec::new();
    }

    members.sort();
    let chunk_size = max_group_size.max(1);

    members
        .chunks(chunk_size)
        .filter(|chunk| chunk.len() > 1)
        .map(|chunk| DuplicateGroup::new(chunk[0].clone(), chunk[1..].to_vec()))
        .collect()
}
