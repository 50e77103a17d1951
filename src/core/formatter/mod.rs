//! Flattens duplicate groups into scored original/duplicate pairs.

use crate::core::clusterer::DuplicateGroups;
use crate::core::loader::ImageRef;
use crate::core::matcher::{score_or_zero, SimilarityMeasure, SimilarityScore};
use crate::events::{null_sender, Event, EventSender, ReportEvent};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A duplicate and the original it was grouped under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicatePair {
    pub original: ImageRef,
    pub duplicate: ImageRef,
    /// Score of this exact pair, computed after grouping
    pub similarity: SimilarityScore,
}

impl fmt::Display for DuplicatePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} ({:.1}%)",
            self.original,
            self.duplicate,
            self.similarity * 100.0
        )
    }
}

/// One pair per duplicate, in group order then duplicate order.
///
/// Each pair is re-scored against its original rather than reusing the
/// comparison that linked it, which may have involved another member.
pub fn flatten(groups: &DuplicateGroups, measure: &dyn SimilarityMeasure) -> Vec<DuplicatePair> {
    flatten_with_events(groups, measure, &null_sender())
}

/// [`flatten`], reporting start and completion
pub fn flatten_with_events(
    groups: &DuplicateGroups,
    measure: &dyn SimilarityMeasure,
    events: &EventSender,
) -> Vec<DuplicatePair> {
    let total_pairs = groups.pair_count();
    events.send(Event::Report(ReportEvent::Started { total_pairs }));

    let pairs: Vec<DuplicatePair> = groups
        .iter()
        .flat_map(|group| {
            group.duplicates.iter().map(move |duplicate| DuplicatePair {
                original: group.original.clone(),
                duplicate: duplicate.clone(),
                similarity: score_or_zero(measure, &group.original, duplicate),
            })
        })
        .collect();

    events.send(Event::Report(ReportEvent::Completed {
        total_pairs: pairs.len(),
    }));

    pairs
}
