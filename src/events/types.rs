//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the scan pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Folder listing events
    Load(LoadEvent),
    /// Pairwise comparison and clustering events
    Compare(CompareEvent),
    /// Pair reporting events
    Report(ReportEvent),
    /// Pipeline-level events
    Pipeline(PipelineEvent),
}

/// Events while listing the folder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LoadEvent {
    /// Listing has started
    Started { folder: PathBuf },
    /// Listing completed
    Completed { total_images: usize },
}

/// Events during the all-pairs comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CompareEvent {
    /// Comparison has started
    Started {
        total_images: usize,
        total_pairs: usize,
    },
    /// Progress update during comparison
    Progress(CompareProgress),
    /// A pair could not be scored and was treated as dissimilar
    PairFailed {
        image_a: PathBuf,
        image_b: PathBuf,
        message: String,
    },
    /// Comparison and grouping completed
    Completed {
        total_groups: usize,
        grouped_images: usize,
    },
}

/// Progress information during comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareProgress {
    /// Number of pairs scored so far
    pub comparisons_completed: usize,
    /// Total number of pairs to score
    pub total_comparisons: usize,
}

/// Events while flattening groups into pairs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReportEvent {
    /// Re-scoring of original/duplicate pairs has started
    Started { total_pairs: usize },
    /// All pairs were scored
    Completed { total_pairs: usize },
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Pipeline has started
    Started,
    /// Moving to a new phase
    PhaseChanged { phase: PipelinePhase },
    /// Pipeline completed successfully
    Completed { summary: PipelineSummary },
    /// Pipeline encountered a fatal error
    Error { message: String },
}

/// Phases of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Loading,
    Comparing,
    Reporting,
}

/// Summary of pipeline results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Eligible images found in the folder
    pub total_images: usize,
    /// Number of duplicate groups emitted
    pub duplicate_groups: usize,
    /// Number of reported (original, duplicate) pairs
    pub duplicate_pairs: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Loading => write!(f, "Loading"),
            PipelinePhase::Comparing => write!(f, "Comparing"),
            PipelinePhase::Reporting => write!(f, "Reporting"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_serializable() {
        let event = Event::Compare(CompareEvent::Progress(CompareProgress {
            comparisons_completed: 10,
            total_comparisons: 45,
        }));

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: Event = serde_json::from_str(&json).unwrap();

        match deserialized {
            Event::Compare(CompareEvent::Progress(p)) => {
                assert_eq!(p.total_comparisons, 45);
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn pipeline_summary_is_serializable() {
        let summary = PipelineSummary {
            total_images: 120,
            duplicate_groups: 7,
            duplicate_pairs: 19,
            duration_ms: 5000,
        };

        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"duplicate_pairs\":19"));
    }

    #[test]
    fn phase_display() {
        assert_eq!(PipelinePhase::Comparing.to_string(), "Comparing");
    }
}
