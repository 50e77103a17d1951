//! Pipeline execution implementation.

use crate::core::clusterer::{
    ClusterConfig, DuplicateGroups, SimilarityClusterer, DEFAULT_MAX_GROUP_SIZE, DEFAULT_THRESHOLD,
};
use crate::core::formatter::{flatten_with_events, DuplicatePair};
use crate::core::loader::FolderLoader;
use crate::core::matcher::{CachedOrbMatcher, SimilarityMeasure};
use crate::error::DedupError;
use crate::events::{
    null_sender, Event, EventSender, LoadEvent, PipelineEvent, PipelinePhase, PipelineSummary,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Result of one scan
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    /// Every reported (original, duplicate) pair with its own score
    pub pairs: Vec<DuplicatePair>,
    /// The groups the pairs were flattened from
    pub groups: DuplicateGroups,
    /// Eligible images found in the folder
    pub total_images: usize,
    /// Pairs scored while clustering
    pub comparisons: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

/// Configuration for the pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Folder to scan; not recursed into
    pub folder: PathBuf,
    /// Minimum similarity (inclusive) that links two images
    pub threshold: f64,
    /// Largest group reported
    pub max_group_size: usize,
    /// Score pairs in parallel
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            folder: PathBuf::new(),
            threshold: DEFAULT_THRESHOLD,
            max_group_size: DEFAULT_MAX_GROUP_SIZE,
            parallel: false,
        }
    }
}

impl PipelineConfig {
    fn cluster_config(&self) -> ClusterConfig {
        ClusterConfig {
            threshold: self.threshold,
            max_group_size: self.max_group_size,
            parallel: self.parallel,
        }
    }
}

/// Builder for pipeline configuration
pub struct PipelineBuilder {
    config: PipelineConfig,
    measure: Option<Arc<dyn SimilarityMeasure>>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            measure: None,
        }
    }

    /// Set the folder to scan
    pub fn folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.config.folder = folder.into();
        self
    }

    /// Set the similarity threshold
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.config.threshold = threshold;
        self
    }

    /// Set the group size cap
    pub fn max_group_size(mut self, max_group_size: usize) -> Self {
        self.config.max_group_size = max_group_size;
        self
    }

    /// Score pairs on the rayon pool
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    /// Replace the ORB matcher with another measure
    pub fn measure(mut self, measure: Arc<dyn SimilarityMeasure>) -> Self {
        self.measure = Some(measure);
        self
    }

    /// Use a complete configuration
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the pipeline
    pub fn build(self) -> Pipeline {
        Pipeline {
            config: self.config,
            measure: self.measure,
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Load, cluster and report one folder
pub struct Pipeline {
    config: PipelineConfig,
    measure: Option<Arc<dyn SimilarityMeasure>>,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline without events
    pub fn run(&self) -> Result<ScanReport, DedupError> {
        self.run_with_events(&null_sender())
    }

    /// Run the pipeline with event reporting
    pub fn run_with_events(&self, events: &EventSender) -> Result<ScanReport, DedupError> {
        events.send(Event::Pipeline(PipelineEvent::Started));

        let result = self.execute(events);
        if let Err(e) = &result {
            events.send(Event::Pipeline(PipelineEvent::Error {
                message: e.to_string(),
            }));
        }
        result
    }

    fn execute(&self, events: &EventSender) -> Result<ScanReport, DedupError> {
        let start_time = Instant::now();

        // Phase 1: Loading
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Loading,
        }));
        events.send(Event::Load(LoadEvent::Started {
            folder: self.config.folder.clone(),
        }));

        let images = FolderLoader::new().list_images(&self.config.folder)?;
        let total_images = images.len();

        events.send(Event::Load(LoadEvent::Completed { total_images }));
        info!(
            "Found {} images in {}",
            total_images,
            self.config.folder.display()
        );

        // Features are cached for this run only
        let measure: Arc<dyn SimilarityMeasure> = match &self.measure {
            Some(measure) => Arc::clone(measure),
            None => Arc::new(CachedOrbMatcher::default()),
        };

        // Phase 2: Comparing
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Comparing,
        }));

        let clusterer = SimilarityClusterer::new(measure.as_ref(), self.config.cluster_config());
        let groups = clusterer.cluster_with_events(&images, events);
        let comparisons = total_images.saturating_sub(1) * total_images / 2;

        // Phase 3: Reporting
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Reporting,
        }));

        let pairs = flatten_with_events(&groups, measure.as_ref(), events);
        let duration_ms = start_time.elapsed().as_millis() as u64;

        info!(
            "Reported {} duplicate pairs in {} groups ({} ms)",
            pairs.len(),
            groups.len(),
            duration_ms
        );

        events.send(Event::Pipeline(PipelineEvent::Completed {
            summary: PipelineSummary {
                total_images,
                duplicate_groups: groups.len(),
                duplicate_pairs: pairs.len(),
                duration_ms,
            },
        }));

        Ok(ScanReport {
            pairs,
            groups,
            total_images,
            comparisons,
            duration_ms,
        })
    }
}
