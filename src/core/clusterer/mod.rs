//! # Clusterer Module
//!
//! Groups images that are transitively similar.
//!
//! ## How It Works
//! 1. Score every unordered pair `(i, j)`, `i < j`, with a [`SimilarityMeasure`]
//! 2. Union the pair when `score >= threshold`
//! 3. Turn each connected component into groups of at most
//!    `max_group_size`, led by their lexicographically first member
//!
//! If A~B and B~C, then A, B and C end up together even when A and C score
//! below the threshold.

mod split;
mod union_find;

pub use split::split_component;
pub use union_find::DisjointSet;

use crate::core::loader::ImageRef;
use crate::core::matcher::{SimilarityMeasure, SimilarityScore};
use crate::events::{null_sender, CompareEvent, CompareProgress, Event, EventSender};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

/// Default similarity needed to link two images
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Default cap on members per reported group
pub const DEFAULT_MAX_GROUP_SIZE: usize = 5;

/// One original and the images reported as its duplicates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Canonical member; the smallest path of its chunk
    pub original: ImageRef,
    /// Remaining members in path order
    pub duplicates: Vec<ImageRef>,
}

impl DuplicateGroup {
    pub fn new(original: ImageRef, duplicates: Vec<ImageRef>) -> Self {
        Self {
            original,
            duplicates,
        }
    }

    /// Number of duplicates (excluding the original)
    pub fn duplicate_count(&self) -> usize {
        self.duplicates.len()
    }

    /// Members including the original
    pub fn len(&self) -> usize {
        self.duplicates.len() + 1
    }

    /// Always false; groups hold at least an original
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Original first, then duplicates
    pub fn members(&self) -> impl Iterator<Item = &ImageRef> {
        std::iter::once(&self.original).chain(self.duplicates.iter())
    }
}

/// Groups in emission order.
///
/// Ordered by the first member of each component in input order, then by
/// chunk within a component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DuplicateGroups(Vec<DuplicateGroup>);

impl DuplicateGroups {
    pub fn new(groups: Vec<DuplicateGroup>) -> Self {
        Self(groups)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DuplicateGroup> {
        self.0.iter()
    }

    /// Duplicates listed under `original`, if it leads a group
    pub fn get(&self, original: &ImageRef) -> Option<&[ImageRef]> {
        self.0
            .iter()
            .find(|g| &g.original == original)
            .map(|g| g.duplicates.as_slice())
    }

    pub fn originals(&self) -> impl Iterator<Item = &ImageRef> {
        self.0.iter().map(|g| &g.original)
    }

    /// Total images across all groups, originals included
    pub fn member_count(&self) -> usize {
        self.0.iter().map(DuplicateGroup::len).sum()
    }

    /// Total original/duplicate pairs the groups describe
    pub fn pair_count(&self) -> usize {
        self.0.iter().map(DuplicateGroup::duplicate_count).sum()
    }
}

impl IntoIterator for DuplicateGroups {
    type Item = DuplicateGroup;
    type IntoIter = std::vec::IntoIter<DuplicateGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a DuplicateGroups {
    type Item = &'a DuplicateGroup;
    type IntoIter = std::slice::Iter<'a, DuplicateGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Clustering parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterConfig {
    /// Minimum score (inclusive) that links two images
    pub threshold: f64,
    /// Largest group reported; bigger components are chunked
    pub max_group_size: usize,
    /// Score pairs on the rayon pool
    pub parallel: bool,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            max_group_size: DEFAULT_MAX_GROUP_SIZE,
            parallel: false,
        }
    }
}

/// All-pairs clusterer driven by a [`SimilarityMeasure`]
pub struct SimilarityClusterer<'a> {
    measure: &'a dyn SimilarityMeasure,
    config: ClusterConfig,
}

impl<'a> SimilarityClusterer<'a> {
    pub fn new(measure: &'a dyn SimilarityMeasure, config: ClusterConfig) -> Self {
        Self { measure, config }
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Cluster `images` without progress events
    pub fn cluster(&self, images: &[ImageRef]) -> DuplicateGroups {
        self.cluster_with_events(images, &null_sender())
    }

    /// Cluster `images`, emitting comparison progress.
    ///
    /// Index `i` in the union-find arena is `images[i]`; callers pass the
    /// loader's sorted listing.
    pub fn cluster_with_events(&self, images: &[ImageRef], events: &EventSender) -> DuplicateGroups {
        let n = images.len();
        let total_pairs = n.saturating_sub(1) * n / 2;

        events.send(Event::Compare(CompareEvent::Started {
            total_images: n,
            total_pairs,
        }));

        let mut set = DisjointSet::new(n);
        let progress = Progress::new(total_pairs, events);

        if self.config.parallel {
            let pairs: Vec<(usize, usize)> = (0..n)
                .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
                .collect();

            let scores: Vec<SimilarityScore> = pairs
                .par_iter()
                .map(|&(i, j)| {
                    let score = self.score_pair(&images[i], &images[j], events);
                    progress.tick();
                    score
                })
                .collect();

            // Unions stay sequential and in (i, j) order
            for (&(i, j), &score) in pairs.iter().zip(&scores) {
                if score >= self.config.threshold {
                    set.union(i, j);
                }
            }
        } else {
            for i in 0..n {
                for j in (i + 1)..n {
                    let score = self.score_pair(&images[i], &images[j], events);
                    if score >= self.config.threshold {
                        set.union(i, j);
                    }
                    progress.tick();
                }
            }
        }

        let groups: Vec<DuplicateGroup> = set
            .components()
            .into_iter()
            .filter(|component| component.len() > 1)
            .flat_map(|component| {
                let members = component.into_iter().map(|idx| images[idx].clone()).collect();
                split_component(members, self.config.max_group_size)
            })
            .collect();
        let groups = DuplicateGroups::new(groups);

        info!(
            "Clustered {} images ({} pairs) into {} groups",
            n,
            total_pairs,
            groups.len()
        );

        events.send(Event::Compare(CompareEvent::Completed {
            total_groups: groups.len(),
            grouped_images: groups.member_count(),
        }));

        groups
    }

    fn score_pair(&self, image_a: &ImageRef, image_b: &ImageRef, events: &EventSender) -> SimilarityScore {
        match self.measure.score(image_a.as_path(), image_b.as_path()) {
            Ok(score) => {
                debug!("{} vs {}: {:.4}", image_a, image_b, score);
                score
            }
            Err(e) => {
                warn!("{}; scoring {} vs {} as 0", e, image_a, image_b);
                if !events.is_listening() {
                    return 0.0;
                }
                events.send(Event::Compare(CompareEvent::PairFailed {
                    image_a: image_a.as_path().to_path_buf(),
                    image_b: image_b.as_path().to_path_buf(),
                    message: e.to_string(),
                }));
                0.0
            }
        }
    }
}

/// Throttled comparison progress, shared across rayon workers
struct Progress<'a> {
    completed: AtomicUsize,
    total: usize,
    interval: usize,
    events: &'a EventSender,
}

impl<'a> Progress<'a> {
    fn new(total: usize, events: &'a EventSender) -> Self {
        // Every 1000 comparisons or 2% of total, whichever is smaller
        let interval = std::cmp::min(1000, std::cmp::max(1, total / 50));
        Self {
            completed: AtomicUsize::new(0),
            total,
            interval,
            events,
        }
    }

    fn tick(&self) {
        if !self.events.is_listening() {
            return;
        }
        let done = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
        if done % self.interval == 0 || done == self.total {
            self.events.send(Event::Compare(CompareEvent::Progress(CompareProgress {
                comparisons_completed: done,
                total_comparisons: self.total,
            })));
        }
    }
}

/// Cluster `images` sequentially with the given threshold and group cap
pub fn cluster(
    images: &[ImageRef],
    threshold: f64,
    max_group_size: usize,
    measure: &dyn SimilarityMeasure,
) -> DuplicateGroups {
    let config = ClusterConfig {
        threshold,
        max_group_size,
        parallel: false,
    };
    SimilarityClusterer::new(measure, config).cluster(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MatchError;
    use crate::events::EventChannel;
    use std::collections::{HashMap, HashSet};
    use std::path::Path;

    /// Scores pairs from a table keyed by file name; unknown pairs score 0
    #[derive(Default)]
    struct ScriptedMeasure {
        scores: HashMap<(String, String), f64>,
        broken: HashSet<String>,
    }

    impl ScriptedMeasure {
        fn with(mut self, a: &str, b: &str, score: f64) -> Self {
            self.scores.insert((a.to_string(), b.to_string()), score);
            self.scores.insert((b.to_string(), a.to_string()), score);
            self
        }

        fn broken(mut self, name: &str) -> Self {
            self.broken.insert(name.to_string());
            self
        }

        /// Every pair among `names` scores `score`
        fn clique(mut self, names: &[&str], score: f64) -> Self {
            for a in names {
                for b in names {
                    if a != b {
                        self = self.with(a, b, score);
                    }
                }
            }
            self
        }
    }

    fn name(path: &Path) -> String {
        path.file_name().unwrap().to_string_lossy().into_owned()
    }

    impl SimilarityMeasure for ScriptedMeasure {
        fn score(&self, a: &Path, b: &Path) -> Result<SimilarityScore, MatchError> {
            for path in [a, b] {
                if self.broken.contains(&name(path)) {
                    return Err(MatchError::ImageLoad {
                        path: path.to_path_buf(),
                        reason: "corrupt".to_string(),
                    });
                }
            }
            Ok(self.scores.get(&(name(a), name(b))).copied().unwrap_or(0.0))
        }
    }

    fn images(names: &[&str]) -> Vec<ImageRef> {
        names.iter().map(|n| ImageRef::new(format!("/photos/{}", n))).collect()
    }

    fn img(n: &str) -> ImageRef {
        ImageRef::new(format!("/photos/{}", n))
    }

    const SIX: [&str; 6] = ["1.jpg", "2.jpg", "3.jpg", "4.jpg", "5.jpg", "6.jpg"];

    #[test]
    fn empty_and_single_inputs_have_no_groups() {
        let measure = ScriptedMeasure::default();
        assert!(cluster(&[], 0.5, 5, &measure).is_empty());
        assert!(cluster(&images(&["a.jpg"]), 0.5, 5, &measure).is_empty());
    }

    #[test]
    fn similar_pair_forms_one_group() {
        let measure = ScriptedMeasure::default().with("a.jpg", "b.jpg", 0.9);
        let groups = cluster(&images(&["a.jpg", "b.jpg", "c.jpg"]), 0.5, 5, &measure);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups.get(&img("a.jpg")), Some(&[img("b.jpg")][..]));
        assert!(groups.get(&img("c.jpg")).is_none());
    }

    #[test]
    fn threshold_is_inclusive() {
        let measure = ScriptedMeasure::default().with("a.jpg", "b.jpg", 0.5);
        let list = images(&["a.jpg", "b.jpg"]);

        assert_eq!(cluster(&list, 0.5, 5, &measure).len(), 1);
        assert!(cluster(&list, 0.51, 5, &measure).is_empty());
    }

    #[test]
    fn grouping_is_transitive() {
        let measure = ScriptedMeasure::default()
            .with("a.jpg", "b.jpg", 0.8)
            .with("b.jpg", "c.jpg", 0.8)
            .with("a.jpg", "c.jpg", 0.1);

        let groups = cluster(&images(&["a.jpg", "b.jpg", "c.jpg"]), 0.5, 5, &measure);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups.get(&img("a.jpg")), Some(&[img("b.jpg"), img("c.jpg")][..]));
    }

    #[test]
    fn six_similar_images_drop_trailing_singleton() {
        let measure = ScriptedMeasure::default().clique(&SIX, 0.9);

        let groups = cluster(&images(&SIX), 0.5, 5, &measure);

        assert_eq!(groups.len(), 1);
        let group = groups.iter().next().unwrap();
        assert_eq!(group.original, img("1.jpg"));
        assert_eq!(group.duplicates, images(&["2.jpg", "3.jpg", "4.jpg", "5.jpg"]));
        assert!(!group.members().any(|m| m == &img("6.jpg")));
    }

    #[test]
    fn seven_similar_images_split_into_two_groups() {
        let seven = ["1.jpg", "2.jpg", "3.jpg", "4.jpg", "5.jpg", "6.jpg", "7.jpg"];
        let measure = ScriptedMeasure::default().clique(&seven, 0.9);

        let groups = cluster(&images(&seven), 0.5, 5, &measure);

        let originals: Vec<_> = groups.originals().cloned().collect();
        assert_eq!(originals, vec![img("1.jpg"), img("6.jpg")]);
        assert_eq!(groups.get(&img("6.jpg")), Some(&[img("7.jpg")][..]));
    }

    #[test]
    fn groups_are_emitted_in_first_member_order() {
        let measure = ScriptedMeasure::default()
            .with("b.jpg", "d.jpg", 0.9)
            .with("a.jpg", "e.jpg", 0.9);

        let groups = cluster(&images(&["a.jpg", "b.jpg", "c.jpg", "d.jpg", "e.jpg"]), 0.5, 5, &measure);

        let originals: Vec<_> = groups.originals().cloned().collect();
        assert_eq!(originals, vec![img("a.jpg"), img("b.jpg")]);
    }

    #[test]
    fn groups_are_disjoint() {
        let measure = ScriptedMeasure::default()
            .clique(&SIX, 0.9)
            .with("x.jpg", "y.jpg", 0.7);
        let mut names = SIX.to_vec();
        names.extend(["x.jpg", "y.jpg", "z.jpg"]);

        let groups = cluster(&images(&names), 0.5, 3, &measure);

        let mut seen = HashSet::new();
        for member in groups.iter().flat_map(DuplicateGroup::members) {
            assert!(seen.insert(member.clone()), "{} appears twice", member);
        }
        assert!(!seen.contains(&img("z.jpg")));
    }

    #[test]
    fn load_failures_count_as_dissimilar() {
        let measure = ScriptedMeasure::default()
            .with("a.jpg", "b.jpg", 0.9)
            .with("a.jpg", "bad.jpg", 0.9)
            .broken("bad.jpg");

        let groups = cluster(&images(&["a.jpg", "b.jpg", "bad.jpg"]), 0.5, 5, &measure);

        assert_eq!(groups.member_count(), 2);
        assert!(!groups.iter().flat_map(DuplicateGroup::members).any(|m| m == &img("bad.jpg")));
    }

    #[test]
    fn raising_threshold_never_adds_members() {
        let measure = ScriptedMeasure::default()
            .with("a.jpg", "b.jpg", 0.9)
            .with("b.jpg", "c.jpg", 0.6)
            .with("c.jpg", "d.jpg", 0.4);
        let list = images(&["a.jpg", "b.jpg", "c.jpg", "d.jpg"]);

        let mut previous: Option<HashSet<ImageRef>> = None;
        for threshold in [0.0, 0.3, 0.5, 0.7, 0.95] {
            let members: HashSet<ImageRef> = cluster(&list, threshold, 5, &measure)
                .iter()
                .flat_map(DuplicateGroup::members)
                .cloned()
                .collect();
            if let Some(prev) = &previous {
                assert!(members.is_subset(prev), "threshold {} added members", threshold);
            }
            previous = Some(members);
        }
    }

    #[test]
    fn parallel_matches_sequential() {
        let measure = ScriptedMeasure::default()
            .clique(&SIX, 0.8)
            .with("x.jpg", "y.jpg", 0.6)
            .with("y.jpg", "z.jpg", 0.2);
        let mut names = SIX.to_vec();
        names.extend(["x.jpg", "y.jpg", "z.jpg"]);
        let list = images(&names);

        let sequential = SimilarityClusterer::new(&measure, ClusterConfig::default()).cluster(&list);
        let parallel = SimilarityClusterer::new(
            &measure,
            ClusterConfig {
                parallel: true,
                ..ClusterConfig::default()
            },
        )
        .cluster(&list);

        assert_eq!(sequential, parallel);
    }

    #[test]
    fn clustering_is_deterministic() {
        let measure = ScriptedMeasure::default()
            .clique(&["a.jpg", "c.jpg", "e.jpg"], 0.7)
            .with("b.jpg", "d.jpg", 0.55);
        let list = images(&["a.jpg", "b.jpg", "c.jpg", "d.jpg", "e.jpg"]);

        assert_eq!(cluster(&list, 0.5, 5, &measure), cluster(&list, 0.5, 5, &measure));
    }

    #[test]
    fn emits_started_progress_and_completed() {
        let (sender, receiver) = EventChannel::new();
        let measure = ScriptedMeasure::default().with("a.jpg", "b.jpg", 0.9).broken("c.jpg");
        let clusterer = SimilarityClusterer::new(&measure, ClusterConfig::default());

        clusterer.cluster_with_events(&images(&["a.jpg", "b.jpg", "c.jpg"]), &sender);
        drop(sender);
        let events: Vec<_> = receiver.iter().collect();

        match &events[0] {
            Event::Compare(CompareEvent::Started {
                total_images,
                total_pairs,
            }) => {
                assert_eq!(*total_images, 3);
                assert_eq!(*total_pairs, 3);
            }
            other => panic!("Expected Started event, got {:?}", other),
        }

        let failures = events
            .iter()
            .filter(|e| matches!(e, Event::Compare(CompareEvent::PairFailed { .. })))
            .count();
        assert_eq!(failures, 2);

        assert!(events.iter().any(|e| matches!(
            e,
            Event::Compare(CompareEvent::Progress(p)) if p.comparisons_completed == 3
        )));

        match events.last().unwrap() {
            Event::Compare(CompareEvent::Completed {
                total_groups,
                grouped_images,
            }) => {
                assert_eq!(*total_groups, 1);
                assert_eq!(*grouped_images, 2);
            }
            other => panic!("Expected Completed event, got {:?}", other),
        }
    }
}
