// THEORY:
// The `classifier` is the Density Labelling Layer. It walks the ordered point
// sequence once and assigns each point exactly one `DensityLabel` from two
// counts gathered over its neighborhood (every other point within
// `max_distance`, inclusive):
//
// 1.  `neighbors`: how many other points are in reach.
// 2.  `dense_neighbors`: how many of those are *already* labelled `Dense` at
//     the moment the current point is evaluated.
//
// The decision rule, in priority order:
// - `neighbors >= dense_threshold`            => Dense
// - `dense_neighbors == fringe_exact`         => Fringe
// - `dense_neighbors == 0`                    => Isolated
// - otherwise                                 => stays Unlabeled
//
// ORDERING HAZARD: because `dense_neighbors` only sees labels written earlier in
// the same pass, the result depends on the order of the sequence. A point that
// sits next to a dense point will be `Fringe` if the dense point comes first and
// `Isolated` if it comes after. This is intended behavior. The pass must stay
// sequential; it must not be parallelized or reordered.
//
// Every run starts from a cleared state (all `Unlabeled`), so classifying an
// unchanged sequence twice yields the same labels.

use crate::core_modules::data_point::{DataPoint, DensityLabel};
use crate::pipeline::DensityConfig;

pub mod classifier {
    use super::*;
    use tracing::{debug, info};

    /// Labels every point in place and hands the same slice back for chaining.
    pub fn classify<'a>(points: &'a mut [DataPoint], config: &DensityConfig) -> &'a mut [DataPoint] {
        // --- 1. Reset ---
        for point in points.iter_mut() {
            point.label = DensityLabel::Unlabeled;
        }

        // --- 2. Sequential Labelling ---
        // Index-based on purpose: labels written for `0..i` are visible while
        // evaluating `i`.
        for i in 0..points.len() {
            let (neighbors, dense_neighbors) = count_neighbors(points, i, config.max_distance);
            let label = decide(neighbors, dense_neighbors, config);
            debug!(index = i, neighbors, dense_neighbors, ?label, "classified point");
            points[i].label = label;
        }

        let counts = LabelCounts::tally(points);
        info!(
            total = points.len(),
            dense = counts.dense,
            fringe = counts.fringe,
            isolated = counts.isolated,
            unlabeled = counts.unlabeled,
            "classification complete"
        );
        points
    }

    /// Counts the neighbors of `points[index]` and how many of them are currently Dense.
    pub fn count_neighbors(points: &[DataPoint], index: usize, max_distance: f64) -> (usize, usize) {
        let current = &points[index];
        let mut neighbors = 0;
        let mut dense_neighbors = 0;

        for (j, near) in points.iter().enumerate() {
            // A point is never its own neighbor.
            if j == index {
                continue;
            }
            if current.within(near, max_distance) {
                neighbors += 1;
                if near.label == DensityLabel::Dense {
                    dense_neighbors += 1;
                }
            }
        }

        (neighbors, dense_neighbors)
    }

    /// The decision rule. Returns `Unlabeled` when no branch matches.
    pub fn decide(neighbors: usize, dense_neighbors: usize, config: &DensityConfig) -> DensityLabel {
        if neighbors >= config.dense_threshold {
            DensityLabel::Dense
        } else if dense_neighbors == config.fringe_exact {
            DensityLabel::Fringe
        } else if dense_neighbors == 0 {
            DensityLabel::Isolated
        } else {
            DensityLabel::Unlabeled
        }
    }
}

/// Per-label totals of a classified sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LabelCounts {
    pub dense: usize,
    pub fringe: usize,
    pub isolated: usize,
    pub unlabeled: usize,
}

impl LabelCounts {
    pub fn tally(points: &[DataPoint]) -> Self {
        let mut counts = Self::default();
        for point in points {
            match point.label {
                DensityLabel::Dense => counts.dense += 1,
                DensityLabel::Fringe => counts.fringe += 1,
                DensityLabel::Isolated => counts.isolated += 1,
                DensityLabel::Unlabeled => counts.unlabeled += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.dense + self.fringe + self.isolated + self.unlabeled
    }
}
