// THEORY:
// The `clusterer` is the Spatial Grouping Layer. It partitions every point that is
// not `Isolated` into connected clusters using neighborhood expansion, in the
// same spirit as the region growing of a blob detector:
//
// 1.  **Seeding**: A seed is chosen among the unvisited, non-Fringe points. It
//     opens a new cluster.
// 2.  **Scanning**: Every unvisited, non-Isolated point within `max_distance` of
//     the current reference point is claimed (marked visited). `Fringe` points
//     are appended to the cluster immediately as leaves. They never extend it.
//     `Dense` and `Unlabeled` points go into the pending-expansion set.
// 3.  **Expansion**: While the pending set is non-empty, one element is selected,
//     removed, appended to the cluster, and scanned from (step 2).
// 4.  **Completion**: When the pending set empties the cluster is closed and a
//     new seed is chosen, until no seed remains.
//
// `Isolated` points are pre-marked as visited and returned as their own group.
//
// Which seed and which pending element are taken next is delegated to a
// `SelectionStrategy`. `RandomSelection` reproduces the randomized flood fill,
// so the partition can differ between runs whenever more than one valid choice
// exists (a Fringe point within reach of two clusters joins whichever reaches it
// first). `InsertionOrder` always takes the earliest candidate, which makes the
// result fully deterministic.
//
// If unvisited points remain but none of them can seed (only Fringe points
// left), they are gathered into one final cluster. In a freshly classified
// sequence every Fringe point sits next to a Dense one, so this only triggers for
// hand-labelled or stale input.

use crate::core_modules::data_point::{DataPoint, DensityLabel};
use crate::pipeline::DensityConfig;
use rand::Rng;

/// Chooses which candidate to take next. `candidates` is always > 0 and the
/// returned index must be `< candidates`.
pub trait SelectionStrategy {
    fn select(&mut self, candidates: usize) -> usize;
}

/// Uniform random choice over the candidates.
pub struct RandomSelection<'a, R: Rng> {
    rng: &'a mut R,
}

impl<'a, R: Rng> RandomSelection<'a, R> {
    pub fn new(rng: &'a mut R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> SelectionStrategy for RandomSelection<'_, R> {
    fn select(&mut self, candidates: usize) -> usize {
        self.rng.gen_range(0..candidates)
    }
}

/// Always takes the earliest candidate (lowest position in the point sequence).
#[derive(Debug, Clone, Copy, Default)]
pub struct InsertionOrder;

impl SelectionStrategy for InsertionOrder {
    fn select(&mut self, _candidates: usize) -> usize {
        0
    }
}

/// The outcome of one clustering run. Holds indices into the point sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clustering {
    /// Clusters in creation order. Each lists its members in the order they joined.
    pub clusters: Vec<Vec<usize>>,
    /// The singleton group of `Isolated` points, in sequence order.
    pub isolated: Vec<usize>,
}

impl Clustering {
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// The cluster a point belongs to, if any.
    pub fn cluster_of(&self, index: usize) -> Option<usize> {
        self.clusters
            .iter()
            .position(|members| members.contains(&index))
    }

    /// Builds a per-point lookup of cluster ids for `len` points.
    pub fn assignments(&self, len: usize) -> Vec<Option<usize>> {
        let mut out = vec![None; len];
        for (cluster_id, members) in self.clusters.iter().enumerate() {
            for &index in members {
                if index < len {
                    out[index] = Some(cluster_id);
                }
            }
        }
        out
    }
}

pub mod clusterer {
    use super::*;
    use tracing::{debug, info, warn};

    /// Groups the labelled points into clusters. Points are only read.
    pub fn cluster<S: SelectionStrategy + ?Sized>(
        points: &[DataPoint],
        config: &DensityConfig,
        strategy: &mut S,
    ) -> Clustering {
        let mut visited = vec![false; points.len()];
        let mut visited_count = 0;
        let mut isolated = Vec::new();

        // --- 1. Pre-visit Isolated points ---
        for (i, point) in points.iter().enumerate() {
            if point.label == DensityLabel::Isolated {
                visited[i] = true;
                visited_count += 1;
                isolated.push(i);
            }
        }

        let mut clusters: Vec<Vec<usize>> = Vec::new();

        while visited_count < points.len() {
            // --- 2. Seeding ---
            let seeds: Vec<usize> = (0..points.len())
                .filter(|&i| !visited[i] && points[i].label != DensityLabel::Fringe)
                .collect();

            if seeds.is_empty() {
                let leftovers: Vec<usize> = (0..points.len()).filter(|&i| !visited[i]).collect();
                warn!(
                    count = leftovers.len(),
                    "only unreachable fringe points remain; grouping them as one cluster"
                );
                clusters.push(leftovers);
                break;
            }

            let seed = seeds[strategy.select(seeds.len())];
            visited[seed] = true;
            visited_count += 1;

            let mut members = vec![seed];
            let mut pending: Vec<usize> = Vec::new();
            visited_count += claim_neighbors(
                points,
                seed,
                config.max_distance,
                &mut visited,
                &mut members,
                &mut pending,
            );

            // --- 3. Expansion ---
            while !pending.is_empty() {
                let next = pending.remove(strategy.select(pending.len()));
                members.push(next);
                visited_count += claim_neighbors(
                    points,
                    next,
                    config.max_distance,
                    &mut visited,
                    &mut members,
                    &mut pending,
                );
            }

            debug!(cluster = clusters.len(), seed, size = members.len(), "cluster complete");
            clusters.push(members);
        }

        info!(
            clusters = clusters.len(),
            isolated = isolated.len(),
            "clustering complete"
        );
        Clustering { clusters, isolated }
    }

    /// Claims every unvisited, non-Isolated point within reach of `points[from]`.
    /// Fringe points go straight into `members`; the rest are queued in `pending`.
    /// Returns how many points were newly visited.
    fn claim_neighbors(
        points: &[DataPoint],
        from: usize,
        max_distance: f64,
        visited: &mut [bool],
        members: &mut Vec<usize>,
        pending: &mut Vec<usize>,
    ) -> usize {
        let origin = &points[from];
        let mut claimed = 0;

        for (i, candidate) in points.iter().enumerate() {
            if visited[i] || candidate.label == DensityLabel::Isolated {
                continue;
            }
            if origin.within(candidate, max_distance) {
                if candidate.label == DensityLabel::Fringe {
                    members.push(i);
                } else {
                    // Sorted, so InsertionOrder takes the earliest point.
                    let at = pending.partition_point(|&p| p < i);
                    pending.insert(at, i);
                }
                visited[i] = true;
                claimed += 1;
            }
        }

        claimed
    }
}
