// THEORY:
// The `data_point` module defines the single data structure shared by every
// analysis layer: a 2D coordinate placed by the user plus the density label
// assigned to it by the classifier.
//
// Key architectural principles:
// 1.  **Explicit Label**: The label is a tagged enum, so a point can never carry
//     two labels at once. Renderers map the enum straight to a color.
// 2.  **Identity by Position in the Sequence**: Points are stored in an ordered
//     `Vec` (creation order). A point's identity is its index, which is how the
//     classifier and clusterer exclude "self" from a neighborhood. Two distinct
//     points at the same coordinates are still neighbors of each other.
// 3.  **Dumb Data Container**: Like `SmartBlob`, a `DataPoint` holds no behavior
//     beyond geometry. All analysis lives in the stateless utility modules.

use serde::{Deserialize, Serialize};

/// The density category of a point. Exactly one per point at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DensityLabel {
    /// Not yet classified, or fell through every classification branch.
    #[default]
    Unlabeled,
    /// Has at least `dense_threshold` neighbors.
    Dense,
    /// Not dense, with exactly `fringe_exact` dense neighbors.
    Fringe,
    /// Not dense, with no dense neighbors.
    Isolated,
}

impl DensityLabel {
    pub const ALL: [DensityLabel; 4] = [
        DensityLabel::Unlabeled,
        DensityLabel::Dense,
        DensityLabel::Fringe,
        DensityLabel::Isolated,
    ];
}

/// A point on the canvas, in pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub label: DensityLabel,
}

impl DataPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            label: DensityLabel::Unlabeled,
        }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &DataPoint) -> f64 {
        distance(self, other)
    }

    /// True when `other` lies within `radius` (inclusive).
    pub fn within(&self, other: &DataPoint, radius: f64) -> bool {
        distance(self, other) <= radius
    }
}

/// Euclidean distance between two points.
///
/// `hypot` is computed on the absolute differences so that swapping the
/// arguments yields a bit-identical result.
pub fn distance(a: &DataPoint, b: &DataPoint) -> f64 {
    (a.x - b.x).abs().hypot((a.y - b.y).abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn new_points_are_unlabeled() {
        let p = DataPoint::new(3.0, 4.0);
        assert_eq!(p.label, DensityLabel::Unlabeled);
    }

    #[test]
    fn distance_is_euclidean() {
        let a = DataPoint::new(0.0, 0.0);
        let b = DataPoint::new(3.0, 4.0);
        assert_eq!(a.distance(&b), 5.0);
    }

    #[test]
    fn within_is_inclusive() {
        let a = DataPoint::new(0.0, 0.0);
        let b = DataPoint::new(50.0, 0.0);
        assert!(a.within(&b, 50.0));
        assert!(!a.within(&b, 49.999));
    }

    proptest! {
        #[test]
        fn distance_is_symmetric(
            ax in -2000.0f64..2000.0, ay in -2000.0f64..2000.0,
            bx in -2000.0f64..2000.0, by in -2000.0f64..2000.0,
        ) {
            let a = DataPoint::new(ax, ay);
            let b = DataPoint::new(bx, by);
            prop_assert_eq!(distance(&a, &b), distance(&b, &a));
        }

        #[test]
        fn distance_to_self_is_zero(x in -2000.0f64..2000.0, y in -2000.0f64..2000.0) {
            let p = DataPoint::new(x, y);
            prop_assert_eq!(distance(&p, &p), 0.0);
        }
    }
}
