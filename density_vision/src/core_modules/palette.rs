// THEORY:
// The `palette` module maps analysis results to render colors. Label colors are
// a direct `match` on the enum. Cluster colors are drawn from a fixed palette of
// twelve named colors in a shuffled order without replacement, so neighboring
// clusters rarely share a hue. Once all twelve are used the shuffled order
// repeats instead of running dry.

use crate::core_modules::data_point::DensityLabel;
use image::Rgba;
use rand::Rng;
use rand::seq::SliceRandom;

pub const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
/// Color of freshly placed, not yet analyzed points.
pub const RAW_POINT: Rgba<u8> = Rgba([0, 0, 0, 255]);

pub const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
pub const YELLOW: Rgba<u8> = Rgba([255, 255, 0, 255]);
pub const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
/// Unlabeled fall-through points. Not part of the cluster palette.
pub const SLATE_GRAY: Rgba<u8> = Rgba([112, 128, 144, 255]);

/// Named cluster colors, in their canonical order.
pub const CLUSTER_PALETTE: [(&str, Rgba<u8>); 12] = [
    ("black", Rgba([0, 0, 0, 255])),
    ("gray", Rgba([128, 128, 128, 255])),
    ("brown", Rgba([165, 42, 42, 255])),
    ("orange", Rgba([255, 165, 0, 255])),
    ("lime", Rgba([0, 255, 0, 255])),
    ("cyan", Rgba([0, 255, 255, 255])),
    ("blue", Rgba([0, 0, 255, 255])),
    ("navy", Rgba([0, 0, 128, 255])),
    ("magenta", Rgba([255, 0, 255, 255])),
    ("purple", Rgba([128, 0, 128, 255])),
    ("violet", Rgba([238, 130, 238, 255])),
    ("pink", Rgba([255, 192, 203, 255])),
];

/// Render color for a density label.
pub fn label_color(label: DensityLabel) -> Rgba<u8> {
    match label {
        DensityLabel::Dense => GREEN,
        DensityLabel::Fringe => YELLOW,
        DensityLabel::Isolated => RED,
        DensityLabel::Unlabeled => SLATE_GRAY,
    }
}

/// Picks one palette color per cluster.
pub fn cluster_colors<R: Rng>(cluster_count: usize, rng: &mut R) -> Vec<Rgba<u8>> {
    let mut order: Vec<usize> = (0..CLUSTER_PALETTE.len()).collect();
    order.shuffle(rng);
    (0..cluster_count)
        .map(|i| CLUSTER_PALETTE[order[i % order.len()]].1)
        .collect()
}
