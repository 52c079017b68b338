// THEORY:
// The `render` module turns a `DensityPipeline` into a frame. It is the only place
// that knows about pixels: the analysis layers hand it labels and cluster
// membership, it hands back an RGBA image on a white canvas with one filled
// circle per point.
//
// Coloring depends on the pipeline's current `View`:
// - Raw: every point black.
// - Labels: Dense green, Fringe yellow, Isolated red, Unlabeled slate gray.
// - Clusters: each cluster in its palette color; isolated points red and drawn
//   last so they stay visible.
// Points placed after the last analysis are always drawn black.

use crate::core_modules::data_point::{DataPoint, DensityLabel};
use crate::core_modules::palette::{self, BACKGROUND, RAW_POINT, RED};
use crate::error::DensityResult;
use crate::pipeline::{DensityPipeline, View};
use image::codecs::png::PngEncoder;
use image::{ImageEncoder, Rgba, RgbaImage};
use std::path::Path;

/// Draws the current state of the session.
pub fn render_frame(pipeline: &DensityPipeline) -> RgbaImage {
    let canvas = pipeline.config().canvas;
    let mut frame = RgbaImage::from_pixel(canvas.width, canvas.height, BACKGROUND);
    let points = pipeline.points();
    let analyzed = pipeline.analyzed_len().min(points.len());
    let radius = canvas.point_radius;

    match pipeline.view() {
        View::Raw => {
            for point in points {
                draw_point(&mut frame, point, radius, RAW_POINT);
            }
        }
        View::Labels => {
            for (i, point) in points.iter().enumerate() {
                let color = if i < analyzed {
                    palette::label_color(point.label)
                } else {
                    RAW_POINT
                };
                draw_point(&mut frame, point, radius, color);
            }
        }
        View::Clusters => {
            let assignments = pipeline.last_clustering().assignments(points.len());
            let colors = pipeline.cluster_colors();
            for (i, point) in points.iter().enumerate() {
                let color = match assignments[i] {
                    Some(cluster) if i < analyzed => colors.get(cluster).copied().unwrap_or(RAW_POINT),
                    _ => RAW_POINT,
                };
                if i < analyzed && point.label == DensityLabel::Isolated {
                    continue;
                }
                draw_point(&mut frame, point, radius, color);
            }
            for &i in &pipeline.last_clustering().isolated {
                if let Some(point) = points.get(i) {
                    draw_point(&mut frame, point, radius, RED);
                }
            }
        }
    }

    frame
}

fn draw_point(frame: &mut RgbaImage, point: &DataPoint, radius: u32, color: Rgba<u8>) {
    if !point.x.is_finite() || !point.y.is_finite() {
        return;
    }
    draw_circle(frame, point.x.round() as i64, point.y.round() as i64, radius as i64, color);
}

/// Fills a circle, clipped to the frame.
pub fn draw_circle(frame: &mut RgbaImage, cx: i64, cy: i64, radius: i64, color: Rgba<u8>) {
    let width = frame.width() as i64;
    let height = frame.height() as i64;
    let (left, right) = (cx.saturating_sub(radius), cx.saturating_add(radius));
    let (top, bottom) = (cy.saturating_sub(radius), cy.saturating_add(radius));
    if right < 0 || bottom < 0 || left >= width || top >= height {
        return;
    }
    let r_sq = radius * radius;

    for y in top.max(0)..=bottom.min(height - 1) {
        for x in left.max(0)..=right.min(width - 1) {
            let (dx, dy) = (x - cx, y - cy);
            if dx * dx + dy * dy <= r_sq {
                frame.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}

/// Encodes a frame as PNG into memory.
pub fn encode_png(frame: &RgbaImage) -> DensityResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let encoder = PngEncoder::new(&mut buffer);
    encoder.write_image(
        frame.as_raw(),
        frame.width(),
        frame.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(buffer)
}

/// Writes a frame to disk as PNG.
pub fn save_png(path: impl AsRef<Path>, frame: &RgbaImage) -> DensityResult<()> {
    std::fs::write(path, encode_png(frame)?)?;
    Ok(())
}
