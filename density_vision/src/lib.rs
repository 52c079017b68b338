// THEORY:
// This file is the main entry point for the `density_vision` library crate.
// It exports the `DensityPipeline` session and its associated data structures
// (`PipelineConfig`, `InputEvent`, `Report`, etc.) as the high-level interface
// used by front-ends such as the `visual_tester`.
//
// The algorithmic layers live in `core_modules`:
// 1.  `data_point`: the labelled 2D point and the distance metric.
// 2.  `classifier`: the sequential density labelling pass.
// 3.  `clusterer`: the flood-fill grouping of non-isolated points.
// 4.  `palette`: the mapping from labels and clusters to render colors.
//
// `pipeline` glues them to input events, `render` turns a session into a frame.

pub mod core_modules;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod render;

pub use error::{DensityError, DensityResult};
