// THEORY:
// The `pipeline` module is the top-level API of the engine. A `DensityPipeline` is
// one interactive session: it owns the ordered point sequence, the random source,
// the configuration and the state the renderer needs (current view, last
// clustering, cluster colors).
//
// Front-ends feed it `InputEvent`s (mouse press/motion/release, command keys) and
// receive a `Report` for each one. The analyses run to completion inside the
// handling of a single event, so the renderer always sees a finished result.

use crate::core_modules::classifier::{LabelCounts, classifier};
use crate::core_modules::clusterer::{Clustering, RandomSelection, SelectionStrategy, clusterer};
use crate::core_modules::data_point::DataPoint;
use crate::core_modules::palette;
use crate::error::{DensityError, DensityResult};
use crate::logging::LoggingConfig;
use image::Rgba;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

pub use crate::core_modules::data_point::DensityLabel;

/// Proximity radius, in pixels.
pub const MAX_DISTANCE: f64 = 50.0;
/// Neighbor count at which a point becomes Dense.
pub const DENSE_THRESHOLD: usize = 3;
/// Exact number of Dense neighbors that makes a point Fringe.
pub const FRINGE_EXACT: usize = 1;

/// The constants of the classification and clustering passes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityConfig {
    pub max_distance: f64,
    pub dense_threshold: usize,
    pub fringe_exact: usize,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            max_distance: MAX_DISTANCE,
            dense_threshold: DENSE_THRESHOLD,
            fringe_exact: FRINGE_EXACT,
        }
    }
}

/// Size of the drawing surface and of a drawn point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
    pub point_radius: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 720,
            point_radius: 5,
        }
    }
}

/// How a mouse drag turns into points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// A drag position must be farther than this from the last point to add a new one.
    pub spacing: f64,
    /// Scatter points land within +/- this many pixels of the drag position, per axis.
    pub scatter_radius: i32,
    pub scatter_min: usize,
    pub scatter_max: usize,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            spacing: 20.0,
            scatter_radius: 20,
            scatter_min: 2,
            scatter_max: 5,
        }
    }
}

/// Configuration for the DensityPipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub density: DensityConfig,
    pub canvas: CanvasConfig,
    pub drag: DragConfig,
    pub logging: LoggingConfig,
    /// Fixed seed for scatter and cluster selection. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl PipelineConfig {
    /// Loads and validates a JSON config file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> DensityResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DensityError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let raw = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> DensityResult<()> {
        let density = &self.density;
        if !density.max_distance.is_finite() || density.max_distance < 0.0 {
            return Err(DensityError::config(format!(
                "max_distance must be a finite, non-negative number (got {})",
                density.max_distance
            )));
        }
        // Zero would let lone points become Dense or Fringe instead of Isolated.
        if density.dense_threshold == 0 {
            return Err(DensityError::config("dense_threshold must be at least 1"));
        }
        if density.fringe_exact == 0 {
            return Err(DensityError::config("fringe_exact must be at least 1"));
        }
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(DensityError::config("canvas dimensions must be non-zero"));
        }
        if self.canvas.point_radius == 0 {
            return Err(DensityError::config("point_radius must be at least 1"));
        }
        let drag = &self.drag;
        if !drag.spacing.is_finite() || drag.spacing < 0.0 {
            return Err(DensityError::config("drag spacing must be finite and non-negative"));
        }
        if drag.scatter_radius < 0 {
            return Err(DensityError::config("scatter_radius must be non-negative"));
        }
        if drag.scatter_min > drag.scatter_max {
            return Err(DensityError::config(format!(
                "scatter_min ({}) exceeds scatter_max ({})",
                drag.scatter_min, drag.scatter_max
            )));
        }
        Ok(())
    }
}

/// The commands bound to keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// Clear every point. Bound to `r`.
    Reset,
    /// Run the classifier. Bound to `s`.
    Classify,
    /// Run the clusterer. Bound to `c`.
    Cluster,
}

impl Command {
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            'r' => Some(Command::Reset),
            's' => Some(Command::Classify),
            'c' => Some(Command::Cluster),
            _ => None,
        }
    }
}

/// One input from the front-end. Mouse coordinates are in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    /// Left mouse button pressed.
    Press { x: f64, y: f64 },
    /// Mouse button released.
    Release,
    /// Mouse moved. Only adds points while the button is held.
    Motion { x: f64, y: f64 },
    Key { command: Command },
    Quit,
}

/// What the renderer should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    /// Plain placed points.
    #[default]
    Raw,
    /// Points colored by density label.
    Labels,
    /// Points colored by cluster, isolated points in red.
    Clusters,
}

/// The outcome of handling one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    Idle,
    PointsAdded(usize),
    Cleared,
    Classified(LabelCounts),
    Clustered { clusters: usize, isolated: usize },
    Quit,
}

/// One interactive session over an ordered point sequence.
pub struct DensityPipeline {
    config: PipelineConfig,
    points: Vec<DataPoint>,
    rng: StdRng,
    is_dragging: bool,
    view: View,
    /// Points at or past this index were placed after the last analysis.
    analyzed_len: usize,
    last_clustering: Clustering,
    cluster_colors: Vec<Rgba<u8>>,
}

impl DensityPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            points: Vec::new(),
            rng,
            is_dragging: false,
            view: View::Raw,
            analyzed_len: 0,
            last_clustering: Clustering::default(),
            cluster_colors: Vec::new(),
        }
    }

    pub fn process_event(&mut self, event: InputEvent) -> Report {
        debug!(?event, "processing event");
        match event {
            InputEvent::Quit => Report::Quit,
            InputEvent::Press { x, y } => {
                self.is_dragging = true;
                self.add_point(x, y);
                Report::PointsAdded(1)
            }
            InputEvent::Release => {
                self.is_dragging = false;
                Report::Idle
            }
            InputEvent::Motion { x, y } if self.is_dragging => {
                let added = self.drag_to(x, y);
                if added == 0 {
                    Report::Idle
                } else {
                    Report::PointsAdded(added)
                }
            }
            InputEvent::Motion { .. } => Report::Idle,
            InputEvent::Key { command } => match command {
                Command::Reset => {
                    self.reset();
                    Report::Cleared
                }
                Command::Classify => {
                    self.classify();
                    Report::Classified(LabelCounts::tally(&self.points))
                }
                Command::Cluster => {
                    self.cluster();
                    Report::Clustered {
                        clusters: self.last_clustering.cluster_count(),
                        isolated: self.last_clustering.isolated.len(),
                    }
                }
            },
        }
    }

    pub fn add_point(&mut self, x: f64, y: f64) {
        self.points.push(DataPoint::new(x, y));
    }

    /// Handles a drag position: a new point plus a random scatter around it,
    /// once the position is far enough from the last placed point.
    fn drag_to(&mut self, x: f64, y: f64) -> usize {
        let drag = self.config.drag;
        let candidate = DataPoint::new(x, y);
        let far_enough = self
            .points
            .last()
            .is_none_or(|last| last.distance(&candidate) > drag.spacing);
        if !far_enough {
            return 0;
        }

        self.points.push(candidate);
        let scatter = self.rng.gen_range(drag.scatter_min..=drag.scatter_max);
        for _ in 0..scatter {
            let dx = self.rng.gen_range(-drag.scatter_radius..=drag.scatter_radius);
            let dy = self.rng.gen_range(-drag.scatter_radius..=drag.scatter_radius);
            self.add_point(x + f64::from(dx), y + f64::from(dy));
        }
        1 + scatter
    }

    /// Labels every point and switches to the label view.
    pub fn classify(&mut self) -> &[DataPoint] {
        info!(points = self.points.len(), "classifying");
        classifier::classify(&mut self.points, &self.config.density);
        self.analyzed_len = self.points.len();
        self.view = View::Labels;
        &self.points
    }

    /// Clusters the points with random selection and switches to the cluster view.
    /// The points are returned unchanged; membership is kept as render state.
    pub fn cluster(&mut self) -> &[DataPoint] {
        let mut rng = StdRng::seed_from_u64(self.rng.next_u64());
        self.cluster_with(&mut RandomSelection::new(&mut rng))
    }

    /// Like `cluster`, with a caller-chosen selection strategy.
    pub fn cluster_with<S: SelectionStrategy + ?Sized>(&mut self, strategy: &mut S) -> &[DataPoint] {
        info!(points = self.points.len(), "clustering");
        let clustering = clusterer::cluster(&self.points, &self.config.density, strategy);
        self.cluster_colors = palette::cluster_colors(clustering.cluster_count(), &mut self.rng);
        self.last_clustering = clustering;
        self.analyzed_len = self.points.len();
        self.view = View::Clusters;
        &self.points
    }

    pub fn reset(&mut self) {
        info!(discarded = self.points.len(), "resetting canvas");
        // An in-progress drag stays alive; the button is still held.
        self.points.clear();
        self.view = View::Raw;
        self.analyzed_len = 0;
        self.last_clustering = Clustering::default();
        self.cluster_colors.clear();
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn is_dragging(&self) -> bool {
        self.is_dragging
    }

    /// Number of leading points covered by the last classify or cluster run.
    pub fn analyzed_len(&self) -> usize {
        self.analyzed_len
    }

    pub fn last_clustering(&self) -> &Clustering {
        &self.last_clustering
    }

    pub fn cluster_colors(&self) -> &[Rgba<u8>] {
        &self.cluster_colors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> DensityPipeline {
        DensityPipeline::new(PipelineConfig {
            seed: Some(42),
            ..PipelineConfig::default()
        })
    }

    fn key(command: Command) -> InputEvent {
        InputEvent::Key { command }
    }

    #[test]
    fn press_places_a_point_and_starts_a_drag() {
        let mut pipeline = seeded();
        let report = pipeline.process_event(InputEvent::Press { x: 10.0, y: 20.0 });
        assert_eq!(report, Report::PointsAdded(1));
        assert!(pipeline.is_dragging());
        assert_eq!(pipeline.points(), &[DataPoint::new(10.0, 20.0)]);

        assert_eq!(pipeline.process_event(InputEvent::Release), Report::Idle);
        assert!(!pipeline.is_dragging());
    }

    #[test]
    fn motion_without_a_held_button_is_ignored() {
        let mut pipeline = seeded();
        let report = pipeline.process_event(InputEvent::Motion { x: 300.0, y: 300.0 });
        assert_eq!(report, Report::Idle);
        assert!(pipeline.points().is_empty());
    }

    #[test]
    fn short_drags_add_nothing() {
        let mut pipeline = seeded();
        pipeline.process_event(InputEvent::Press { x: 100.0, y: 100.0 });
        let report = pipeline.process_event(InputEvent::Motion { x: 120.0, y: 100.0 });
        assert_eq!(report, Report::Idle);
        assert_eq!(pipeline.points().len(), 1);
    }

    #[test]
    fn long_drags_add_a_point_and_its_scatter() {
        let mut pipeline = seeded();
        pipeline.process_event(InputEvent::Press { x: 100.0, y: 100.0 });
        let report = pipeline.process_event(InputEvent::Motion { x: 150.0, y: 100.0 });

        let Report::PointsAdded(added) = report else {
            panic!("expected points, got {report:?}");
        };
        assert!((3..=6).contains(&added), "added {added}");
        assert_eq!(pipeline.points().len(), 1 + added);
        assert_eq!(pipeline.points()[1], DataPoint::new(150.0, 100.0));
        for p in &pipeline.points()[2..] {
            assert!((p.x - 150.0).abs() <= 20.0);
            assert!((p.y - 100.0).abs() <= 20.0);
            assert_eq!(p.x.fract(), 0.0);
        }
    }

    #[test]
    fn drag_spacing_is_measured_from_the_last_scatter_point() {
        let config = PipelineConfig {
            seed: Some(1),
            drag: DragConfig {
                scatter_min: 1,
                scatter_max: 1,
                scatter_radius: 0,
                ..DragConfig::default()
            },
            ..PipelineConfig::default()
        };
        let mut pipeline = DensityPipeline::new(config);
        pipeline.process_event(InputEvent::Press { x: 0.0, y: 0.0 });
        assert_eq!(
            pipeline.process_event(InputEvent::Motion { x: 30.0, y: 0.0 }),
            Report::PointsAdded(2)
        );
        // Last point is the zero-radius scatter at (30, 0).
        assert_eq!(
            pipeline.process_event(InputEvent::Motion { x: 45.0, y: 0.0 }),
            Report::Idle
        );
    }

    #[test]
    fn drag_after_reset_starts_fresh() {
        let mut pipeline = seeded();
        pipeline.process_event(InputEvent::Press { x: 0.0, y: 0.0 });
        assert_eq!(pipeline.process_event(key(Command::Reset)), Report::Cleared);
        assert!(pipeline.is_dragging());

        let report = pipeline.process_event(InputEvent::Motion { x: 1.0, y: 1.0 });
        assert!(matches!(report, Report::PointsAdded(n) if n >= 3));
    }

    #[test]
    fn classify_key_labels_points_and_switches_view() {
        let mut pipeline = seeded();
        for (x, y) in [(0.0, 0.0), (10.0, 0.0), (0.0, 10.0), (10.0, 10.0), (500.0, 500.0)] {
            pipeline.add_point(x, y);
        }
        let report = pipeline.process_event(key(Command::Classify));
        assert_eq!(
            report,
            Report::Classified(LabelCounts {
                dense: 4,
                fringe: 0,
                isolated: 1,
                unlabeled: 0,
            })
        );
        assert_eq!(pipeline.view(), View::Labels);
        assert_eq!(pipeline.analyzed_len(), 5);
    }

    #[test]
    fn cluster_key_keeps_points_unchanged() {
        let mut pipeline = seeded();
        for (x, y) in [(0.0, 0.0), (10.0, 0.0), (0.0, 10.0), (10.0, 10.0), (500.0, 500.0)] {
            pipeline.add_point(x, y);
        }
        pipeline.process_event(key(Command::Classify));
        let before = pipeline.points().to_vec();

        let report = pipeline.process_event(key(Command::Cluster));
        assert_eq!(report, Report::Clustered { clusters: 1, isolated: 1 });
        assert_eq!(pipeline.points(), before.as_slice());
        assert_eq!(pipeline.view(), View::Clusters);
        assert_eq!(pipeline.cluster_colors().len(), 1);
    }

    #[test]
    fn clustering_without_classification_uses_every_point_as_a_seed() {
        let mut pipeline = seeded();
        pipeline.add_point(0.0, 0.0);
        pipeline.add_point(300.0, 300.0);
        let report = pipeline.process_event(key(Command::Cluster));
        assert_eq!(report, Report::Clustered { clusters: 2, isolated: 0 });
    }

    #[test]
    fn cluster_with_a_deterministic_strategy() {
        use crate::core_modules::clusterer::InsertionOrder;

        let mut pipeline = seeded();
        for (x, y) in [(0.0, 0.0), (10.0, 0.0), (0.0, 10.0), (10.0, 10.0)] {
            pipeline.add_point(x, y);
        }
        pipeline.classify();
        pipeline.cluster_with(&mut InsertionOrder);
        assert_eq!(pipeline.last_clustering().clusters, vec![vec![0, 1, 2, 3]]);
    }

    #[test]
    fn reset_clears_points_and_analysis() {
        let mut pipeline = seeded();
        pipeline.add_point(0.0, 0.0);
        pipeline.classify();
        pipeline.cluster();
        pipeline.reset();
        assert!(pipeline.points().is_empty());
        assert_eq!(pipeline.view(), View::Raw);
        assert_eq!(pipeline.analyzed_len(), 0);
        assert_eq!(pipeline.last_clustering(), &Clustering::default());
    }

    #[test]
    fn quit_is_reported() {
        assert_eq!(seeded().process_event(InputEvent::Quit), Report::Quit);
    }

    #[test]
    fn seeded_sessions_are_reproducible() {
        let events = [
            InputEvent::Press { x: 100.0, y: 100.0 },
            InputEvent::Motion { x: 140.0, y: 100.0 },
            InputEvent::Motion { x: 180.0, y: 110.0 },
            InputEvent::Release,
        ];
        let mut a = seeded();
        let mut b = seeded();
        for event in events {
            a.process_event(event);
            b.process_event(event);
        }
        assert_eq!(a.points(), b.points());
    }

    #[test]
    fn keys_map_to_commands() {
        assert_eq!(Command::from_key('r'), Some(Command::Reset));
        assert_eq!(Command::from_key('s'), Some(Command::Classify));
        assert_eq!(Command::from_key('c'), Some(Command::Cluster));
        assert_eq!(Command::from_key('x'), None);
    }

    #[test]
    fn events_deserialize_from_tagged_json() {
        let events: Vec<InputEvent> = serde_json::from_str(
            r#"[
                {"type": "press", "x": 1.0, "y": 2.0},
                {"type": "motion", "x": 3, "y": 4},
                {"type": "release"},
                {"type": "key", "command": "classify"},
                {"type": "quit"}
            ]"#,
        )
        .expect("valid script");
        assert_eq!(
            events,
            vec![
                InputEvent::Press { x: 1.0, y: 2.0 },
                InputEvent::Motion { x: 3.0, y: 4.0 },
                InputEvent::Release,
                InputEvent::Key { command: Command::Classify },
                InputEvent::Quit,
            ]
        );
    }

    #[test]
    fn partial_config_takes_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"density": {"max_distance": 30.0}, "seed": 9}"#).expect("valid config");
        assert_eq!(config.density.max_distance, 30.0);
        assert_eq!(config.density.dense_threshold, DENSE_THRESHOLD);
        assert_eq!(config.canvas, CanvasConfig::default());
        assert_eq!(config.seed, Some(9));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let mut config = PipelineConfig::default();
        config.density.max_distance = f64::NAN;
        assert!(matches!(config.validate(), Err(DensityError::InvalidConfig { .. })));

        let mut config = PipelineConfig::default();
        config.drag.scatter_min = 6;
        assert!(matches!(config.validate(), Err(DensityError::InvalidConfig { .. })));

        let mut config = PipelineConfig::default();
        config.canvas.width = 0;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.density.dense_threshold = 0;
        assert!(matches!(config.validate(), Err(DensityError::InvalidConfig { .. })));
    }

    #[test]
    fn zero_fringe_exact_is_rejected_from_json() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"density": {"fringe_exact": 0}}"#).expect("parses");
        assert!(matches!(config.validate(), Err(DensityError::InvalidConfig { .. })));
    }

    #[test]
    fn missing_config_file_is_reported() {
        let err = PipelineConfig::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, DensityError::FileNotFound { .. }));
    }
}
