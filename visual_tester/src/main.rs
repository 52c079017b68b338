//! Visual tester for density_vision.
//!
//! Usage:
//!   visual_tester replay <SCRIPT> <OUTPUT>   Replay recorded input events and save the final frame
//!   visual_tester analyze <POINTS>           Classify and cluster a point list, print JSON
//!   visual_tester interactive                Open a drawing window (requires the `gui` feature)

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use density_vision::core_modules::clusterer::InsertionOrder;
use density_vision::logging::init_logging;
use density_vision::pipeline::{DensityPipeline, InputEvent, PipelineConfig, Report};
use density_vision::render::{render_frame, save_png};
use tracing::info;

#[cfg(feature = "gui")]
mod interactive;

#[derive(Parser)]
#[command(
    name = "visual_tester",
    about = "Drive the density classifier and clusterer and look at the result",
    version
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    overrides: ConfigOverrides,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ConfigOverrides {
    /// JSON pipeline config; missing fields take their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Seed for scatter points and cluster selection
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Proximity radius in pixels
    #[arg(long, global = true)]
    max_distance: Option<f64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON list of input events and save the final frame as PNG
    Replay {
        /// Path to the event script
        script: PathBuf,

        /// Output PNG path
        output: PathBuf,

        /// Also save a frame after every reset, classify and cluster command
        #[arg(long)]
        snapshot_dir: Option<PathBuf>,
    },

    /// Classify and cluster a JSON list of [x, y] pairs, printing labels and clusters
    Analyze {
        /// Path to the point list
        points: PathBuf,

        /// Take seeds and expansions in insertion order instead of at random
        #[arg(long)]
        deterministic: bool,
    },

    /// Open an interactive window: drag to place points, s/c/r to classify/cluster/reset
    #[cfg(feature = "gui")]
    Interactive,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(&cli.overrides)?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    init_logging(&config.logging);

    match cli.command {
        Commands::Replay {
            script,
            output,
            snapshot_dir,
        } => replay(config, &script, &output, snapshot_dir.as_deref()),
        Commands::Analyze {
            points,
            deterministic,
        } => analyze(config, &points, deterministic),
        #[cfg(feature = "gui")]
        Commands::Interactive => interactive::run(config),
    }
}

fn load_config(overrides: &ConfigOverrides) -> anyhow::Result<PipelineConfig> {
    let mut config = match &overrides.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(seed) = overrides.seed {
        config.seed = Some(seed);
    }
    if let Some(max_distance) = overrides.max_distance {
        config.density.max_distance = max_distance;
    }
    config.validate()?;
    Ok(config)
}

fn replay(
    config: PipelineConfig,
    script: &Path,
    output: &Path,
    snapshot_dir: Option<&Path>,
) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(script)
        .with_context(|| format!("reading event script {}", script.display()))?;
    let events: Vec<InputEvent> = serde_json::from_str(&raw).context("parsing event script")?;

    if let Some(dir) = snapshot_dir {
        std::fs::create_dir_all(dir)?;
    }

    let mut pipeline = DensityPipeline::new(config);
    for (step, event) in events.into_iter().enumerate() {
        let report = pipeline.process_event(event);
        match &report {
            Report::Quit => break,
            Report::Classified(counts) => info!(
                step,
                dense = counts.dense,
                fringe = counts.fringe,
                isolated = counts.isolated,
                unlabeled = counts.unlabeled,
                "classified"
            ),
            Report::Clustered { clusters, isolated } => {
                info!(step, clusters, isolated, "clustered")
            }
            _ => {}
        }

        if let Some(dir) = snapshot_dir {
            if matches!(
                report,
                Report::Cleared | Report::Classified(_) | Report::Clustered { .. }
            ) {
                let path = dir.join(format!("frame_{step:04}.png"));
                save_png(&path, &render_frame(&pipeline))?;
            }
        }
    }

    save_png(output, &render_frame(&pipeline))
        .with_context(|| format!("writing {}", output.display()))?;
    println!(
        "Replay complete: {} points. Output saved to {}",
        pipeline.points().len(),
        output.display()
    );
    Ok(())
}

fn analyze(config: PipelineConfig, points: &Path, deterministic: bool) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(points)
        .with_context(|| format!("reading point list {}", points.display()))?;
    let coords: Vec<(f64, f64)> = serde_json::from_str(&raw).context("parsing point list")?;

    let mut pipeline = DensityPipeline::new(config);
    for (x, y) in coords {
        pipeline.add_point(x, y);
    }
    pipeline.classify();
    if deterministic {
        pipeline.cluster_with(&mut InsertionOrder);
    } else {
        pipeline.cluster();
    }

    let clustering = pipeline.last_clustering();
    let assignments = clustering.assignments(pipeline.points().len());
    let rows: Vec<serde_json::Value> = pipeline
        .points()
        .iter()
        .zip(assignments)
        .map(|(point, cluster)| {
            serde_json::json!({
                "x": point.x,
                "y": point.y,
                "label": point.label,
                "cluster": cluster,
            })
        })
        .collect();
    let summary = serde_json::json!({
        "points": rows,
        "clusters": clustering.clusters,
        "isolated": clustering.isolated,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
