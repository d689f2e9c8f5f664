//! trajview CLI - Render particle snapshot logs as animations.
//!
//! # Commands
//!
//! - `trajview render <input>` - Export every frame to a `.ptra` animation
//! - `trajview preview <input>` - Print a per-frame summary table
//! - `trajview inspect <input> --frame <i>` - Print one frame's arrays
//! - `trajview replay <file.ptra>` - Read an exported animation back
//! - `trajview example-config` - Print a default JSON configuration

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};

use trajview::{
    Trajectory, ViewerConfig,
    animation::{
        AnimationDriver, AnimationPlayer, AnimationRecorder, FinalAction, FrameSummary,
        RecorderConfig, SinkReport, TerminalPreview,
    },
    schema::ascii_delimiter,
    table::TableLoader,
};

/// trajview - Render particle snapshot logs as animations
#[derive(Parser)]
#[command(name = "trajview")]
#[command(about = "Render particle snapshot logs as animations")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export every frame to an animation file
    Render(RunArgs),
    /// Display a per-frame summary in the terminal
    Preview(RunArgs),
    /// Print the particle arrays of a single frame
    Inspect {
        /// Snapshot table (t, id, rx, ry, rz, vx, vy, vz)
        input: PathBuf,
        /// Frame index
        #[arg(long, allow_negative_numbers = true)]
        frame: i64,
        /// Include velocity columns
        #[arg(long)]
        velocity: bool,
        /// Field delimiter
        #[arg(long, default_value_t = '\t')]
        delimiter: char,
    },
    /// Summarise a previously exported animation
    Replay {
        /// Animation file (.ptra)
        file: PathBuf,
    },
    /// Print an example JSON configuration
    ExampleConfig,
}

#[derive(Args)]
struct RunArgs {
    /// Snapshot table; overrides `input_path` from the config file
    input: Option<PathBuf>,
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Output animation path (render only)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Frame count; defaults to the number of distinct times
    #[arg(long)]
    frames: Option<usize>,
    /// Carry velocity components
    #[arg(long)]
    velocity: bool,
}

fn main() -> Result<()> {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render(args) => {
            let mut config = resolve_config(args)?;
            if config.output_path.is_none() {
                config.output_path = Some(config.input_path.with_extension("ptra"));
            }
            run(&config)
        }
        Commands::Preview(args) => {
            let mut config = resolve_config(args)?;
            config.output_path = None;
            run(&config)
        }
        Commands::Inspect {
            input,
            frame,
            velocity,
            delimiter,
        } => inspect(&input, frame, velocity, delimiter),
        Commands::Replay { file } => replay(&file),
        Commands::ExampleConfig => {
            let config = ViewerConfig::default();
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

/// Merge the optional config file with command-line overrides.
fn resolve_config(args: RunArgs) -> Result<ViewerConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Error reading config file {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Error parsing config {}", path.display()))?
        }
        None => ViewerConfig {
            output_path: None,
            ..Default::default()
        },
    };

    match (args.input, &args.config) {
        (Some(input), _) => config.input_path = input,
        (None, None) => bail!("No input table given (pass <INPUT> or --config)"),
        (None, Some(_)) => {}
    }
    if args.output.is_some() {
        config.output_path = args.output;
    }
    if args.frames.is_some() {
        config.frame_count = args.frames;
    }
    config.include_velocity |= args.velocity;

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn load(path: &Path, delimiter: u8) -> Result<Trajectory> {
    let loader = TableLoader::new().with_delimiter(delimiter);
    Trajectory::load(path, &loader).with_context(|| format!("Failed to load {}", path.display()))
}

fn run(config: &ViewerConfig) -> Result<()> {
    let start = Instant::now();
    let trajectory = load(&config.input_path, config.delimiter_byte())?;
    let index = trajectory.index();

    println!("trajview");
    println!("========");
    println!("Input: {}", config.input_path.display());
    println!(
        "Snapshots: {} ({} times x {} particles)",
        trajectory.records().len(),
        index.frame_count(),
        index.particle_count()
    );
    println!();

    let builder = trajectory.frames().with_velocity(config.include_velocity);
    let mut driver = AnimationDriver::new(builder)
        .with_frame_count(config.frame_count)
        .with_bounds(config.axis_bounds);

    let action = FinalAction::from_output(config.output_path.clone());
    let summary = match &action {
        FinalAction::Persist { path } => {
            let mut recorder =
                AnimationRecorder::create(path, index.ids(), RecorderConfig::from(config))
                    .with_context(|| format!("Failed to create {}", path.display()))?;
            driver.run(&mut recorder, action.clone())?
        }
        FinalAction::Display => {
            let mut preview = TerminalPreview::new(io::stdout().lock());
            driver.run(&mut preview, action.clone())?
        }
    };

    println!();
    match &summary.report {
        SinkReport::Persisted { path, stats } => {
            println!("Wrote {}: {}", path.display(), stats);
        }
        SinkReport::Displayed { frames } => println!("Displayed {} frames", frames),
    }
    println!("Time: {:.2}s", start.elapsed().as_secs_f32());
    Ok(())
}

fn inspect(input: &Path, frame: i64, velocity: bool, delimiter: char) -> Result<()> {
    let delimiter = ascii_delimiter(delimiter)?;
    let trajectory = load(input, delimiter)?;
    let index = trajectory.index();

    let missing = index.missing_pairs();
    if !missing.is_empty() {
        log::warn!(
            "{} of {} (id, t) pairs have no snapshot; first: id {} at t {}",
            missing.len(),
            index.frame_count() * index.particle_count(),
            missing[0].0,
            missing[0].1
        );
    }

    let arrays = trajectory.frames().with_velocity(velocity).build_signed(frame)?;

    println!("Frame {} (t = {})", arrays.frame, arrays.time);
    for (k, id) in index.ids().iter().enumerate() {
        let Some([x, y, z]) = arrays.position(k) else {
            continue;
        };
        match arrays.velocity(k) {
            Some([vx, vy, vz]) => println!(
                "{:>8} {:>12.6} {:>12.6} {:>12.6} {:>12.6} {:>12.6} {:>12.6}",
                id, x, y, z, vx, vy, vz
            ),
            None => println!("{:>8} {:>12.6} {:>12.6} {:>12.6}", id, x, y, z),
        }
    }
    Ok(())
}

fn replay(file: &Path) -> Result<()> {
    let mut player = AnimationPlayer::open(file)
        .with_context(|| format!("Failed to open animation {}", file.display()))?;
    let bounds = player.axis_bounds();

    println!("Animation: {}", file.display());
    println!(
        "Frames: {} at {} fps, {} particles{}",
        player.frame_count(),
        player.frame_rate(),
        player.particle_count(),
        if player.has_velocity() { " (with velocity)" } else { "" }
    );
    println!();

    for frame in player.frames() {
        let frame = frame?;
        let s = FrameSummary::from_arrays(&frame, &bounds);
        println!(
            "  Frame {}: t={:.4}, centroid=({:.4}, {:.4}, {:.4}), outside={}",
            s.frame, s.time.value(), s.centroid[0], s.centroid[1], s.centroid[2], s.outside
        );
    }
    Ok(())
}
