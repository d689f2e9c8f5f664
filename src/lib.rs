//! trajview - Trajectory animation for particle snapshot logs.
//!
//! Loads a table of per-particle, per-time snapshots, indexes it by
//! `(particle id, time)` and replays it frame by frame into a rendering sink.
//!
//! # Architecture
//!
//! - `table`: Parsing delimited snapshot tables
//! - `index`: Sorted time/id indices, keyed lookup and frame assembly
//! - `trajectory`: The loaded records plus their index, built once per run
//! - `animation`: Frame sequencing, sinks, and the `.ptra` file format
//! - `schema`: Record and configuration types
//!
//! # Example
//!
//! ```rust,no_run
//! use trajview::{
//!     animation::{AnimationDriver, AnimationRecorder, FinalAction, RecorderConfig},
//!     table::TableLoader,
//!     Trajectory,
//! };
//!
//! let trajectory = Trajectory::load("output.tsv", &TableLoader::new())?;
//!
//! let mut recorder = AnimationRecorder::create(
//!     "trajectory.ptra",
//!     trajectory.index().ids(),
//!     RecorderConfig::default(),
//! )?;
//! let mut driver = AnimationDriver::new(trajectory.frames());
//! let summary = driver.run(
//!     &mut recorder,
//!     FinalAction::Persist { path: "trajectory.ptra".into() },
//! )?;
//!
//! println!("Rendered {} frames", summary.frames_rendered);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod animation;
pub mod index;
pub mod schema;
pub mod table;
pub mod trajectory;

// Re-export commonly used types
pub use index::{FrameArrays, FrameBuilder, FrameError, TrajectoryIndex};
pub use schema::{AxisBounds, ParticleId, ParticleRecord, SimTime, ViewerConfig};
pub use trajectory::{Error, Trajectory};
