//! Frame sequencing, rendering sinks and the trajectory animation format.
//!
//! [`AnimationDriver`] walks a trajectory frame by frame and hands each
//! frame to a [`FrameSink`]. Two sinks ship with the crate:
//! [`AnimationRecorder`] persists a `.ptra` file and [`TerminalPreview`]
//! displays a per-frame summary.
//!
//! # File Format
//!
//! The `.ptra` (Particle TRajectory Animation) format stores frames with
//! optional compression:
//!
//! ```text
//! Header (56 bytes):
//!   Magic: "PTRA" (4 bytes)
//!   Version: u16
//!   Flags: u16 (compression, velocity)
//!   Particle count: u32
//!   Frame count: u64
//!   Frame rate: f32
//!   Axis bounds: 6 x f32
//!   Reserved: 8 bytes
//!
//! Id table (particle_count * 8 bytes):
//!   Particle id: u64, in array order
//!
//! Frame data (variable):
//!   Time: f64, then x, y, z (and vx, vy, vz) planes of particle_count f64
//!   Optionally LZ4 compressed
//!
//! Frame index table (frame_count * 16 bytes):
//!   Offset: u64
//!   Compressed size: u64
//! ```

mod driver;
mod format;
mod player;
mod preview;
mod recorder;

pub use driver::{
    AnimationDriver, DriverError, DriverState, FinalAction, FrameSink, RenderError,
    RenderSummary, SinkReport,
};
pub use format::{
    ANIMATION_MAGIC, ANIMATION_VERSION, AnimationFlags, AnimationHeader, CompressionType,
    FrameIndex,
};
pub use player::{AnimationPlayer, FrameIterator};
pub use preview::{FrameSummary, TerminalPreview};
pub use recorder::{AnimationRecorder, AnimationStats, RecorderConfig};
