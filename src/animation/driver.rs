//! Frame sequencing from a trajectory into a rendering sink.

use std::io;
use std::path::PathBuf;

use crate::index::{FrameArrays, FrameBuilder, FrameError};
use crate::schema::AxisBounds;

use super::AnimationStats;

/// What a sink does with the assembled animation once every frame is in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalAction {
    /// Encode the animation and move it to `path`.
    Persist { path: PathBuf },
    /// Show the animation to the user.
    Display,
}

impl FinalAction {
    /// Persist when an output path is configured, display otherwise.
    pub fn from_output(output: Option<PathBuf>) -> Self {
        match output {
            Some(path) => FinalAction::Persist { path },
            None => FinalAction::Display,
        }
    }
}

/// Outcome reported by a sink after its terminal action.
#[derive(Debug, Clone)]
pub enum SinkReport {
    Persisted { path: PathBuf, stats: AnimationStats },
    Displayed { frames: usize },
}

/// Errors raised by rendering sinks.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("{sink} does not support {action:?}")]
    UnsupportedAction {
        sink: &'static str,
        action: FinalAction,
    },
    #[error("Frame {frame} has {got} particles, expected {expected}")]
    ParticleCountMismatch {
        frame: usize,
        expected: usize,
        got: usize,
    },
    #[error("Frame {frame} velocity planes do not match the first frame")]
    VelocityMismatch { frame: usize },
    #[error("Sink already finalized")]
    Finalized,
}

/// Rendering collaborator driven by [`AnimationDriver`].
///
/// Frames arrive in strictly increasing order. Exactly one of `finalize` or
/// `abort` ends the run.
pub trait FrameSink {
    /// Display bounds for the run. Called once before the first frame.
    fn set_bounds(&mut self, _bounds: &AxisBounds) {}

    /// Update the visual state with the next frame.
    fn update(&mut self, frame: &FrameArrays) -> Result<(), RenderError>;

    /// Perform the terminal action on everything received.
    fn finalize(&mut self, action: &FinalAction) -> Result<SinkReport, RenderError>;

    /// Discard anything partially produced.
    fn abort(&mut self);
}

/// Lifecycle of a driver run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Rendering { frame: usize },
    Finalizing,
    Done,
    Failed,
}

/// Errors that end a driver run.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("Nothing to render: frame count is zero")]
    NoFrames,
    #[error("Driver already ran (state {0:?})")]
    AlreadyRun(DriverState),
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct RenderSummary {
    pub frames_rendered: usize,
    pub report: SinkReport,
}

/// Walks frames `0..frame_count` in order and feeds them to a sink.
pub struct AnimationDriver<'a> {
    builder: FrameBuilder<'a>,
    frame_count: usize,
    bounds: AxisBounds,
    state: DriverState,
}

impl<'a> AnimationDriver<'a> {
    /// Create a driver rendering one frame per distinct time.
    pub fn new(builder: FrameBuilder<'a>) -> Self {
        Self {
            frame_count: builder.frame_count(),
            builder,
            bounds: AxisBounds::default(),
            state: DriverState::Idle,
        }
    }

    /// Override the frame count.
    ///
    /// Counts past the available times are honored and fail once the run
    /// reaches the first missing frame.
    pub fn with_frame_count(mut self, frame_count: Option<usize>) -> Self {
        if let Some(count) = frame_count {
            let available = self.builder.frame_count();
            if count != available {
                log::warn!(
                    "Configured frame count {} differs from {} distinct times",
                    count,
                    available
                );
            }
            self.frame_count = count;
        }
        self
    }

    pub fn with_bounds(mut self, bounds: AxisBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Render every frame into `sink`, then perform `action`.
    ///
    /// On any error the sink is aborted and the driver ends in
    /// [`DriverState::Failed`].
    pub fn run<S: FrameSink + ?Sized>(
        &mut self,
        sink: &mut S,
        action: FinalAction,
    ) -> Result<RenderSummary, DriverError> {
        if self.state != DriverState::Idle {
            return Err(DriverError::AlreadyRun(self.state));
        }
        if self.frame_count == 0 {
            log::warn!("Nothing to render, aborting sink");
            self.state = DriverState::Failed;
            sink.abort();
            return Err(DriverError::NoFrames);
        }

        match self.render(sink, &action) {
            Ok(report) => {
                self.state = DriverState::Done;
                log::info!("Rendered {} frames", self.frame_count);
                Ok(RenderSummary {
                    frames_rendered: self.frame_count,
                    report,
                })
            }
            Err(e) => {
                log::warn!("Render failed in state {:?}: {}", self.state, e);
                self.state = DriverState::Failed;
                sink.abort();
                Err(e)
            }
        }
    }

    fn render<S: FrameSink + ?Sized>(
        &mut self,
        sink: &mut S,
        action: &FinalAction,
    ) -> Result<SinkReport, DriverError> {
        sink.set_bounds(&self.bounds);

        for frame in 0..self.frame_count {
            self.state = DriverState::Rendering { frame };
            let arrays = self.builder.build(frame)?;
            sink.update(&arrays)?;
        }

        self.state = DriverState::Finalizing;
        Ok(sink.finalize(action)?)
    }
}
