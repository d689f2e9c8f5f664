//! Per-frame particle state assembly.

use crate::schema::{ParticleId, ParticleRecord, SimTime};

use super::TrajectoryIndex;

/// No snapshot exists for a particle at a frame's time.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Missing state for particle {id} at time {time} (frame {frame})")]
pub struct MissingParticleStateError {
    pub id: ParticleId,
    pub time: SimTime,
    pub frame: usize,
}

/// Requested frame lies outside the time index.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Frame index {index} out of range ({frame_count} frames available)")]
pub struct IndexOutOfRangeError {
    pub index: i64,
    pub frame_count: usize,
}

/// Errors raised while building a frame.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FrameError {
    #[error(transparent)]
    MissingParticleState(#[from] MissingParticleStateError),
    #[error(transparent)]
    IndexOutOfRange(#[from] IndexOutOfRangeError),
}

/// Borrowed view of every particle's snapshot at one time, in id order.
#[derive(Debug, Clone)]
pub struct Frame<'a> {
    pub index: usize,
    pub time: SimTime,
    pub records: Vec<&'a ParticleRecord>,
}

impl Frame<'_> {
    /// Split the frame into parallel per-axis arrays.
    pub fn to_arrays(&self, include_velocity: bool) -> FrameArrays {
        let n = self.records.len();
        let mut arrays = FrameArrays {
            frame: self.index,
            time: self.time,
            x: Vec::with_capacity(n),
            y: Vec::with_capacity(n),
            z: Vec::with_capacity(n),
            velocity: None,
        };
        for r in &self.records {
            arrays.x.push(r.position[0]);
            arrays.y.push(r.position[1]);
            arrays.z.push(r.position[2]);
        }

        if include_velocity {
            let mut v = VelocityArrays {
                vx: Vec::with_capacity(n),
                vy: Vec::with_capacity(n),
                vz: Vec::with_capacity(n),
            };
            for r in &self.records {
                v.vx.push(r.velocity[0]);
                v.vy.push(r.velocity[1]);
                v.vz.push(r.velocity[2]);
            }
            arrays.velocity = Some(v);
        }

        arrays
    }
}

/// Velocity components, parallel to the position arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct VelocityArrays {
    pub vx: Vec<f64>,
    pub vy: Vec<f64>,
    pub vz: Vec<f64>,
}

/// Position (and optional velocity) arrays for one frame.
///
/// Element `k` of every array belongs to the `k`-th id of the index.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameArrays {
    pub frame: usize,
    pub time: SimTime,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
    pub velocity: Option<VelocityArrays>,
}

impl FrameArrays {
    /// Number of particles in the frame.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Position of particle `k`.
    pub fn position(&self, k: usize) -> Option<[f64; 3]> {
        Some([*self.x.get(k)?, *self.y.get(k)?, *self.z.get(k)?])
    }

    /// Velocity of particle `k`, if velocities were requested.
    pub fn velocity(&self, k: usize) -> Option<[f64; 3]> {
        let v = self.velocity.as_ref()?;
        Some([*v.vx.get(k)?, *v.vy.get(k)?, *v.vz.get(k)?])
    }

    /// Speed of particle `k`, if velocities were requested.
    pub fn speed(&self, k: usize) -> Option<f64> {
        let [vx, vy, vz] = self.velocity(k)?;
        Some((vx * vx + vy * vy + vz * vz).sqrt())
    }

    /// Component planes in storage order: x, y, z, then vx, vy, vz if present.
    pub fn planes(&self) -> Vec<&[f64]> {
        let mut planes = vec![self.x.as_slice(), self.y.as_slice(), self.z.as_slice()];
        if let Some(v) = &self.velocity {
            planes.extend([v.vx.as_slice(), v.vy.as_slice(), v.vz.as_slice()]);
        }
        planes
    }
}

/// Builds frames from a record slice and the index built over it.
#[derive(Debug, Clone, Copy)]
pub struct FrameBuilder<'a> {
    records: &'a [ParticleRecord],
    index: &'a TrajectoryIndex,
    include_velocity: bool,
}

impl<'a> FrameBuilder<'a> {
    pub fn new(records: &'a [ParticleRecord], index: &'a TrajectoryIndex) -> Self {
        Self {
            records,
            index,
            include_velocity: false,
        }
    }

    /// Also emit velocity arrays from [`build`](Self::build).
    pub fn with_velocity(mut self, include_velocity: bool) -> Self {
        self.include_velocity = include_velocity;
        self
    }

    pub fn include_velocity(&self) -> bool {
        self.include_velocity
    }

    /// Number of frames that can be built.
    pub fn frame_count(&self) -> usize {
        self.index.frame_count()
    }

    /// Collect the snapshots of every particle at frame `index`.
    pub fn frame(&self, index: usize) -> Result<Frame<'a>, FrameError> {
        let time = self.index.time_of(index).ok_or(IndexOutOfRangeError {
            index: i64::try_from(index).unwrap_or(i64::MAX),
            frame_count: self.index.frame_count(),
        })?;

        let records = self
            .index
            .ids()
            .iter()
            .map(|&id| {
                self.index
                    .lookup(self.records, id, time)
                    .ok_or(MissingParticleStateError { id, time, frame: index })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Frame { index, time, records })
    }

    /// Build the per-axis arrays for frame `index`.
    pub fn build(&self, index: usize) -> Result<FrameArrays, FrameError> {
        let frame = self.frame(index)?;
        log::debug!("Built frame {} (t = {})", index, frame.time);
        Ok(frame.to_arrays(self.include_velocity))
    }

    /// Like [`build`](Self::build), for indices that may be negative.
    pub fn build_signed(&self, index: i64) -> Result<FrameArrays, FrameError> {
        let index = usize::try_from(index).map_err(|_| IndexOutOfRangeError {
            index,
            frame_count: self.index.frame_count(),
        })?;
        self.build(index)
    }
}
