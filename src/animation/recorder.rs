//! Animation recorder that persists rendered frames to a `.ptra` file.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::driver::{FinalAction, FrameSink, RenderError, SinkReport};
use super::format::{
    AnimationFlags, AnimationHeader, CompressionType, FrameIndex, compress_lz4, encode_values,
};
use crate::index::FrameArrays;
use crate::schema::{AxisBounds, ParticleId, ViewerConfig};

/// Configuration for animation recording.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Compression type to use.
    pub compression: CompressionType,
    /// Playback rate stored in the header.
    pub frame_rate: f32,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            compression: CompressionType::None,
            frame_rate: 30.0,
        }
    }
}

impl From<&ViewerConfig> for RecorderConfig {
    fn from(config: &ViewerConfig) -> Self {
        Self {
            compression: config.compression,
            frame_rate: config.frame_rate,
        }
    }
}

/// Animation recorder that captures frames to a file.
///
/// Frames stream into `<target>.partial`. Only [`FrameSink::finalize`] with
/// [`FinalAction::Persist`] moves the file into place; an aborted or dropped
/// recorder deletes it.
///
/// Usage:
/// ```ignore
/// let mut recorder = AnimationRecorder::create("out.ptra", index.ids(), Default::default())?;
/// driver.run(&mut recorder, FinalAction::Persist { path: "out.ptra".into() })?;
/// ```
pub struct AnimationRecorder {
    writer: Option<BufWriter<File>>,
    staging_path: PathBuf,
    header: AnimationHeader,
    frame_indices: Vec<FrameIndex>,
    frames_written: u64,
    /// Reused buffer for frame encoding.
    encode_buffer: Vec<u8>,
}

impl AnimationRecorder {
    /// Create a recorder staging its output next to `target`.
    pub fn create<P: AsRef<Path>>(
        target: P,
        ids: &[ParticleId],
        config: RecorderConfig,
    ) -> io::Result<Self> {
        let staging_path = staging_path_for(target.as_ref());
        let particle_count = u32::try_from(ids.len()).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "Too many particles for PTRA")
        })?;

        let file = File::create(&staging_path)?;
        let mut writer = BufWriter::new(file);

        let header = AnimationHeader {
            particle_count,
            frame_count: 0, // Will be updated on finalize
            frame_rate: config.frame_rate,
            bounds: AnimationHeader::pack_bounds(&AxisBounds::default()),
            flags: AnimationFlags {
                compression: config.compression,
                has_velocity: false,
            },
        };

        // Placeholder header, rewritten on finalize
        header.write_to(&mut writer)?;
        for id in ids {
            writer.write_all(&id.0.to_le_bytes())?;
        }

        let frame_size = header.frame_size();

        Ok(Self {
            writer: Some(writer),
            staging_path,
            header,
            frame_indices: Vec::new(),
            frames_written: 0,
            encode_buffer: Vec::with_capacity(frame_size),
        })
    }

    /// Get number of frames recorded so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Path frames are streamed to before finalize.
    pub fn staging_path(&self) -> &Path {
        &self.staging_path
    }

    fn record_frame(&mut self, frame: &FrameArrays) -> Result<(), RenderError> {
        let writer = self.writer.as_mut().ok_or(RenderError::Finalized)?;

        let expected = self.header.particle_count as usize;
        if frame.len() != expected {
            return Err(RenderError::ParticleCountMismatch {
                frame: frame.frame,
                expected,
                got: frame.len(),
            });
        }

        // First frame decides whether velocity planes are stored.
        let has_velocity = frame.velocity.is_some();
        if self.frames_written == 0 {
            self.header.flags.has_velocity = has_velocity;
        } else if self.header.flags.has_velocity != has_velocity {
            return Err(RenderError::VelocityMismatch { frame: frame.frame });
        }

        let offset = writer.stream_position()?;

        self.encode_buffer.clear();
        self.encode_buffer
            .extend_from_slice(&frame.time.value().to_le_bytes());
        for plane in frame.planes() {
            encode_values(plane, &mut self.encode_buffer);
        }

        let size = match self.header.flags.compression {
            CompressionType::None => {
                writer.write_all(&self.encode_buffer)?;
                self.encode_buffer.len()
            }
            CompressionType::Lz4 => {
                let compressed = compress_lz4(&self.encode_buffer);
                writer.write_all(&compressed)?;
                compressed.len()
            }
        };

        self.frame_indices.push(FrameIndex {
            offset,
            size: size as u64,
        });
        self.frames_written += 1;
        log::debug!("Recorded frame {} ({} bytes)", frame.frame, size);

        Ok(())
    }

    /// Write the index table, rewrite the header and move the file to `path`.
    fn persist(&mut self, path: &Path) -> Result<AnimationStats, RenderError> {
        let writer = self.writer.as_mut().ok_or(RenderError::Finalized)?;

        // Write frame index table at current position
        let index_offset = writer.stream_position()?;
        for index in &self.frame_indices {
            index.write_to(writer)?;
        }

        // Update header with final frame count
        self.header.frame_count = self.frames_written;

        // Seek back and rewrite header
        writer.seek(SeekFrom::Start(0))?;
        self.header.write_to(writer)?;

        // Flush and close
        writer.flush()?;
        self.writer = None;

        if let Err(e) = fs::rename(&self.staging_path, path) {
            let _ = fs::remove_file(&self.staging_path);
            return Err(e.into());
        }

        let data_start = (AnimationHeader::SIZE + self.header.id_table_size()) as u64;
        let total_bytes = index_offset + self.frame_indices.len() as u64 * FrameIndex::SIZE as u64;

        let stats = AnimationStats {
            frame_count: self.frames_written,
            total_bytes,
            average_frame_size: if self.frames_written > 0 {
                index_offset.saturating_sub(data_start) / self.frames_written
            } else {
                0
            },
            compression: self.header.flags.compression,
        };
        log::info!("Wrote {}: {}", path.display(), stats);
        Ok(stats)
    }

    fn discard(&mut self) {
        if self.writer.take().is_none() {
            return;
        }
        match fs::remove_file(&self.staging_path) {
            Ok(()) => log::warn!(
                "Discarded partial animation {}",
                self.staging_path.display()
            ),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::warn!(
                "Failed to remove partial animation {}: {}",
                self.staging_path.display(),
                e
            ),
        }
    }
}

impl FrameSink for AnimationRecorder {
    fn set_bounds(&mut self, bounds: &AxisBounds) {
        self.header.bounds = AnimationHeader::pack_bounds(bounds);
    }

    fn update(&mut self, frame: &FrameArrays) -> Result<(), RenderError> {
        self.record_frame(frame)
    }

    fn finalize(&mut self, action: &FinalAction) -> Result<SinkReport, RenderError> {
        match action {
            FinalAction::Persist { path } => {
                let stats = self.persist(path)?;
                Ok(SinkReport::Persisted {
                    path: path.clone(),
                    stats,
                })
            }
            FinalAction::Display => Err(RenderError::UnsupportedAction {
                sink: "AnimationRecorder",
                action: action.clone(),
            }),
        }
    }

    fn abort(&mut self) {
        self.discard();
    }
}

impl Drop for AnimationRecorder {
    fn drop(&mut self) {
        self.discard();
    }
}

fn staging_path_for(target: &Path) -> PathBuf {
    let mut name = OsString::from(target.as_os_str());
    name.push(".partial");
    PathBuf::from(name)
}

/// Statistics from recording session.
#[derive(Debug, Clone)]
pub struct AnimationStats {
    /// Total frames recorded.
    pub frame_count: u64,
    /// Total file size in bytes.
    pub total_bytes: u64,
    /// Average compressed frame size.
    pub average_frame_size: u64,
    /// Compression used.
    pub compression: CompressionType,
}

impl std::fmt::Display for AnimationStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} frames, {} bytes total, {} bytes/frame avg ({:?} compression)",
            self.frame_count, self.total_bytes, self.average_frame_size, self.compression
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimationDriver, DriverError};
    use crate::index::{FrameError, IndexOutOfRangeError, VelocityArrays};
    use crate::schema::{ParticleRecord, SimTime};
    use crate::trajectory::Trajectory;
    use tempfile::tempdir;

    fn ids(n: u64) -> Vec<ParticleId> {
        (1..=n).map(ParticleId).collect()
    }

    fn frame(index: usize, n: usize, velocity: bool) -> FrameArrays {
        let base = index as f64;
        FrameArrays {
            frame: index,
            time: SimTime::new(base * 0.5).unwrap(),
            x: (0..n).map(|k| base + k as f64).collect(),
            y: vec![base; n],
            z: vec![-base; n],
            velocity: velocity.then(|| VelocityArrays {
                vx: vec![1.0; n],
                vy: vec![2.0; n],
                vz: vec![3.0; n],
            }),
        }
    }

    #[test]
    fn test_recorder_basic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.ptra");

        let mut recorder =
            AnimationRecorder::create(&path, &ids(4), RecorderConfig::default()).unwrap();
        assert!(recorder.staging_path().exists());

        for i in 0..10 {
            recorder.update(&frame(i, 4, false)).unwrap();
        }
        assert_eq!(recorder.frames_written(), 10);

        let report = recorder
            .finalize(&FinalAction::Persist { path: path.clone() })
            .unwrap();
        let SinkReport::Persisted { stats, .. } = report else {
            panic!("expected persisted report");
        };
        assert_eq!(stats.frame_count, 10);
        assert_eq!(stats.average_frame_size, (8 + 4 * 3 * 8) as u64);

        assert!(path.exists());
        assert!(!recorder.staging_path().exists());
        let metadata = fs::metadata(&path).unwrap();
        assert_eq!(metadata.len(), stats.total_bytes);
    }

    #[test]
    fn test_recorder_abort_removes_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("aborted.ptra");

        let mut recorder =
            AnimationRecorder::create(&path, &ids(2), RecorderConfig::default()).unwrap();
        recorder.update(&frame(0, 2, false)).unwrap();
        recorder.abort();

        assert!(!path.exists());
        assert!(!recorder.staging_path().exists());
        assert!(matches!(
            recorder.update(&frame(1, 2, false)),
            Err(RenderError::Finalized)
        ));
    }

    #[test]
    fn test_recorder_drop_removes_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dropped.ptra");
        let staging = staging_path_for(&path);

        {
            let mut recorder =
                AnimationRecorder::create(&path, &ids(2), RecorderConfig::default()).unwrap();
            recorder.update(&frame(0, 2, false)).unwrap();
        }

        assert!(!staging.exists());
        assert!(!path.exists());
    }

    #[test]
    fn test_recorder_rejects_particle_count_change() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("count.ptra");

        let mut recorder =
            AnimationRecorder::create(&path, &ids(3), RecorderConfig::default()).unwrap();
        assert!(matches!(
            recorder.update(&frame(0, 2, false)),
            Err(RenderError::ParticleCountMismatch {
                expected: 3,
                got: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_recorder_rejects_velocity_change() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("velocity.ptra");

        let mut recorder =
            AnimationRecorder::create(&path, &ids(2), RecorderConfig::default()).unwrap();
        recorder.update(&frame(0, 2, true)).unwrap();
        assert!(matches!(
            recorder.update(&frame(1, 2, false)),
            Err(RenderError::VelocityMismatch { frame: 1 })
        ));
    }

    #[test]
    fn test_recorder_cannot_display() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("display.ptra");

        let mut recorder =
            AnimationRecorder::create(&path, &ids(1), RecorderConfig::default()).unwrap();
        assert!(matches!(
            recorder.finalize(&FinalAction::Display),
            Err(RenderError::UnsupportedAction { .. })
        ));
    }

    #[test]
    fn test_failed_run_leaves_no_artifact() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("failed.ptra");

        // Particle 2 has no snapshot at t = 1.
        let records = [(0.0, 1), (0.0, 2), (1.0, 1), (2.0, 1), (2.0, 2)]
            .into_iter()
            .map(|(t, id)| ParticleRecord {
                id: ParticleId(id),
                t: SimTime::new(t).unwrap(),
                position: [t; 3],
                velocity: [0.0; 3],
            })
            .collect();
        let traj = Trajectory::from_records(records).unwrap();

        let mut recorder =
            AnimationRecorder::create(&path, traj.index().ids(), RecorderConfig::default())
                .unwrap();
        let mut driver = AnimationDriver::new(traj.frames());
        let err = driver
            .run(&mut recorder, FinalAction::Persist { path: path.clone() })
            .unwrap_err();

        assert!(matches!(
            err,
            DriverError::Frame(FrameError::MissingParticleState(_))
        ));
        assert_eq!(recorder.frames_written(), 1);
        assert!(!path.exists());
        assert!(!recorder.staging_path().exists());
    }

    #[test]
    fn test_empty_run_leaves_no_artifact() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.ptra");
        let traj = Trajectory::from_records(Vec::new()).unwrap();

        let mut recorder =
            AnimationRecorder::create(&path, traj.index().ids(), RecorderConfig::default())
                .unwrap();
        assert!(recorder.staging_path().exists());

        let mut driver = AnimationDriver::new(traj.frames());
        let err = driver
            .run(&mut recorder, FinalAction::Persist { path: path.clone() })
            .unwrap_err();

        assert!(matches!(err, DriverError::NoFrames));
        assert!(!path.exists());
        assert!(!recorder.staging_path().exists());
    }

    #[test]
    fn test_excess_frame_count_leaves_no_artifact() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("excess.ptra");

        let records = [(0.0, 1), (0.0, 2), (1.0, 1), (1.0, 2)]
            .into_iter()
            .map(|(t, id)| ParticleRecord {
                id: ParticleId(id),
                t: SimTime::new(t).unwrap(),
                position: [t; 3],
                velocity: [0.0; 3],
            })
            .collect();
        let traj = Trajectory::from_records(records).unwrap();
        let available = traj.index().frame_count();

        let mut recorder =
            AnimationRecorder::create(&path, traj.index().ids(), RecorderConfig::default())
                .unwrap();
        let mut driver = AnimationDriver::new(traj.frames()).with_frame_count(Some(available + 2));
        let err = driver
            .run(&mut recorder, FinalAction::Persist { path: path.clone() })
            .unwrap_err();

        assert!(matches!(
            err,
            DriverError::Frame(FrameError::IndexOutOfRange(IndexOutOfRangeError {
                index: 2,
                frame_count: 2,
            }))
        ));
        assert_eq!(recorder.frames_written(), available as u64);
        assert!(!path.exists());
        assert!(!recorder.staging_path().exists());
    }
}
