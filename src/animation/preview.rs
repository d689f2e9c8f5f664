//! Text preview sink: summarises each frame and prints a table on display.

use std::io::Write;

use super::driver::{FinalAction, FrameSink, RenderError, SinkReport};
use crate::index::FrameArrays;
use crate::schema::{AxisBounds, SimTime};

/// Summary statistics of one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSummary {
    pub frame: usize,
    pub time: SimTime,
    pub particles: usize,
    /// Mean position.
    pub centroid: [f64; 3],
    /// Particles outside the display bounds.
    pub outside: usize,
    /// Mean speed, when velocities were supplied.
    pub mean_speed: Option<f64>,
}

impl FrameSummary {
    pub fn from_arrays(frame: &FrameArrays, bounds: &AxisBounds) -> Self {
        let n = frame.len();
        let mean = |values: &[f64]| {
            if n == 0 {
                0.0
            } else {
                values.iter().sum::<f64>() / n as f64
            }
        };

        let outside = (0..n)
            .filter_map(|k| frame.position(k))
            .filter(|&p| !bounds.contains(p))
            .count();

        let mean_speed = frame.velocity.as_ref().map(|_| {
            let total: f64 = (0..n).filter_map(|k| frame.speed(k)).sum();
            if n == 0 { 0.0 } else { total / n as f64 }
        });

        Self {
            frame: frame.frame,
            time: frame.time,
            particles: n,
            centroid: [mean(&frame.x), mean(&frame.y), mean(&frame.z)],
            outside,
            mean_speed,
        }
    }
}

/// Sink whose display action writes one summary line per frame to `out`.
pub struct TerminalPreview<W: Write> {
    out: W,
    bounds: AxisBounds,
    summaries: Vec<FrameSummary>,
}

impl<W: Write> TerminalPreview<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            bounds: AxisBounds::default(),
            summaries: Vec::new(),
        }
    }

    /// Summaries collected so far.
    pub fn summaries(&self) -> &[FrameSummary] {
        &self.summaries
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn display(&mut self) -> std::io::Result<()> {
        let [x, y, z] = self.bounds.ranges();
        writeln!(
            self.out,
            "bounds x [{}, {}]  y [{}, {}]  z [{}, {}]",
            x.0, x.1, y.0, y.1, z.0, z.1
        )?;
        writeln!(
            self.out,
            "{:>6} {:>12} {:>6} {:>12} {:>12} {:>12} {:>8} {:>10}",
            "frame", "t", "n", "cx", "cy", "cz", "outside", "speed"
        )?;
        for s in &self.summaries {
            let speed = s
                .mean_speed
                .map_or_else(|| "-".to_string(), |v| format!("{:.4}", v));
            writeln!(
                self.out,
                "{:>6} {:>12.4} {:>6} {:>12.4} {:>12.4} {:>12.4} {:>8} {:>10}",
                s.frame,
                s.time.value(),
                s.particles,
                s.centroid[0],
                s.centroid[1],
                s.centroid[2],
                s.outside,
                speed
            )?;
        }
        self.out.flush()
    }
}

impl<W: Write> FrameSink for TerminalPreview<W> {
    fn set_bounds(&mut self, bounds: &AxisBounds) {
        self.bounds = *bounds;
    }

    fn update(&mut self, frame: &FrameArrays) -> Result<(), RenderError> {
        let summary = FrameSummary::from_arrays(frame, &self.bounds);
        if summary.outside > 0 {
            log::debug!(
                "Frame {}: {} particles outside display bounds",
                summary.frame,
                summary.outside
            );
        }
        self.summaries.push(summary);
        Ok(())
    }

    fn finalize(&mut self, action: &FinalAction) -> Result<SinkReport, RenderError> {
        match action {
            FinalAction::Display => {
                self.display()?;
                Ok(SinkReport::Displayed {
                    frames: self.summaries.len(),
                })
            }
            FinalAction::Persist { .. } => Err(RenderError::UnsupportedAction {
                sink: "TerminalPreview",
                action: action.clone(),
            }),
        }
    }

    fn abort(&mut self) {
        self.summaries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::AnimationDriver;
    use crate::index::VelocityArrays;
    use crate::schema::{ParticleId, ParticleRecord};
    use crate::trajectory::Trajectory;
    use std::path::PathBuf;

    fn arrays() -> FrameArrays {
        FrameArrays {
            frame: 2,
            time: SimTime::new(0.5).unwrap(),
            x: vec![1.0, 3.0, 20.0],
            y: vec![0.0, 0.0, 0.0],
            z: vec![-1.0, 1.0, 0.0],
            velocity: None,
        }
    }

    #[test]
    fn test_summary() {
        let summary = FrameSummary::from_arrays(&arrays(), &AxisBounds::default());
        assert_eq!(summary.particles, 3);
        assert_eq!(summary.centroid, [8.0, 0.0, 0.0]);
        assert_eq!(summary.outside, 1);
        assert!(summary.mean_speed.is_none());
    }

    #[test]
    fn test_summary_speed() {
        let mut frame = arrays();
        frame.velocity = Some(VelocityArrays {
            vx: vec![3.0, 0.0, 1.0],
            vy: vec![4.0, 0.0, 0.0],
            vz: vec![0.0, 2.0, 0.0],
        });
        let summary = FrameSummary::from_arrays(&frame, &AxisBounds::default());
        assert!((summary.mean_speed.unwrap() - 8.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_display_through_driver() {
        let records: Vec<ParticleRecord> = (0..3)
            .flat_map(|t| {
                (1..=2).map(move |id| ParticleRecord {
                    id: ParticleId(id),
                    t: SimTime::new(t as f64).unwrap(),
                    position: [id as f64, t as f64, 0.0],
                    velocity: [0.0; 3],
                })
            })
            .collect();
        let traj = Trajectory::from_records(records).unwrap();

        let mut preview = TerminalPreview::new(Vec::new());
        let mut driver = AnimationDriver::new(traj.frames());
        let summary = driver.run(&mut preview, FinalAction::Display).unwrap();

        assert!(matches!(summary.report, SinkReport::Displayed { frames: 3 }));
        assert_eq!(preview.summaries()[1].centroid, [1.5, 1.0, 0.0]);

        let text = String::from_utf8(preview.into_inner()).unwrap();
        // Bounds line, column header, one line per frame.
        assert_eq!(text.lines().count(), 5);
        assert!(text.lines().nth(1).unwrap().contains("frame"));
    }

    #[test]
    fn test_preview_cannot_persist() {
        let mut preview = TerminalPreview::new(Vec::new());
        let action = FinalAction::Persist {
            path: PathBuf::from("x.ptra"),
        };
        assert!(matches!(
            preview.finalize(&action),
            Err(RenderError::UnsupportedAction { .. })
        ));
    }
}
