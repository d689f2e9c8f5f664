//! Configuration types for trajectory rendering runs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::animation::CompressionType;

fn default_frame_rate() -> f32 {
    30.0
}

fn default_delimiter() -> char {
    '\t'
}

/// Top-level run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Snapshot table to load.
    pub input_path: PathBuf,
    /// Number of frames to render. `None` renders one frame per distinct time.
    #[serde(default)]
    pub frame_count: Option<usize>,
    /// Display bounds for the three spatial axes.
    #[serde(default)]
    pub axis_bounds: AxisBounds,
    /// Export destination. `None` displays the animation instead.
    #[serde(default)]
    pub output_path: Option<PathBuf>,
    /// Carry velocity components alongside positions.
    #[serde(default)]
    pub include_velocity: bool,
    /// Playback rate stored in exported animations.
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f32,
    /// Field delimiter of the input table.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Frame compression for exported animations.
    #[serde(default)]
    pub compression: CompressionType,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("output.tsv"),
            frame_count: None,
            axis_bounds: AxisBounds::default(),
            output_path: Some(PathBuf::from("trajectory.ptra")),
            include_velocity: false,
            frame_rate: default_frame_rate(),
            delimiter: default_delimiter(),
            compression: CompressionType::None,
        }
    }
}

/// Display range for each spatial axis, as `(min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisBounds {
    pub x: (f64, f64),
    pub y: (f64, f64),
    pub z: (f64, f64),
}

impl Default for AxisBounds {
    fn default() -> Self {
        Self {
            x: (-6.0, 6.0),
            y: (-6.0, 6.0),
            z: (-12.0, 12.0),
        }
    }
}

impl AxisBounds {
    /// Ranges in axis order.
    pub fn ranges(&self) -> [(f64, f64); 3] {
        [self.x, self.y, self.z]
    }

    /// Check whether a point lies inside all three ranges (inclusive).
    pub fn contains(&self, point: [f64; 3]) -> bool {
        self.ranges()
            .iter()
            .zip(point)
            .all(|(&(lo, hi), v)| v >= lo && v <= hi)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (axis, (lo, hi)) in ['x', 'y', 'z'].into_iter().zip(self.ranges()) {
            if !(lo.is_finite() && hi.is_finite() && lo < hi) {
                return Err(ConfigError::InvalidAxisBounds { axis, min: lo, max: hi });
            }
        }
        Ok(())
    }
}

impl ViewerConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.axis_bounds.validate()?;
        if self.frame_count == Some(0) {
            return Err(ConfigError::InvalidFrameCount);
        }
        if !(self.frame_rate > 0.0 && self.frame_rate.is_finite()) {
            return Err(ConfigError::InvalidFrameRate(self.frame_rate));
        }
        ascii_delimiter(self.delimiter)?;
        Ok(())
    }

    /// Delimiter as the single byte the table reader expects.
    pub fn delimiter_byte(&self) -> u8 {
        // validate() guarantees ASCII; anything else falls back to tab.
        ascii_delimiter(self.delimiter).unwrap_or(b'\t')
    }
}

/// Convert a delimiter character to the single byte the table reader splits on.
///
/// Only ASCII is accepted: a Latin-1 character fits in a `u8` but is encoded
/// as two bytes in UTF-8 input.
pub fn ascii_delimiter(c: char) -> Result<u8, ConfigError> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(ConfigError::InvalidDelimiter(c))
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Axis {axis} bounds [{min}, {max}] must be finite with min < max")]
    InvalidAxisBounds { axis: char, min: f64, max: f64 },
    #[error("Frame count must be non-zero")]
    InvalidFrameCount,
    #[error("Frame rate must be positive, got {0}")]
    InvalidFrameRate(f32),
    #[error("Delimiter {0:?} is not a single ASCII character")]
    InvalidDelimiter(char),
}
