//! Binary format definitions for particle trajectory animation files.

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};

use crate::schema::AxisBounds;

/// Magic bytes identifying a particle trajectory animation file.
pub const ANIMATION_MAGIC: &[u8; 4] = b"PTRA";

/// Current format version.
pub const ANIMATION_VERSION: u16 = 1;

/// Compression type for frame data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum CompressionType {
    /// No compression (raw f64 data).
    #[default]
    None = 0,
    /// LZ4 fast compression.
    Lz4 = 1,
}

impl CompressionType {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(CompressionType::None),
            1 => Some(CompressionType::Lz4),
            _ => None,
        }
    }
}

/// Animation file header flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnimationFlags {
    /// Compression type (lower 4 bits).
    pub compression: CompressionType,
    /// If true, frames carry velocity planes after the position planes.
    pub has_velocity: bool,
}

impl AnimationFlags {
    pub fn to_u16(self) -> u16 {
        let mut flags = self.compression as u16;
        if self.has_velocity {
            flags |= 1 << 4;
        }
        flags
    }

    pub fn from_u16(v: u16) -> Self {
        Self {
            compression: CompressionType::from_u8((v & 0x0F) as u8).unwrap_or_default(),
            has_velocity: (v & (1 << 4)) != 0,
        }
    }

    /// Number of f64 component planes per frame.
    pub fn planes(self) -> usize {
        if self.has_velocity { 6 } else { 3 }
    }
}

/// File header for the particle trajectory animation format.
#[derive(Debug, Clone)]
pub struct AnimationHeader {
    /// Number of particles per frame.
    pub particle_count: u32,
    /// Total number of frames.
    pub frame_count: u64,
    /// Playback rate in frames per second.
    pub frame_rate: f32,
    /// Display bounds, as `[x_min, x_max, y_min, y_max, z_min, z_max]`.
    pub bounds: [f32; 6],
    /// Animation flags.
    pub flags: AnimationFlags,
}

impl AnimationHeader {
    /// Size of header in bytes.
    /// Magic(4) + Version(2) + Flags(2) + ParticleCount(4) + FrameCount(8) +
    /// FrameRate(4) + Bounds(24) + Reserved(8) = 56
    pub const SIZE: usize = 56;

    /// Size of one uncompressed frame in bytes: the time stamp plus every plane.
    pub fn frame_size(&self) -> usize {
        8 + self.particle_count as usize * self.flags.planes() * 8
    }

    /// Size of the id table that follows the header.
    pub fn id_table_size(&self) -> usize {
        self.particle_count as usize * 8
    }

    /// Pack axis bounds into header order.
    pub fn pack_bounds(bounds: &AxisBounds) -> [f32; 6] {
        let mut packed = [0.0f32; 6];
        for (i, (lo, hi)) in bounds.ranges().into_iter().enumerate() {
            packed[2 * i] = lo as f32;
            packed[2 * i + 1] = hi as f32;
        }
        packed
    }

    /// Unpack header bounds.
    pub fn axis_bounds(&self) -> AxisBounds {
        let b = self.bounds.map(f64::from);
        AxisBounds {
            x: (b[0], b[1]),
            y: (b[2], b[3]),
            z: (b[4], b[5]),
        }
    }

    /// Write header to output.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(ANIMATION_MAGIC)?;
        w.write_all(&ANIMATION_VERSION.to_le_bytes())?;
        w.write_all(&self.flags.to_u16().to_le_bytes())?;
        w.write_all(&self.particle_count.to_le_bytes())?;
        w.write_all(&self.frame_count.to_le_bytes())?;
        w.write_all(&self.frame_rate.to_le_bytes())?;
        for b in self.bounds {
            w.write_all(&b.to_le_bytes())?;
        }
        // Reserved bytes
        w.write_all(&[0u8; 8])?;
        Ok(())
    }

    /// Read header from input.
    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)?;
        if &magic != ANIMATION_MAGIC {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Invalid PTRA magic bytes",
            ));
        }

        let mut buf2 = [0u8; 2];
        let mut buf4 = [0u8; 4];
        let mut buf8 = [0u8; 8];

        r.read_exact(&mut buf2)?;
        let version = u16::from_le_bytes(buf2);
        if version != ANIMATION_VERSION {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Unsupported PTRA version: {}", version),
            ));
        }

        r.read_exact(&mut buf2)?;
        let flags = AnimationFlags::from_u16(u16::from_le_bytes(buf2));

        r.read_exact(&mut buf4)?;
        let particle_count = u32::from_le_bytes(buf4);

        r.read_exact(&mut buf8)?;
        let frame_count = u64::from_le_bytes(buf8);

        r.read_exact(&mut buf4)?;
        let frame_rate = f32::from_le_bytes(buf4);

        let mut bounds = [0.0f32; 6];
        for b in &mut bounds {
            r.read_exact(&mut buf4)?;
            *b = f32::from_le_bytes(buf4);
        }

        // Skip reserved bytes
        r.read_exact(&mut buf8)?;

        Ok(Self {
            particle_count,
            frame_count,
            frame_rate,
            bounds,
            flags,
        })
    }
}

/// Index entry for a single frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameIndex {
    /// Byte offset from start of file.
    pub offset: u64,
    /// Compressed size in bytes (equals uncompressed if no compression).
    pub size: u64,
}

impl FrameIndex {
    /// Size of one index entry in bytes.
    pub const SIZE: usize = 16;

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.offset.to_le_bytes())?;
        w.write_all(&self.size.to_le_bytes())?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut buf8 = [0u8; 8];

        r.read_exact(&mut buf8)?;
        let offset = u64::from_le_bytes(buf8);

        r.read_exact(&mut buf8)?;
        let size = u64::from_le_bytes(buf8);

        Ok(Self { offset, size })
    }
}

/// Append f64 values to a byte buffer.
pub fn encode_values(data: &[f64], out: &mut Vec<u8>) {
    out.reserve(data.len() * 8);
    for v in data {
        out.extend_from_slice(&v.to_le_bytes());
    }
}

/// Decode bytes to an f64 slice.
pub fn decode_values(bytes: &[u8], output: &mut [f64]) -> io::Result<()> {
    if bytes.len() != output.len() * 8 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "Frame size mismatch: {} bytes vs {} values",
                bytes.len(),
                output.len()
            ),
        ));
    }
    for (v, b) in output.iter_mut().zip(bytes.chunks_exact(8)) {
        let mut buf8 = [0u8; 8];
        buf8.copy_from_slice(b);
        *v = f64::from_le_bytes(buf8);
    }
    Ok(())
}

/// Compress data using LZ4.
#[cfg(feature = "lz4")]
pub fn compress_lz4(data: &[u8]) -> Vec<u8> {
    lz4_flex::compress_prepend_size(data)
}

/// Decompress LZ4 data.
#[cfg(feature = "lz4")]
pub fn decompress_lz4(data: &[u8]) -> io::Result<Vec<u8>> {
    lz4_flex::decompress_size_prepended(data)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Fallback when LZ4 is not available.
#[cfg(not(feature = "lz4"))]
pub fn compress_lz4(data: &[u8]) -> Vec<u8> {
    data.to_vec()
}

#[cfg(not(feature = "lz4"))]
pub fn decompress_lz4(data: &[u8]) -> io::Result<Vec<u8>> {
    Ok(data.to_vec())
}
