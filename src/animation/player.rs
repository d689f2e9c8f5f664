//! Animation player for reading back recorded trajectories.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use super::format::{AnimationHeader, CompressionType, FrameIndex, decode_values, decompress_lz4};
use crate::index::{FrameArrays, VelocityArrays};
use crate::schema::{AxisBounds, ParticleId, SimTime};

/// Animation player for reading recorded `.ptra` files.
///
/// Usage:
/// ```ignore
/// let mut player = AnimationPlayer::open("trajectory.ptra")?;
/// println!("Animation has {} frames", player.frame_count());
///
/// // Read specific frame
/// let frame = player.read_frame(100)?;
///
/// // Or iterate through all frames
/// for frame_result in player.frames() {
///     let frame = frame_result?;
///     // Use frame...
/// }
/// ```
pub struct AnimationPlayer {
    reader: BufReader<File>,
    header: AnimationHeader,
    ids: Vec<ParticleId>,
    frame_indices: Vec<FrameIndex>,
}

impl AnimationPlayer {
    /// Open an animation file for playback.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let header = AnimationHeader::read_from(&mut reader)?;
        let file_len = reader.seek(SeekFrom::End(0))?;

        // Id table follows the header; the frame index table sits at the end.
        let data_start = (AnimationHeader::SIZE as u64)
            .checked_add(header.id_table_size() as u64)
            .filter(|&start| start <= file_len)
            .ok_or_else(|| invalid_data("Truncated PTRA id table"))?;
        let index_start = header
            .frame_count
            .checked_mul(FrameIndex::SIZE as u64)
            .and_then(|table_size| file_len.checked_sub(table_size))
            .filter(|&start| start >= data_start)
            .ok_or_else(|| invalid_data("Truncated PTRA frame index"))?;

        reader.seek(SeekFrom::Start(AnimationHeader::SIZE as u64))?;
        let mut ids = Vec::with_capacity(header.particle_count as usize);
        let mut buf8 = [0u8; 8];
        for _ in 0..header.particle_count {
            reader.read_exact(&mut buf8)?;
            ids.push(ParticleId(u64::from_le_bytes(buf8)));
        }

        reader.seek(SeekFrom::Start(index_start))?;

        let mut frame_indices = Vec::with_capacity(header.frame_count as usize);
        for _ in 0..header.frame_count {
            let index = FrameIndex::read_from(&mut reader)?;
            let in_bounds = index.offset >= data_start
                && index
                    .offset
                    .checked_add(index.size)
                    .is_some_and(|end| end <= index_start);
            if !in_bounds {
                return Err(invalid_data("PTRA frame index entry outside frame data"));
            }
            frame_indices.push(index);
        }

        Ok(Self {
            reader,
            header,
            ids,
            frame_indices,
        })
    }

    /// Get animation header.
    pub fn header(&self) -> &AnimationHeader {
        &self.header
    }

    /// Particle ids in array order.
    pub fn ids(&self) -> &[ParticleId] {
        &self.ids
    }

    /// Get total number of frames.
    pub fn frame_count(&self) -> u64 {
        self.header.frame_count
    }

    pub fn particle_count(&self) -> usize {
        self.header.particle_count as usize
    }

    pub fn has_velocity(&self) -> bool {
        self.header.flags.has_velocity
    }

    pub fn frame_rate(&self) -> f32 {
        self.header.frame_rate
    }

    pub fn axis_bounds(&self) -> AxisBounds {
        self.header.axis_bounds()
    }

    /// Read a specific frame by index.
    pub fn read_frame(&mut self, frame_index: u64) -> io::Result<FrameArrays> {
        if frame_index >= self.header.frame_count {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "Frame index {} out of range ({} frames)",
                    frame_index, self.header.frame_count
                ),
            ));
        }

        let index = self.frame_indices[frame_index as usize];
        self.reader.seek(SeekFrom::Start(index.offset))?;

        let mut data = vec![0u8; index.size as usize];
        self.reader.read_exact(&mut data)?;

        let raw_data = match self.header.flags.compression {
            CompressionType::None => data,
            CompressionType::Lz4 => decompress_lz4(&data)?,
        };

        self.decode_frame(frame_index as usize, &raw_data)
    }

    /// Decode raw bytes into per-axis arrays.
    fn decode_frame(&self, frame: usize, raw_data: &[u8]) -> io::Result<FrameArrays> {
        if raw_data.len() != self.header.frame_size() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Frame {} is {} bytes, expected {}",
                    frame,
                    raw_data.len(),
                    self.header.frame_size()
                ),
            ));
        }

        let (time_bytes, planes_bytes) = raw_data.split_at(8);
        let mut time = [0.0f64; 1];
        decode_values(time_bytes, &mut time)?;
        let time = SimTime::new(time[0]).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidData, "Non-finite frame time")
        })?;

        let n = self.particle_count();
        let plane_bytes = n * 8;
        let mut planes = (0..self.header.flags.planes())
            .map(|p| {
                let mut plane = vec![0.0f64; n];
                decode_values(&planes_bytes[p * plane_bytes..(p + 1) * plane_bytes], &mut plane)?;
                Ok(plane)
            })
            .collect::<io::Result<Vec<_>>>()?
            .into_iter();

        let mut next = || planes.next().unwrap_or_default();
        let (x, y, z) = (next(), next(), next());
        let velocity = self.has_velocity().then(|| VelocityArrays {
            vx: next(),
            vy: next(),
            vz: next(),
        });

        Ok(FrameArrays {
            frame,
            time,
            x,
            y,
            z,
            velocity,
        })
    }

    /// Create an iterator over all frames.
    pub fn frames(&mut self) -> FrameIterator<'_> {
        FrameIterator {
            player: self,
            current: 0,
        }
    }
}

/// Iterator over animation frames.
pub struct FrameIterator<'a> {
    player: &'a mut AnimationPlayer,
    current: u64,
}

impl<'a> Iterator for FrameIterator<'a> {
    type Item = io::Result<FrameArrays>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.player.frame_count() {
            return None;
        }

        let result = self.player.read_frame(self.current);
        self.current += 1;
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.player.frame_count() - self.current) as usize;
        (remaining, Some(remaining))
    }
}

impl<'a> ExactSizeIterator for FrameIterator<'a> {}

fn invalid_data(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}
