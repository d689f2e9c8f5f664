//! Keyed index over snapshot records.
//!
//! Frames are addressed by `(id, time)` lookup, never by slicing the row
//! sequence into fixed-size blocks. Blocks silently shift as soon as one time
//! step is missing a particle or the table is not sorted.

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};

use crate::schema::{ParticleId, ParticleRecord, SimTime};

/// Two rows describe the same particle at the same time.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error(
    "Duplicate snapshot for particle {id} at time {time} (data rows {first_row} and {duplicate_row})"
)]
pub struct DuplicateKeyError {
    pub id: ParticleId,
    pub time: SimTime,
    /// 1-based data row of the first occurrence.
    pub first_row: usize,
    /// 1-based data row of the repeated occurrence.
    pub duplicate_row: usize,
}

/// Sorted time and id indices plus the `(id, time)` lookup.
#[derive(Debug, Clone, Default)]
pub struct TrajectoryIndex {
    times: Vec<SimTime>,
    ids: Vec<ParticleId>,
    lookup: HashMap<(ParticleId, SimTime), usize>,
}

impl TrajectoryIndex {
    /// Build the index with a single pass over `records`.
    pub fn build(records: &[ParticleRecord]) -> Result<Self, DuplicateKeyError> {
        let mut lookup = HashMap::with_capacity(records.len());
        let mut times = BTreeSet::new();
        let mut ids = BTreeSet::new();

        for (row, record) in records.iter().enumerate() {
            match lookup.entry(record.key()) {
                Entry::Occupied(existing) => {
                    return Err(DuplicateKeyError {
                        id: record.id,
                        time: record.t,
                        first_row: *existing.get() + 1,
                        duplicate_row: row + 1,
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(row);
                }
            }
            times.insert(record.t);
            ids.insert(record.id);
        }

        let index = Self {
            times: times.into_iter().collect(),
            ids: ids.into_iter().collect(),
            lookup,
        };
        log::info!(
            "Indexed {} snapshots: {} times x {} particles",
            records.len(),
            index.times.len(),
            index.ids.len()
        );
        Ok(index)
    }

    /// Distinct times in ascending order. Frame `i` is `times()[i]`.
    pub fn times(&self) -> &[SimTime] {
        &self.times
    }

    /// Distinct particle ids in ascending order.
    pub fn ids(&self) -> &[ParticleId] {
        &self.ids
    }

    /// Number of frames available (distinct times).
    pub fn frame_count(&self) -> usize {
        self.times.len()
    }

    /// Number of distinct particles.
    pub fn particle_count(&self) -> usize {
        self.ids.len()
    }

    /// Time of frame `frame`, if it exists.
    pub fn time_of(&self, frame: usize) -> Option<SimTime> {
        self.times.get(frame).copied()
    }

    /// Row position of the snapshot for `(id, time)`.
    pub fn position(&self, id: ParticleId, time: SimTime) -> Option<usize> {
        self.lookup.get(&(id, time)).copied()
    }

    /// Snapshot for `(id, time)` in `records`, the slice this index was built from.
    pub fn lookup<'a>(
        &self,
        records: &'a [ParticleRecord],
        id: ParticleId,
        time: SimTime,
    ) -> Option<&'a ParticleRecord> {
        self.position(id, time).and_then(|pos| records.get(pos))
    }

    /// Total number of indexed snapshots.
    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }

    /// Every `(id, time)` pair on the full grid with no snapshot, in frame order.
    pub fn missing_pairs(&self) -> Vec<(ParticleId, SimTime)> {
        if self.lookup.len() == self.times.len() * self.ids.len() {
            return Vec::new();
        }
        self.times
            .iter()
            .flat_map(|&t| self.ids.iter().map(move |&id| (id, t)))
            .filter(|key| !self.lookup.contains_key(key))
            .collect()
    }
}
