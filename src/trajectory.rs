//! Loaded snapshot log together with its index.

use std::path::Path;

use crate::index::{DuplicateKeyError, FrameBuilder, TrajectoryIndex};
use crate::schema::{ParticleId, ParticleRecord, SimTime};
use crate::table::{ParseError, TableLoader};

/// Errors raised while loading and indexing a snapshot log.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    DuplicateKey(#[from] DuplicateKeyError),
}

/// Run context: every snapshot record plus the index over them.
///
/// Built once and never mutated; frames borrow from it.
#[derive(Debug, Clone)]
pub struct Trajectory {
    records: Vec<ParticleRecord>,
    index: TrajectoryIndex,
}

impl Trajectory {
    /// Index an already-loaded record collection.
    pub fn from_records(records: Vec<ParticleRecord>) -> Result<Self, DuplicateKeyError> {
        let index = TrajectoryIndex::build(&records)?;
        Ok(Self { records, index })
    }

    /// Load and index a snapshot table.
    pub fn load<P: AsRef<Path>>(path: P, loader: &TableLoader) -> Result<Self, Error> {
        let records = loader.load(path)?;
        Ok(Self::from_records(records)?)
    }

    pub fn records(&self) -> &[ParticleRecord] {
        &self.records
    }

    pub fn index(&self) -> &TrajectoryIndex {
        &self.index
    }

    /// Snapshot of particle `id` at time `t`.
    pub fn lookup(&self, id: ParticleId, t: SimTime) -> Option<&ParticleRecord> {
        self.index.lookup(&self.records, id, t)
    }

    /// Frame builder borrowing this trajectory.
    pub fn frames(&self) -> FrameBuilder<'_> {
        FrameBuilder::new(&self.records, &self.index)
    }
}
