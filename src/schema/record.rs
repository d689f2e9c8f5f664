//! Snapshot record types.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Stable particle identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParticleId(pub u64);

impl fmt::Display for ParticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Simulation time of a snapshot.
///
/// Always finite. `-0.0` is stored as `0.0` so that equality, ordering and
/// hashing agree.
#[derive(Debug, Clone, Copy)]
pub struct SimTime(f64);

impl SimTime {
    /// Wrap a raw time value, rejecting NaN and infinities.
    pub fn new(t: f64) -> Option<Self> {
        if !t.is_finite() {
            return None;
        }
        // Collapses -0.0 onto 0.0.
        Some(Self(t + 0.0))
    }

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for SimTime {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for SimTime {}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for SimTime {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One observation of a single particle at a single time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleRecord {
    /// Particle identifier.
    pub id: ParticleId,
    /// Simulation time.
    pub t: SimTime,
    /// Position (rx, ry, rz).
    pub position: [f64; 3],
    /// Velocity (vx, vy, vz).
    pub velocity: [f64; 3],
}

impl ParticleRecord {
    /// Lookup key for the keyed index.
    #[inline]
    pub fn key(&self) -> (ParticleId, SimTime) {
        (self.id, self.t)
    }
}
