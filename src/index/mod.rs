//! Index module - Keyed addressing of snapshots and frame assembly.

mod frame;
mod indexer;

pub use frame::*;
pub use indexer::*;
