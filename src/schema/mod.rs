//! Schema module - Snapshot records and run configuration.

mod config;
mod record;

pub use config::*;
pub use record::*;
