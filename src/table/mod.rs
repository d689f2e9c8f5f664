//! Table module - Parsing delimited snapshot logs.

mod loader;

pub use loader::*;
