//! Integration tests for HPFA crates.
//!
//! [`memory`] provides a small in-memory raster backend; the tests below run
//! resolved plans through it end to end.

pub mod memory;

pub use memory::{MemoryRasters, Raster};
