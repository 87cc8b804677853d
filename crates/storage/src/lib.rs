//! Storage abstractions for the weather-tiles services.
//!
//! The compositor consumes raster data through the [`RasterDriver`] seam;
//! the concrete COG-backed driver lives behind it. An in-memory driver is
//! provided for tests and local demos.

pub mod driver;
pub mod memory;

pub use driver::{DatasetMetadata, DriverSession, RasterDriver, TileReadOptions};
pub use memory::{MemoryDataset, MemoryDriver};
