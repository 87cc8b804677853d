//! Common types shared across the weather-tiles services.

pub mod bounds;
pub mod error;
pub mod grid;
pub mod key;
pub mod tile;

pub use bounds::GeoBounds;
pub use error::{TileError, TileResult};
pub use grid::MaskedGrid;
pub use key::DatasetKey;
pub use tile::{tile_bounds, tile_intersects, TileCoord};
