//! The raster storage driver seam.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tile_common::{DatasetKey, GeoBounds, MaskedGrid, TileCoord, TileResult};

/// Metadata for one stored dataset (one section of a logical product).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetMetadata {
    /// Geographic bounds of the dataset in WGS84.
    pub bounds: GeoBounds,
    /// Native pixel dimensions of the dataset.
    pub native_width: usize,
    pub native_height: usize,
    /// Valid time of the measurement, when the source carries one.
    pub valid_time: Option<DateTime<Utc>>,
}

/// Options for a tile read.
#[derive(Debug, Clone, Copy, Default)]
pub struct TileReadOptions {
    /// Preserve exact stored values instead of resampling smoothly.
    pub preserve_values: bool,
}

/// A scoped storage session.
///
/// Acquired once per tile request and released on every exit path when the
/// session is dropped. Drivers that pool connections return the pooled
/// handle here.
#[async_trait]
pub trait DriverSession: Send + Sync {
    /// Fetch metadata for a dataset. Fails with
    /// [`tile_common::TileError::DatasetNotFound`] when the key has no
    /// dataset.
    async fn get_metadata(&self, key: &DatasetKey) -> TileResult<DatasetMetadata>;

    /// Read the pixel data of one tile as a masked grid.
    ///
    /// The returned grid is `tile_height x tile_width` at the dataset's
    /// native resolution for that tile region; pixels outside the dataset
    /// are masked.
    async fn get_tile_data(
        &self,
        key: &DatasetKey,
        tile: &TileCoord,
        tile_size: (usize, usize),
        options: TileReadOptions,
    ) -> TileResult<MaskedGrid>;

    /// Read a fixed-size overview of the whole dataset.
    async fn get_preview_data(
        &self,
        key: &DatasetKey,
        size: (usize, usize),
    ) -> TileResult<MaskedGrid>;
}

/// A raster storage driver.
#[async_trait]
pub trait RasterDriver: Send + Sync {
    /// Names of the key fields this driver addresses datasets by, in order.
    fn key_names(&self) -> &[&'static str];

    /// Open a scoped session.
    async fn connect(&self) -> TileResult<Box<dyn DriverSession + '_>>;
}
