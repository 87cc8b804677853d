//! In-memory raster driver for tests and local demos.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use tile_common::{tile_bounds, DatasetKey, MaskedGrid, TileCoord, TileError, TileResult};

use crate::driver::{DatasetMetadata, DriverSession, RasterDriver, TileReadOptions};

/// One dataset held in memory: metadata plus its full-extent grid.
#[derive(Debug, Clone)]
pub struct MemoryDataset {
    pub metadata: DatasetMetadata,
    /// Full dataset grid, row 0 at the northern edge.
    pub grid: MaskedGrid,
    /// Simulated read latency, for fetch-ordering tests.
    pub read_latency: Option<Duration>,
    /// Make tile reads fail, for partial-failure tests.
    pub fail_tile_reads: bool,
}

impl MemoryDataset {
    pub fn new(metadata: DatasetMetadata, grid: MaskedGrid) -> Self {
        Self {
            metadata,
            grid,
            read_latency: None,
            fail_tile_reads: false,
        }
    }

    pub fn with_read_latency(mut self, latency: Duration) -> Self {
        self.read_latency = Some(latency);
        self
    }

    pub fn with_failing_reads(mut self) -> Self {
        self.fail_tile_reads = true;
        self
    }
}

/// HashMap-backed driver addressing datasets by the standard key fields.
pub struct MemoryDriver {
    key_names: Vec<&'static str>,
    datasets: HashMap<String, MemoryDataset>,
}

impl MemoryDriver {
    pub fn new(key_names: Vec<&'static str>) -> Self {
        Self {
            key_names,
            datasets: HashMap::new(),
        }
    }

    /// Driver with the standard product key schema.
    pub fn with_default_keys() -> Self {
        Self::new(vec!["product", "section_x", "section_y", "resolution"])
    }

    pub fn insert(&mut self, key: &DatasetKey, dataset: MemoryDataset) {
        self.datasets.insert(key.to_string(), dataset);
    }

    fn lookup(&self, key: &DatasetKey) -> TileResult<&MemoryDataset> {
        self.datasets
            .get(&key.to_string())
            .ok_or_else(|| TileError::DatasetNotFound(key.to_string()))
    }

    /// Sample the dataset grid over a geographic window by nearest neighbor.
    fn sample_window(
        dataset: &MemoryDataset,
        window: &tile_common::GeoBounds,
        out_width: usize,
        out_height: usize,
    ) -> MaskedGrid {
        let bounds = &dataset.metadata.bounds;
        let grid = &dataset.grid;
        let mut out = MaskedGrid::fully_masked(out_width, out_height);

        for row in 0..out_height {
            // Pixel centers, north at row 0.
            let lat = window.max_lat
                - (row as f64 + 0.5) / out_height as f64 * (window.max_lat - window.min_lat);
            for col in 0..out_width {
                let lon = window.min_lon
                    + (col as f64 + 0.5) / out_width as f64 * (window.max_lon - window.min_lon);

                if !bounds.contains(lon, lat) {
                    continue;
                }

                let src_col = ((lon - bounds.min_lon) / bounds.width()
                    * grid.width as f64)
                    .floor()
                    .min(grid.width as f64 - 1.0) as usize;
                let src_row = ((bounds.max_lat - lat) / bounds.height()
                    * grid.height as f64)
                    .floor()
                    .min(grid.height as f64 - 1.0) as usize;

                if let Some(value) = grid.get(src_col, src_row) {
                    out.set(col, row, value);
                }
            }
        }

        out
    }
}

#[async_trait]
impl RasterDriver for MemoryDriver {
    fn key_names(&self) -> &[&'static str] {
        &self.key_names
    }

    async fn connect(&self) -> TileResult<Box<dyn DriverSession + '_>> {
        Ok(Box::new(MemorySession { driver: self }))
    }
}

struct MemorySession<'a> {
    driver: &'a MemoryDriver,
}

#[async_trait]
impl DriverSession for MemorySession<'_> {
    async fn get_metadata(&self, key: &DatasetKey) -> TileResult<DatasetMetadata> {
        Ok(self.driver.lookup(key)?.metadata.clone())
    }

    async fn get_tile_data(
        &self,
        key: &DatasetKey,
        tile: &TileCoord,
        tile_size: (usize, usize),
        _options: TileReadOptions,
    ) -> TileResult<MaskedGrid> {
        let dataset = self.driver.lookup(key)?;

        if let Some(latency) = dataset.read_latency {
            tokio::time::sleep(latency).await;
        }
        if dataset.fail_tile_reads {
            return Err(TileError::FetchFailure {
                key: key.to_string(),
                message: "simulated read failure".to_string(),
            });
        }

        let window = tile_bounds(tile);
        Ok(MemoryDriver::sample_window(
            dataset,
            &window,
            tile_size.0,
            tile_size.1,
        ))
    }

    async fn get_preview_data(
        &self,
        key: &DatasetKey,
        size: (usize, usize),
    ) -> TileResult<MaskedGrid> {
        let dataset = self.driver.lookup(key)?;

        if let Some(latency) = dataset.read_latency {
            tokio::time::sleep(latency).await;
        }
        if dataset.fail_tile_reads {
            return Err(TileError::FetchFailure {
                key: key.to_string(),
                message: "simulated read failure".to_string(),
            });
        }

        let window = dataset.metadata.bounds;
        Ok(MemoryDriver::sample_window(dataset, &window, size.0, size.1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tile_common::GeoBounds;

    fn world_dataset(value: f32) -> MemoryDataset {
        let bounds = GeoBounds::default();
        MemoryDataset::new(
            DatasetMetadata {
                bounds,
                native_width: 64,
                native_height: 32,
                valid_time: None,
            },
            MaskedGrid::filled(value, 64, 32),
        )
    }

    fn key(product: &str, x: &str, y: &str) -> DatasetKey {
        DatasetKey::new(vec![
            ("product".into(), product.into()),
            ("section_x".into(), x.into()),
            ("section_y".into(), y.into()),
        ])
    }

    #[tokio::test]
    async fn test_metadata_roundtrip() {
        let mut driver = MemoryDriver::new(vec!["product", "section_x", "section_y"]);
        driver.insert(&key("p", "1", "1"), world_dataset(2.0));

        let session = driver.connect().await.unwrap();
        let metadata = session.get_metadata(&key("p", "1", "1")).await.unwrap();
        assert_eq!(metadata.native_width, 64);

        let missing = session.get_metadata(&key("p", "9", "9")).await;
        assert!(matches!(missing, Err(TileError::DatasetNotFound(_))));
    }

    #[tokio::test]
    async fn test_tile_read_covers_world_dataset() {
        let mut driver = MemoryDriver::new(vec!["product", "section_x", "section_y"]);
        driver.insert(&key("p", "1", "1"), world_dataset(5.0));

        let session = driver.connect().await.unwrap();
        let grid = session
            .get_tile_data(
                &key("p", "1", "1"),
                &TileCoord::new(2, 1, 1),
                (16, 16),
                TileReadOptions::default(),
            )
            .await
            .unwrap();

        assert_eq!(grid.width, 16);
        assert!(grid.has_coverage());
        assert_eq!(grid.get(8, 8), Some(5.0));
    }

    #[tokio::test]
    async fn test_tile_read_masks_outside_bounds() {
        let mut driver = MemoryDriver::new(vec!["product", "section_x", "section_y"]);
        let mut dataset = world_dataset(1.0);
        // Shrink coverage to the eastern hemisphere
        dataset.metadata.bounds = GeoBounds::new(0.0, -85.0, 180.0, 85.0);
        driver.insert(&key("p", "1", "1"), dataset);

        let session = driver.connect().await.unwrap();
        // Zoom-1 tile over the western hemisphere
        let grid = session
            .get_tile_data(
                &key("p", "1", "1"),
                &TileCoord::new(1, 0, 0),
                (8, 8),
                TileReadOptions::default(),
            )
            .await
            .unwrap();
        assert!(!grid.has_coverage());
    }

    #[tokio::test]
    async fn test_failing_reads() {
        let mut driver = MemoryDriver::new(vec!["product", "section_x", "section_y"]);
        driver.insert(&key("p", "1", "1"), world_dataset(1.0).with_failing_reads());

        let session = driver.connect().await.unwrap();
        let result = session
            .get_tile_data(
                &key("p", "1", "1"),
                &TileCoord::new(0, 0, 0),
                (4, 4),
                TileReadOptions::default(),
            )
            .await;
        assert!(matches!(result, Err(TileError::FetchFailure { .. })));
    }
}
