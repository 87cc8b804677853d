//! Application state and shared resources.

use std::sync::Arc;

use anyhow::Result;

use compositor::{CompositorConfig, DataKindRegistry, TileCompositor};
use storage::{DatasetMetadata, MemoryDataset, MemoryDriver, RasterDriver};
use tile_common::{DatasetKey, GeoBounds, MaskedGrid};

/// Shared application state.
pub struct AppState {
    pub compositor: TileCompositor,
}

impl AppState {
    /// Build state from environment configuration.
    ///
    /// The raster driver is the seam for the COG-backed storage layer;
    /// until that driver is wired in, the service runs against the
    /// in-memory driver seeded with demo datasets.
    pub fn new() -> Result<Self> {
        let config = CompositorConfig::from_env();
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid compositor config: {}", e))?;

        let registry = DataKindRegistry::with_builtin_kinds()?;
        let driver: Arc<dyn RasterDriver> = Arc::new(demo_driver());

        let compositor = TileCompositor::new(driver, registry, config)?;
        Ok(Self { compositor })
    }
}

/// In-memory driver seeded with synthetic sections over Japan.
fn demo_driver() -> MemoryDriver {
    let mut driver = MemoryDriver::with_default_keys();

    let west = GeoBounds::new(128.0, 30.0, 137.0, 46.0);
    let east = GeoBounds::new(137.0, 30.0, 146.0, 46.0);

    for (product, value) in [("pri60lv", 750.0f32), ("pphw10", 42.0)] {
        for (section_x, bounds) in [("1", west), ("2", east)] {
            let key = DatasetKey::new(vec![
                ("product".into(), product.into()),
                ("section_x".into(), section_x.into()),
                ("section_y".into(), "1".into()),
                ("resolution".into(), "10".into()),
            ]);
            driver.insert(
                &key,
                MemoryDataset::new(
                    DatasetMetadata {
                        bounds,
                        native_width: 256,
                        native_height: 256,
                        valid_time: None,
                    },
                    MaskedGrid::filled(value, 256, 256),
                ),
            );
        }
    }

    driver
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_builds_with_valid_registry() {
        let state = AppState::new().unwrap();
        assert!(state.compositor.registry().get("pri60lv").is_some());
    }
}
