//! Slippy-map tile coordinates and tile/bounds intersection.

use serde::{Deserialize, Serialize};

use crate::bounds::GeoBounds;
use crate::error::{TileError, TileResult};

/// A tile coordinate (z/x/y) in the standard XYZ tiling scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    /// Zoom level
    pub z: u32,
    /// Column (x)
    pub x: u32,
    /// Row (y)
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Validate `0 <= x,y < 2^z`.
    pub fn validate(&self) -> TileResult<()> {
        if self.z >= 32 {
            return Err(TileError::Validation(format!(
                "zoom level {} out of range",
                self.z
            )));
        }
        let n = 1u64 << self.z;
        if (self.x as u64) >= n || (self.y as u64) >= n {
            return Err(TileError::Validation(format!(
                "tile {}/{}/{} outside the zoom-{} grid",
                self.z, self.x, self.y, self.z
            )));
        }
        Ok(())
    }
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Calculate the WGS84 bounding box of a tile.
pub fn tile_bounds(coord: &TileCoord) -> GeoBounds {
    let n = 2u32.pow(coord.z) as f64;

    let lon_min = coord.x as f64 / n * 360.0 - 180.0;
    let lon_max = (coord.x + 1) as f64 / n * 360.0 - 180.0;

    let lat_max = (std::f64::consts::PI * (1.0 - 2.0 * coord.y as f64 / n))
        .sinh()
        .atan()
        .to_degrees();
    let lat_min = (std::f64::consts::PI * (1.0 - 2.0 * (coord.y + 1) as f64 / n))
        .sinh()
        .atan()
        .to_degrees();

    GeoBounds::new(lon_min, lat_min, lon_max, lat_max)
}

/// Check whether a tile's geographic envelope intersects dataset bounds.
pub fn tile_intersects(bounds: &GeoBounds, coord: &TileCoord) -> bool {
    tile_bounds(coord).intersects(bounds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_bounds_zoom_zero() {
        let bbox = tile_bounds(&TileCoord::new(0, 0, 0));
        assert!((bbox.min_lon - (-180.0)).abs() < 0.001);
        assert!((bbox.max_lon - 180.0).abs() < 0.001);
        // Web Mercator latitude limits
        assert!((bbox.max_lat - 85.0511).abs() < 0.001);
        assert!((bbox.min_lat - (-85.0511)).abs() < 0.001);
    }

    #[test]
    fn test_tile_bounds_quadrant() {
        // Tile (1,0,0) covers the north-west quadrant
        let bbox = tile_bounds(&TileCoord::new(1, 0, 0));
        assert!((bbox.min_lon - (-180.0)).abs() < 0.001);
        assert!((bbox.max_lon - 0.0).abs() < 0.001);
        assert!(bbox.min_lat.abs() < 0.001);
        assert!(bbox.max_lat > 85.0);
    }

    #[test]
    fn test_tile_intersects_inside() {
        // Dataset covering Japan; zoom-5 tile over Tokyo intersects
        let bounds = GeoBounds::new(128.0, 30.0, 146.0, 46.0);
        assert!(tile_intersects(&bounds, &TileCoord::new(5, 28, 12)));
        // A tile over the Atlantic does not
        assert!(!tile_intersects(&bounds, &TileCoord::new(5, 15, 12)));
    }

    #[test]
    fn test_tile_intersects_whole_world() {
        let bounds = GeoBounds::default();
        assert!(tile_intersects(&bounds, &TileCoord::new(0, 0, 0)));
        assert!(tile_intersects(&bounds, &TileCoord::new(8, 200, 100)));
    }

    #[test]
    fn test_validate() {
        assert!(TileCoord::new(3, 7, 7).validate().is_ok());
        assert!(TileCoord::new(3, 8, 0).validate().is_err());
        assert!(TileCoord::new(0, 0, 1).validate().is_err());
    }
}
