//! Geographic bounding boxes in WGS84 degrees.

use serde::{Deserialize, Serialize};

use crate::error::{TileError, TileResult};

/// An axis-aligned geographic rectangle in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GeoBounds {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Validate the min <= max invariant on both axes.
    pub fn validate(&self) -> TileResult<()> {
        if self.min_lon > self.max_lon || self.min_lat > self.max_lat {
            return Err(TileError::Validation(format!(
                "malformed bounds: ({}, {}, {}, {})",
                self.min_lon, self.min_lat, self.max_lon, self.max_lat
            )));
        }
        Ok(())
    }

    /// Width of the bounding box in degrees.
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Height of the bounding box in degrees.
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Check if this box intersects another. Touching edges count.
    pub fn intersects(&self, other: &GeoBounds) -> bool {
        !(self.max_lon < other.min_lon
            || self.min_lon > other.max_lon
            || self.max_lat < other.min_lat
            || self.min_lat > other.max_lat)
    }

    /// Check if a point is contained within this box.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }
}

impl Default for GeoBounds {
    fn default() -> Self {
        // Global coverage
        Self::new(-180.0, -90.0, 180.0, 90.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersects_overlap() {
        let a = GeoBounds::new(0.0, 0.0, 10.0, 10.0);
        let b = GeoBounds::new(5.0, 5.0, 15.0, 15.0);
        let c = GeoBounds::new(20.0, 20.0, 30.0, 30.0);

        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_intersects_touching_edge() {
        let a = GeoBounds::new(0.0, 0.0, 10.0, 10.0);
        let b = GeoBounds::new(10.0, 0.0, 20.0, 10.0);

        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn test_intersects_containment() {
        let outer = GeoBounds::new(-180.0, -90.0, 180.0, 90.0);
        let inner = GeoBounds::new(130.0, 30.0, 140.0, 40.0);

        assert!(outer.intersects(&inner));
        assert!(inner.intersects(&outer));
    }

    #[test]
    fn test_validate_malformed() {
        let bad = GeoBounds::new(10.0, 0.0, 0.0, 10.0);
        assert!(bad.validate().is_err());

        let good = GeoBounds::new(0.0, 0.0, 10.0, 10.0);
        assert!(good.validate().is_ok());
    }
}
