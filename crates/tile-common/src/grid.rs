//! Masked numeric grids.

/// A `height x width` numeric grid with a parallel no-data mask.
///
/// Data is row-major, top-to-bottom. A pixel is authoritative only where
/// `mask[i] == false`.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskedGrid {
    /// Grid values in row-major order.
    pub data: Vec<f32>,
    /// Parallel no-data mask. `true` means no coverage at that pixel.
    pub mask: Vec<bool>,
    /// Width of the grid in pixels.
    pub width: usize,
    /// Height of the grid in pixels.
    pub height: usize,
}

impl MaskedGrid {
    /// Create a grid from existing data and mask.
    ///
    /// # Panics
    /// Panics if `data` and `mask` do not both have `width * height`
    /// elements; the shape invariant is a construction-time contract.
    pub fn new(data: Vec<f32>, mask: Vec<bool>, width: usize, height: usize) -> Self {
        assert_eq!(data.len(), width * height, "data does not match shape");
        assert_eq!(mask.len(), width * height, "mask does not match shape");
        Self {
            data,
            mask,
            width,
            height,
        }
    }

    /// Create a fully masked grid (no coverage anywhere).
    pub fn fully_masked(width: usize, height: usize) -> Self {
        Self {
            data: vec![0.0; width * height],
            mask: vec![true; width * height],
            width,
            height,
        }
    }

    /// Create a fully unmasked grid filled with one value.
    pub fn filled(value: f32, width: usize, height: usize) -> Self {
        Self {
            data: vec![value; width * height],
            mask: vec![false; width * height],
            width,
            height,
        }
    }

    /// Get the value at a pixel, or None if out of range or masked.
    pub fn get(&self, col: usize, row: usize) -> Option<f32> {
        if col >= self.width || row >= self.height {
            return None;
        }
        let idx = row * self.width + col;
        if self.mask[idx] {
            None
        } else {
            Some(self.data[idx])
        }
    }

    /// Set a pixel value and clear its mask bit.
    pub fn set(&mut self, col: usize, row: usize, value: f32) {
        if col < self.width && row < self.height {
            let idx = row * self.width + col;
            self.data[idx] = value;
            self.mask[idx] = false;
        }
    }

    /// Whether any pixel carries coverage.
    pub fn has_coverage(&self) -> bool {
        self.mask.iter().any(|m| !m)
    }

    /// Total number of pixels.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fully_masked_has_no_coverage() {
        let grid = MaskedGrid::fully_masked(4, 3);
        assert_eq!(grid.len(), 12);
        assert!(!grid.has_coverage());
        assert_eq!(grid.get(0, 0), None);
    }

    #[test]
    fn test_set_clears_mask() {
        let mut grid = MaskedGrid::fully_masked(4, 3);
        grid.set(2, 1, 7.5);
        assert_eq!(grid.get(2, 1), Some(7.5));
        assert!(grid.has_coverage());
        // Neighbors stay masked
        assert_eq!(grid.get(1, 1), None);
    }

    #[test]
    fn test_get_out_of_range() {
        let grid = MaskedGrid::filled(1.0, 2, 2);
        assert_eq!(grid.get(2, 0), None);
        assert_eq!(grid.get(0, 2), None);
        assert_eq!(grid.get(1, 1), Some(1.0));
    }

    #[test]
    #[should_panic(expected = "data does not match shape")]
    fn test_shape_mismatch_panics() {
        MaskedGrid::new(vec![0.0; 5], vec![false; 6], 2, 3);
    }
}
