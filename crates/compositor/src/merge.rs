//! Composite merging of partial masked grids onto one canvas.

use serde::{Deserialize, Serialize};

use tile_common::{MaskedGrid, TileError, TileResult};

/// How overlapping sections combine on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MergePolicy {
    /// Later grids overwrite earlier ones wherever they carry coverage.
    /// Enumeration order is the merge order.
    #[default]
    Overwrite,
    /// The larger reading wins wherever both carry coverage. Used for
    /// intensity fields where overlapping sections are both authoritative.
    Maximum,
}

/// Merge one grid into the canvas under the given policy.
///
/// Masked pixels in the grid never reduce canvas coverage; pixels
/// untouched by every grid remain masked.
pub fn merge_into(
    canvas: &mut MaskedGrid,
    grid: &MaskedGrid,
    policy: MergePolicy,
) -> TileResult<()> {
    if (canvas.width, canvas.height) != (grid.width, grid.height) {
        return Err(TileError::Consistency(format!(
            "merge shape mismatch: canvas {}x{}, grid {}x{}",
            canvas.width, canvas.height, grid.width, grid.height
        )));
    }

    for idx in 0..canvas.len() {
        if grid.mask[idx] {
            continue;
        }
        match policy {
            MergePolicy::Overwrite => {
                canvas.data[idx] = grid.data[idx];
                canvas.mask[idx] = false;
            }
            MergePolicy::Maximum => {
                if canvas.mask[idx] {
                    canvas.data[idx] = grid.data[idx];
                    canvas.mask[idx] = false;
                } else {
                    canvas.data[idx] = canvas.data[idx].max(grid.data[idx]);
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overwrite_later_grid_wins() {
        let mut canvas = MaskedGrid::fully_masked(2, 2);
        let a = MaskedGrid::filled(1.0, 2, 2);
        let b = MaskedGrid::filled(2.0, 2, 2);

        merge_into(&mut canvas, &a, MergePolicy::Overwrite).unwrap();
        merge_into(&mut canvas, &b, MergePolicy::Overwrite).unwrap();

        assert_eq!(canvas.get(0, 0), Some(2.0));
        assert_eq!(canvas.get(1, 1), Some(2.0));
    }

    #[test]
    fn test_maximum_larger_value_wins() {
        let mut canvas = MaskedGrid::fully_masked(2, 2);
        let a = MaskedGrid::filled(5.0, 2, 2);
        let b = MaskedGrid::filled(2.0, 2, 2);

        merge_into(&mut canvas, &a, MergePolicy::Maximum).unwrap();
        merge_into(&mut canvas, &b, MergePolicy::Maximum).unwrap();

        assert_eq!(canvas.get(0, 0), Some(5.0));
    }

    #[test]
    fn test_masked_pixels_never_reduce_coverage() {
        let mut canvas = MaskedGrid::fully_masked(2, 1);
        let mut a = MaskedGrid::fully_masked(2, 1);
        a.set(0, 0, 3.0);

        let b = MaskedGrid::fully_masked(2, 1);

        merge_into(&mut canvas, &a, MergePolicy::Overwrite).unwrap();
        merge_into(&mut canvas, &b, MergePolicy::Overwrite).unwrap();

        assert_eq!(canvas.get(0, 0), Some(3.0));
        assert_eq!(canvas.get(1, 0), None);
    }

    #[test]
    fn test_coverage_is_union() {
        let mut canvas = MaskedGrid::fully_masked(2, 1);
        let mut a = MaskedGrid::fully_masked(2, 1);
        a.set(0, 0, 1.0);
        let mut b = MaskedGrid::fully_masked(2, 1);
        b.set(1, 0, 2.0);

        merge_into(&mut canvas, &a, MergePolicy::Maximum).unwrap();
        merge_into(&mut canvas, &b, MergePolicy::Maximum).unwrap();

        assert_eq!(canvas.get(0, 0), Some(1.0));
        assert_eq!(canvas.get(1, 0), Some(2.0));
    }

    #[test]
    fn test_shape_mismatch_is_consistency_error() {
        let mut canvas = MaskedGrid::fully_masked(2, 2);
        let grid = MaskedGrid::filled(1.0, 3, 3);
        let err = merge_into(&mut canvas, &grid, MergePolicy::Overwrite).unwrap_err();
        assert!(matches!(err, TileError::Consistency(_)));
    }
}
