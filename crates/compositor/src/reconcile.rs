//! Resolution reconciliation: upsampling coarse grids onto the finest one.

use tile_common::{MaskedGrid, TileError, TileResult};

/// Enlarge a grid by nearest-neighbor repetition with an integer factor
/// along both axes.
pub fn upsample(grid: &MaskedGrid, factor: usize) -> MaskedGrid {
    if factor <= 1 {
        return grid.clone();
    }

    let out_width = grid.width * factor;
    let out_height = grid.height * factor;
    let mut data = vec![0.0f32; out_width * out_height];
    let mut mask = vec![true; out_width * out_height];

    for out_y in 0..out_height {
        let in_y = out_y / factor;
        for out_x in 0..out_width {
            let in_x = out_x / factor;
            let src = in_y * grid.width + in_x;
            let dst = out_y * out_width + out_x;
            data[dst] = grid.data[src];
            mask[dst] = grid.mask[src];
        }
    }

    MaskedGrid::new(data, mask, out_width, out_height)
}

/// Bring a fetched grid onto the canvas shape for its resolution.
///
/// `resolution` must divide `max_resolution`; the enumerator guarantees
/// this. A shape mismatch after upsampling means the fetch size math and
/// the canvas disagree, which is a bug, not a data condition.
pub fn reconcile(
    grid: MaskedGrid,
    resolution: u32,
    max_resolution: u32,
    canvas_shape: (usize, usize),
) -> TileResult<MaskedGrid> {
    if max_resolution % resolution != 0 {
        return Err(TileError::Consistency(format!(
            "resolution {} does not divide finest resolution {}",
            resolution, max_resolution
        )));
    }

    let factor = (max_resolution / resolution) as usize;
    let out = if factor > 1 {
        upsample(&grid, factor)
    } else {
        grid
    };

    if (out.width, out.height) != canvas_shape {
        return Err(TileError::Consistency(format!(
            "reconciled grid shape {}x{} does not match canvas {}x{}",
            out.width, out.height, canvas_shape.0, canvas_shape.1
        )));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsample_repeats_pixels() {
        let grid = MaskedGrid::new(
            vec![1.0, 2.0, 3.0, 4.0],
            vec![false, false, false, true],
            2,
            2,
        );
        let up = upsample(&grid, 2);

        assert_eq!(up.width, 4);
        assert_eq!(up.height, 4);
        // Top-left 2x2 block is all 1.0
        assert_eq!(up.get(0, 0), Some(1.0));
        assert_eq!(up.get(1, 1), Some(1.0));
        assert_eq!(up.get(2, 0), Some(2.0));
        assert_eq!(up.get(0, 2), Some(3.0));
        // Masked source pixel stays masked over its whole block
        assert_eq!(up.get(2, 2), None);
        assert_eq!(up.get(3, 3), None);
    }

    #[test]
    fn test_upsample_factor_one_is_identity() {
        let grid = MaskedGrid::filled(9.0, 3, 3);
        assert_eq!(upsample(&grid, 1), grid);
    }

    #[test]
    fn test_reconcile_to_canvas_shape() {
        let coarse = MaskedGrid::filled(2.0, 4, 4);
        let out = reconcile(coarse, 5, 10, (8, 8)).unwrap();
        assert_eq!((out.width, out.height), (8, 8));
        assert_eq!(out.get(7, 7), Some(2.0));
    }

    #[test]
    fn test_reconcile_shape_mismatch_is_consistency_error() {
        let grid = MaskedGrid::filled(2.0, 4, 4);
        let err = reconcile(grid, 10, 10, (8, 8)).unwrap_err();
        assert!(matches!(err, TileError::Consistency(_)));
    }
}
