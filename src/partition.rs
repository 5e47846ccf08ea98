//! Rectangular domain decomposition of the global grid.

use crate::error::{Error, Result};

/// One rank's share of the global grid.
///
/// Base extents come from integer division of the grid side by the mesh
/// extent; the rank at the last coordinate along an axis also takes the
/// remainder. Offsets always use the base stride, so every rank can locate
/// every other rank's rectangle without communication.
///
/// Invariant: the per-rank extents along each axis sum to the grid side
/// exactly — the rectangles tile the grid with no overlap and no gaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    /// Local extent along axis 0 (rows)
    pub lx: usize,
    /// Local extent along axis 1 (columns)
    pub ly: usize,
    /// Global row of this rank's first cell
    pub x0: usize,
    /// Global column of this rank's first cell
    pub y0: usize,
}

impl Partition {
    /// Compute the rectangle owned by the rank at `coords` in a `dims` mesh
    /// over a `side`×`side` grid.
    ///
    /// Fails if the grid side is smaller than the mesh extent on either
    /// axis, which would leave some rank with a zero-size rectangle.
    pub fn new(dims: [usize; 2], coords: [usize; 2], side: usize) -> Result<Self> {
        for axis in 0..2 {
            if side < dims[axis] {
                return Err(Error::Partition {
                    side,
                    extent: dims[axis],
                    axis,
                });
            }
        }
        let base_x = side / dims[0];
        let base_y = side / dims[1];
        let mut lx = base_x;
        let mut ly = base_y;
        if coords[0] == dims[0] - 1 {
            lx += side % dims[0];
        }
        if coords[1] == dims[1] - 1 {
            ly += side % dims[1];
        }
        Ok(Partition {
            lx,
            ly,
            x0: coords[0] * base_x,
            y0: coords[1] * base_y,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extents_along_each_axis_sum_to_side() {
        for &(dims, side) in &[([2, 3], 10usize), ([3, 3], 7), ([1, 5], 11), ([4, 4], 16)] {
            let row_total: usize = (0..dims[0])
                .map(|r| Partition::new(dims, [r, 0], side).unwrap().lx)
                .sum();
            assert_eq!(row_total, side, "dims {dims:?} side {side}");
            let col_total: usize = (0..dims[1])
                .map(|c| Partition::new(dims, [0, c], side).unwrap().ly)
                .sum();
            assert_eq!(col_total, side, "dims {dims:?} side {side}");
        }
    }

    #[test]
    fn remainder_goes_to_the_last_coordinate() {
        // 10 / 3 = 3 remainder 1
        let first = Partition::new([3, 3], [0, 0], 10).unwrap();
        let last = Partition::new([3, 3], [2, 2], 10).unwrap();
        assert_eq!((first.lx, first.ly), (3, 3));
        assert_eq!((last.lx, last.ly), (4, 4));
    }

    #[test]
    fn offsets_use_the_base_stride() {
        let part = Partition::new([2, 3], [1, 2], 10).unwrap();
        assert_eq!(part.x0, 5);
        assert_eq!(part.y0, 6);
        assert_eq!((part.lx, part.ly), (5, 4));
    }

    #[test]
    fn rectangles_tile_without_overlap() {
        let dims = [2, 3];
        let side = 10;
        let mut covered = vec![0u8; side * side];
        for row in 0..dims[0] {
            for col in 0..dims[1] {
                let part = Partition::new(dims, [row, col], side).unwrap();
                for i in part.x0..part.x0 + part.lx {
                    for j in part.y0..part.y0 + part.ly {
                        covered[i * side + j] += 1;
                    }
                }
            }
        }
        assert!(covered.iter().all(|&count| count == 1));
    }

    #[test]
    fn undersized_grid_is_a_partition_error() {
        let result = Partition::new([4, 2], [0, 0], 3);
        assert!(matches!(
            result,
            Err(Error::Partition {
                side: 3,
                extent: 4,
                axis: 0
            })
        ));
    }
}
