//! 2D cartesian arrangement of a rank group.
//!
//! Axis 0 is bounded (edge positions have no neighbor past the edge); axis 1
//! is periodic (the last position wraps back to the first). Ranks are laid
//! out row-major: rank = `coords[0] * cols + coords[1]`.

use crate::comm::Communicator;
use crate::error::{Error, Result};

/// Balanced 2-factor decomposition of `size` ranks into `(rows, cols)`.
///
/// The two factors are as close as the factorization of `size` allows, to
/// keep the halo surface-to-volume ratio low. The smaller factor lands on
/// axis 0 (bounded), so the degenerate prime case comes out as `(1, size)`
/// and the wrap axis keeps a meaningful length.
pub fn dims_create(size: usize) -> Result<(usize, usize)> {
    if size == 0 {
        return Err(Error::Topology("cannot arrange zero ranks".into()));
    }
    let mut best = (1, size);
    let mut factor = 1;
    while factor * factor <= size {
        if size % factor == 0 {
            best = (factor, size / factor);
        }
        factor += 1;
    }
    Ok(best)
}

/// A communicator with an attached cartesian arrangement.
///
/// Owns the rank's [`Communicator`] and exposes its position in the mesh and
/// neighbor addressing. Built once per run; the neighbor set is fixed for
/// the run's lifetime.
pub struct CartComm {
    comm: Communicator,
    dims: [usize; 2],
    coords: [usize; 2],
}

impl CartComm {
    /// Arrange the communicator's group into a 2D mesh.
    pub fn new(comm: Communicator) -> Result<Self> {
        let (rows, cols) = dims_create(comm.size())?;
        let rank = comm.rank();
        let coords = [rank / cols, rank % cols];
        Ok(CartComm {
            comm,
            dims: [rows, cols],
            coords,
        })
    }

    /// The underlying communicator endpoint.
    pub fn comm(&self) -> &Communicator {
        &self.comm
    }

    /// Mesh extents `[rows, cols]`.
    pub fn dims(&self) -> [usize; 2] {
        self.dims
    }

    /// This rank's position `[row, col]` in the mesh.
    pub fn coords(&self) -> [usize; 2] {
        self.coords
    }

    fn rank_at(&self, coords: [usize; 2]) -> usize {
        coords[0] * self.dims[1] + coords[1]
    }

    /// The rank displaced by `disp` along `axis`, if it exists.
    ///
    /// On axis 1 positions wrap around (a rank can be its own neighbor when
    /// the axis has length 1); on axis 0 a displacement past the edge
    /// returns `None` — the absent-neighbor sentinel.
    ///
    /// # Panics
    ///
    /// Panics if `axis` is not 0 or 1.
    pub fn neighbor(&self, axis: usize, disp: isize) -> Option<usize> {
        let extent = self.dims[axis] as isize;
        let position = self.coords[axis] as isize + disp;
        let position = if axis == 1 {
            position.rem_euclid(extent)
        } else if (0..extent).contains(&position) {
            position
        } else {
            return None;
        };
        let mut coords = self.coords;
        coords[axis] = position as usize;
        Some(self.rank_at(coords))
    }
}

/// The four spatial neighbors of a mesh position.
///
/// `None` marks an absent neighbor at a bounded-axis edge; the halo engine
/// skips transfer in that direction and the corresponding ghost cells keep
/// the fixed dead value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbors {
    /// Neighbor at the lower row (axis 0, displacement -1)
    pub left: Option<usize>,
    /// Neighbor at the higher row (axis 0, displacement +1)
    pub right: Option<usize>,
    /// Neighbor at the lower column (axis 1, displacement -1, wraps)
    pub down: Option<usize>,
    /// Neighbor at the higher column (axis 1, displacement +1, wraps)
    pub top: Option<usize>,
}

impl Neighbors {
    /// Derive the neighbor set for a mesh position.
    pub fn of(cart: &CartComm) -> Self {
        Neighbors {
            left: cart.neighbor(0, -1),
            right: cart.neighbor(0, 1),
            down: cart.neighbor(1, -1),
            top: cart.neighbor(1, 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProcessGroup;

    #[test]
    fn dims_multiply_back_to_size() {
        for size in 1..=24 {
            let (rows, cols) = dims_create(size).unwrap();
            assert_eq!(rows * cols, size);
            assert!(rows >= 1 && cols >= 1);
            assert!(rows <= cols, "smaller factor goes on the bounded axis");
        }
    }

    #[test]
    fn dims_are_balanced() {
        assert_eq!(dims_create(4).unwrap(), (2, 2));
        assert_eq!(dims_create(12).unwrap(), (3, 4));
        assert_eq!(dims_create(16).unwrap(), (4, 4));
        assert_eq!(dims_create(6).unwrap(), (2, 3));
    }

    #[test]
    fn primes_degenerate_to_a_periodic_line() {
        for prime in [2, 3, 5, 7, 11, 13] {
            assert_eq!(dims_create(prime).unwrap(), (1, prime));
        }
    }

    #[test]
    fn zero_ranks_is_a_topology_error() {
        assert!(matches!(dims_create(0), Err(Error::Topology(_))));
    }

    #[test]
    fn coords_cover_the_mesh_row_major() {
        ProcessGroup::run(6, |comm| -> Result<()> {
            let rank = comm.rank();
            let cart = CartComm::new(comm)?;
            assert_eq!(cart.dims(), [2, 3]);
            let [row, col] = cart.coords();
            assert_eq!(rank, row * 3 + col);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn bounded_axis_has_absent_neighbors_at_edges() {
        ProcessGroup::run(6, |comm| -> Result<()> {
            let cart = CartComm::new(comm)?;
            let [row, _] = cart.coords();
            let neighbors = Neighbors::of(&cart);
            assert_eq!(neighbors.left.is_none(), row == 0);
            assert_eq!(neighbors.right.is_none(), row == 1);
            // The periodic axis always has both neighbors.
            assert!(neighbors.down.is_some() && neighbors.top.is_some());
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn periodic_axis_wraps_around() {
        ProcessGroup::run(6, |comm| -> Result<()> {
            let cart = CartComm::new(comm)?;
            let [row, col] = cart.coords();
            let cols = cart.dims()[1];
            assert_eq!(cart.neighbor(1, -1), Some(row * cols + (col + cols - 1) % cols));
            assert_eq!(cart.neighbor(1, 1), Some(row * cols + (col + 1) % cols));
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn single_rank_is_its_own_wrap_neighbor() {
        ProcessGroup::run(1, |comm| -> Result<()> {
            let cart = CartComm::new(comm)?;
            let neighbors = Neighbors::of(&cart);
            assert_eq!(neighbors.left, None);
            assert_eq!(neighbors.right, None);
            assert_eq!(neighbors.down, Some(0));
            assert_eq!(neighbors.top, Some(0));
            Ok(())
        })
        .unwrap();
    }
}
