//! Per-step halo exchange with up to four spatial neighbors.

use crate::comm::Communicator;
use crate::datatype::Layout;
use crate::error::Result;
use crate::field::LocalField;
use crate::request::Request;
use crate::topology::{CartComm, Neighbors};

// Tags name the direction the data travels, so the exchange stays
// unambiguous even when a rank is its own wrap neighbor.
const TAG_X_LOW: i32 = 10;
const TAG_X_HIGH: i32 = 11;
const TAG_Y_LOW: i32 = 12;
const TAG_Y_HIGH: i32 = 13;

/// The halo exchange engine for one rank.
///
/// Every step, each present neighbor receives a copy of this rank's
/// boundary strip and supplies the strip for the matching ghost edge. All
/// four sends are issued as synchronous nonblocking operations before any
/// receive is posted, then the four receives run, then the engine waits for
/// the sends — issuing sends and receives in strict pairwise order would
/// deadlock on an unbuffered transport.
///
/// Rows travel as contiguous runs; columns use the strided
/// [`Layout`] so no intermediate copy loop is needed. Directions with no
/// neighbor transfer nothing, and the ghost strip on that side keeps the
/// fixed dead value it was built with.
pub struct HaloExchange {
    neighbors: Neighbors,
    row: Layout,
    column: Layout,
}

impl HaloExchange {
    /// Fix the neighbor set and boundary layouts for a rank's field.
    pub fn new(cart: &CartComm, field: &LocalField) -> Self {
        HaloExchange {
            neighbors: Neighbors::of(cart),
            row: field.row_layout(),
            column: field.column_layout(),
        }
    }

    /// The neighbor set this engine exchanges with.
    pub fn neighbors(&self) -> Neighbors {
        self.neighbors
    }

    /// Refresh the ghost frame from the four neighbors' boundary strips.
    ///
    /// Any transfer failure is fatal: after a partial exchange the grid is
    /// in an undefined split state and the error propagates up to abort the
    /// run.
    pub fn exchange(&self, comm: &Communicator, field: &mut LocalField) -> Result<()> {
        let lx = field.lx();
        let ly = field.ly();

        // Issue all sends before posting any receive.
        let mut sends = Vec::with_capacity(4);
        if let Some(left) = self.neighbors.left {
            let strip = self.row.gather_from(field.cells(), field.index(1, 1));
            sends.push(comm.issend(strip, left, TAG_X_LOW)?);
        }
        if let Some(right) = self.neighbors.right {
            let strip = self.row.gather_from(field.cells(), field.index(lx, 1));
            sends.push(comm.issend(strip, right, TAG_X_HIGH)?);
        }
        if let Some(down) = self.neighbors.down {
            let strip = self.column.gather_from(field.cells(), field.index(1, 1));
            sends.push(comm.issend(strip, down, TAG_Y_LOW)?);
        }
        if let Some(top) = self.neighbors.top {
            let strip = self.column.gather_from(field.cells(), field.index(1, ly));
            sends.push(comm.issend(strip, top, TAG_Y_HIGH)?);
        }

        // Receive the opposite strips into the ghost frame.
        if let Some(right) = self.neighbors.right {
            let strip = comm.recv::<u8>(right, TAG_X_LOW)?;
            let at = field.index(lx + 1, 1);
            self.row.scatter_into(field.cells_mut(), at, &strip)?;
        }
        if let Some(left) = self.neighbors.left {
            let strip = comm.recv::<u8>(left, TAG_X_HIGH)?;
            let at = field.index(0, 1);
            self.row.scatter_into(field.cells_mut(), at, &strip)?;
        }
        if let Some(top) = self.neighbors.top {
            let strip = comm.recv::<u8>(top, TAG_Y_LOW)?;
            let at = field.index(1, ly + 1);
            self.column.scatter_into(field.cells_mut(), at, &strip)?;
        }
        if let Some(down) = self.neighbors.down {
            let strip = comm.recv::<u8>(down, TAG_Y_HIGH)?;
            let at = field.index(1, 0);
            self.column.scatter_into(field.cells_mut(), at, &strip)?;
        }

        Request::wait_all(sends)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::grid::DEAD;
    use crate::partition::Partition;
    use crate::ProcessGroup;

    // Deterministic test pattern every rank can rebuild locally.
    fn pattern(row: usize, col: usize) -> u8 {
        u8::from((row * 7 + col * 3 + 1) % 4 == 0) | u8::from((row + col) % 3 == 0)
    }

    fn worker_checks_ghosts(side: usize) -> impl Fn(crate::Communicator) -> Result<()> {
        move |comm| {
            let cart = CartComm::new(comm)?;
            let part = Partition::new(cart.dims(), cart.coords(), side)?;
            let block: Vec<u8> = (0..part.lx)
                .flat_map(|i| (0..part.ly).map(move |j| pattern(part.x0 + i, part.y0 + j)))
                .collect();
            let mut field = LocalField::from_block(&block, part.lx, part.ly)?;
            let halo = HaloExchange::new(&cart, &field);
            halo.exchange(cart.comm(), &mut field)?;

            let [rows, _] = cart.dims();
            let [row, _] = cart.coords();
            for j in 1..=part.ly {
                let global_col = part.y0 + j - 1;
                // Bounded axis: real neighbor row or the fixed dead value.
                let expect_low = if row > 0 {
                    pattern(part.x0 - 1, global_col)
                } else {
                    DEAD
                };
                assert_eq!(field.get(0, j), expect_low, "ghost row 0, column {j}");
                let expect_high = if row < rows - 1 {
                    pattern(part.x0 + part.lx, global_col)
                } else {
                    DEAD
                };
                assert_eq!(field.get(part.lx + 1, j), expect_high, "ghost row lx+1, column {j}");
            }
            for i in 1..=part.lx {
                let global_row = part.x0 + i - 1;
                // Periodic axis: columns wrap around the global grid.
                let wrap_low = (part.y0 + side - 1) % side;
                let wrap_high = (part.y0 + part.ly) % side;
                assert_eq!(
                    field.get(i, 0),
                    pattern(global_row, wrap_low),
                    "ghost column 0, row {i}"
                );
                assert_eq!(
                    field.get(i, part.ly + 1),
                    pattern(global_row, wrap_high),
                    "ghost column ly+1, row {i}"
                );
            }
            Ok(())
        }
    }

    #[test]
    fn ghosts_match_neighbor_boundaries_on_a_2x2_mesh() {
        ProcessGroup::run(4, worker_checks_ghosts(6)).unwrap();
    }

    #[test]
    fn ghosts_match_on_an_uneven_2x3_mesh() {
        // 10 does not divide by 3; the last column rank is wider.
        ProcessGroup::run(6, worker_checks_ghosts(10)).unwrap();
    }

    #[test]
    fn single_rank_wraps_onto_itself() {
        ProcessGroup::run(1, worker_checks_ghosts(5)).unwrap();
    }
}
