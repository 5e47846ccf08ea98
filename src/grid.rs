//! The global grid: initialization, rectangle mapping, and serialization.
//!
//! The full-resolution grid only exists at the boundaries of a run: it is
//! built by initialization, carved into per-rank rectangles by the scatter,
//! and reassembled by the gather. Worker logic never touches it mid-run.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::error::{Error, Result};

/// Cell state for a live cell.
pub const LIVE: u8 = 1;
/// Cell state for a dead cell. Also the fixed boundary value used for
/// ghost cells with no neighbor to supply data.
pub const DEAD: u8 = 0;

/// A square grid of cell states, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    side: usize,
    cells: Vec<u8>,
}

impl Grid {
    /// An all-dead grid.
    pub fn dead(side: usize) -> Self {
        Grid {
            side,
            cells: vec![DEAD; side * side],
        }
    }

    /// Seed a grid at the given live-cell density and return it together
    /// with the initial live count.
    pub fn random(side: usize, seed: u64, rho: f64) -> (Self, i64) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut cells = vec![DEAD; side * side];
        let mut live = 0i64;
        for cell in &mut cells {
            if rng.gen::<f64>() < rho {
                *cell = LIVE;
                live += 1;
            }
        }
        (Grid { side, cells }, live)
    }

    /// Build a grid from existing row-major cells.
    pub fn from_cells(side: usize, cells: Vec<u8>) -> Result<Self> {
        if cells.len() != side * side {
            return Err(Error::BufferMismatch {
                expected: side * side,
                actual: cells.len(),
            });
        }
        Ok(Grid { side, cells })
    }

    /// Side length of the grid.
    pub fn side(&self) -> usize {
        self.side
    }

    /// The raw row-major cells.
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Consume the grid, yielding its cells.
    pub fn into_cells(self) -> Vec<u8> {
        self.cells
    }

    /// State of the cell at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.cells[row * self.side + col]
    }

    /// Set the cell at `(row, col)`.
    pub fn set(&mut self, row: usize, col: usize, state: u8) {
        self.cells[row * self.side + col] = state;
    }

    /// Number of live cells.
    pub fn live_cells(&self) -> i64 {
        self.cells.iter().map(|&cell| i64::from(cell)).sum()
    }

    /// Copy out the `lx`×`ly` rectangle starting at `(x0, y0)`.
    pub fn block(&self, x0: usize, y0: usize, lx: usize, ly: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(lx * ly);
        for i in 0..lx {
            let start = (x0 + i) * self.side + y0;
            out.extend_from_slice(&self.cells[start..start + ly]);
        }
        out
    }

    /// Write an `lx`×`ly` rectangle of cells at `(x0, y0)`.
    ///
    /// # Panics
    ///
    /// Panics if the rectangle does not fit in the grid or `block` has the
    /// wrong length.
    pub fn place_block(&mut self, x0: usize, y0: usize, lx: usize, ly: usize, block: &[u8]) {
        assert_eq!(block.len(), lx * ly, "block length must match rectangle");
        for i in 0..lx {
            let start = (x0 + i) * self.side + y0;
            self.cells[start..start + ly].copy_from_slice(&block[i * ly..(i + 1) * ly]);
        }
    }

    /// Serialize the grid as a plain (P1) PBM image, live cells black.
    pub fn write_pbm<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut out = BufWriter::new(file);
        writeln!(out, "P1")?;
        writeln!(out, "{} {}", self.side, self.side)?;
        for row in self.cells.chunks(self.side) {
            let line: Vec<&str> = row
                .iter()
                .map(|&cell| if cell == LIVE { "1" } else { "0" })
                .collect();
            writeln!(out, "{}", line.join(" "))?;
        }
        out.flush()?;
        Ok(())
    }
}
