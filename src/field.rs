//! A rank's local sub-grid with its one-cell ghost frame.

use crate::datatype::Layout;
use crate::error::{Error, Result};
use crate::grid::DEAD;

/// An `lx`×`ly` owned rectangle framed by one ghost cell on every side,
/// stored row-major with row stride `ly + 2`.
///
/// Interior cells live at indices `1..=lx` × `1..=ly`. The frame starts all
/// dead; the halo engine refreshes the four edge strips every step, and
/// strips facing an absent neighbor are simply never written again — a cell
/// with no peer on that side never grows new state from one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalField {
    lx: usize,
    ly: usize,
    cells: Vec<u8>,
}

impl LocalField {
    /// Frame an owned `lx`×`ly` block of cells with dead ghosts.
    pub fn from_block(block: &[u8], lx: usize, ly: usize) -> Result<Self> {
        if block.len() != lx * ly {
            return Err(Error::BufferMismatch {
                expected: lx * ly,
                actual: block.len(),
            });
        }
        let stride = ly + 2;
        let mut cells = vec![DEAD; (lx + 2) * stride];
        for i in 0..lx {
            let start = (i + 1) * stride + 1;
            cells[start..start + ly].copy_from_slice(&block[i * ly..(i + 1) * ly]);
        }
        Ok(LocalField { lx, ly, cells })
    }

    /// Interior extent along axis 0 (rows).
    pub fn lx(&self) -> usize {
        self.lx
    }

    /// Interior extent along axis 1 (columns).
    pub fn ly(&self) -> usize {
        self.ly
    }

    /// Flat index of `(i, j)` in halo coordinates (`0..=lx+1`, `0..=ly+1`).
    pub fn index(&self, i: usize, j: usize) -> usize {
        i * (self.ly + 2) + j
    }

    /// Cell state at `(i, j)` in halo coordinates.
    pub fn get(&self, i: usize, j: usize) -> u8 {
        self.cells[self.index(i, j)]
    }

    /// Set the cell at `(i, j)` in halo coordinates.
    pub fn set(&mut self, i: usize, j: usize, state: u8) {
        let at = self.index(i, j);
        self.cells[at] = state;
    }

    /// The full buffer including ghosts.
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Mutable access to the full buffer including ghosts.
    pub fn cells_mut(&mut self) -> &mut [u8] {
        &mut self.cells
    }

    /// Layout of one boundary row (contiguous).
    pub fn row_layout(&self) -> Layout {
        Layout::contiguous(self.ly)
    }

    /// Layout of one boundary column (strided, one cell per row).
    pub fn column_layout(&self) -> Layout {
        Layout::vector(self.lx, 1, self.ly + 2)
    }

    /// Copy out the interior, dropping the ghost frame.
    pub fn interior(&self) -> Vec<u8> {
        let stride = self.ly + 2;
        let mut out = Vec::with_capacity(self.lx * self.ly);
        for i in 1..=self.lx {
            let start = i * stride + 1;
            out.extend_from_slice(&self.cells[start..start + self.ly]);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_starts_dead() {
        let field = LocalField::from_block(&[1; 6], 2, 3).unwrap();
        for j in 0..=4 {
            assert_eq!(field.get(0, j), DEAD);
            assert_eq!(field.get(3, j), DEAD);
        }
        for i in 0..=3 {
            assert_eq!(field.get(i, 0), DEAD);
            assert_eq!(field.get(i, 4), DEAD);
        }
    }

    #[test]
    fn interior_round_trips_the_block() {
        let block: Vec<u8> = (0..12).map(|v| v % 2).collect();
        let field = LocalField::from_block(&block, 3, 4).unwrap();
        assert_eq!(field.interior(), block);
        assert_eq!(field.get(1, 1), block[0]);
        assert_eq!(field.get(3, 4), block[11]);
    }

    #[test]
    fn layouts_describe_the_boundaries() {
        let field = LocalField::from_block(&[0; 12], 3, 4).unwrap();
        assert_eq!(field.row_layout().len(), 4);
        assert_eq!(field.column_layout().len(), 3);

        // Gathering the first boundary column walks one cell per row.
        let column = field.column_layout().gather_from(field.cells(), field.index(1, 1));
        assert_eq!(column.len(), 3);
    }

    #[test]
    fn wrong_block_length_is_rejected() {
        assert!(LocalField::from_block(&[0; 5], 2, 3).is_err());
    }
}
