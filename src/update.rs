//! The local transition rule.

use crate::field::LocalField;

/// Per-step statistics for one rank's rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepCounts {
    /// Cells that ended the step live
    pub live: i64,
    /// Cells whose state differs from the previous step
    pub changed: i64,
}

/// Apply the transition rule to every owned cell of `field`.
///
/// The rule is the self-inclusive 5-point variant: a cell's neighbor sum is
/// its own state plus its four orthogonal neighbors, and the cell becomes
/// live exactly when that sum is 2, 4, or 5. All sums are computed in a
/// separate pass before any state mutation, so a cell never sees a
/// same-step updated neighbor. Ghost cells are read-only inputs here.
pub fn advance(field: &mut LocalField) -> StepCounts {
    let lx = field.lx();
    let ly = field.ly();
    let stride = ly + 2;

    let mut sums = vec![0u8; field.cells().len()];
    {
        let cells = field.cells();
        for i in 1..=lx {
            for j in 1..=ly {
                let at = i * stride + j;
                sums[at] =
                    cells[at] + cells[at - 1] + cells[at + 1] + cells[at - stride] + cells[at + stride];
            }
        }
    }

    let mut counts = StepCounts::default();
    let cells = field.cells_mut();
    for i in 1..=lx {
        for j in 1..=ly {
            let at = i * stride + j;
            let next = u8::from(matches!(sums[at], 2 | 4 | 5));
            if next != cells[at] {
                counts.changed += 1;
            }
            counts.live += i64::from(next);
            cells[at] = next;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_3x3(block: [u8; 9]) -> LocalField {
        LocalField::from_block(&block, 3, 3).unwrap()
    }

    #[test]
    fn lone_center_cell_dies() {
        // Its self-inclusive sum is 1, which the rule maps to dead.
        let mut field = field_3x3([0, 0, 0, 0, 1, 0, 0, 0, 0]);
        let counts = advance(&mut field);
        assert_eq!(field.interior(), vec![0; 9]);
        assert_eq!(counts, StepCounts { live: 0, changed: 1 });
    }

    #[test]
    fn sum_of_two_survives() {
        // Two horizontal neighbors each see a sum of 2 and stay live.
        let mut field = field_3x3([1, 1, 0, 0, 0, 0, 0, 0, 0]);
        let counts = advance(&mut field);
        assert_eq!(field.interior(), vec![1, 1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(counts, StepCounts { live: 2, changed: 0 });
    }

    #[test]
    fn sum_of_three_dies() {
        // The middle of a row of three sums to 3 and dies; the ends sum to
        // 2 and survive; the cells above and below the middle sum to 1.
        let mut field = field_3x3([0, 0, 0, 1, 1, 1, 0, 0, 0]);
        let counts = advance(&mut field);
        assert_eq!(field.interior(), vec![0, 0, 0, 1, 0, 1, 0, 0, 0]);
        assert_eq!(counts, StepCounts { live: 2, changed: 1 });
    }

    #[test]
    fn plus_shape_fills_the_block() {
        // Center sums to 5, arms to 2, corners to 2 — everything lives.
        let mut field = field_3x3([0, 1, 0, 1, 1, 1, 0, 1, 0]);
        let counts = advance(&mut field);
        assert_eq!(field.interior(), vec![1; 9]);
        assert_eq!(counts, StepCounts { live: 9, changed: 4 });
    }

    #[test]
    fn ghost_cells_feed_the_sum_but_never_change() {
        let mut field = field_3x3([0; 9]);
        // A live ghost on the frame contributes to the adjacent interior
        // cell's sum but is not itself updated.
        field.set(0, 2, 1);
        field.set(2, 0, 1);
        let counts = advance(&mut field);
        // Interior cell (1, 2) saw sum 1; (2, 1) saw sum 1 — all stay dead.
        assert_eq!(field.interior(), vec![0; 9]);
        assert_eq!(counts, StepCounts { live: 0, changed: 0 });
        assert_eq!(field.get(0, 2), 1);
        assert_eq!(field.get(2, 0), 1);
    }
}
