use std::collections::HashSet;

use super::Position;

/// Straight path of cells from `start` to `end`, both inclusive.
///
/// Horizontal, vertical and 45° diagonal drags produce every cell on the
/// line in drag order. Any other drag collapses to the anchor cell alone.
pub fn extend_path(start: Position, end: Position) -> Vec<Position> {
    let row_diff = end.row as isize - start.row as isize;
    let col_diff = end.col as isize - start.col as isize;

    let straight = row_diff == 0 || col_diff == 0 || row_diff.abs() == col_diff.abs();
    if !straight {
        return vec![start];
    }

    let steps = row_diff.abs().max(col_diff.abs());
    let (row_step, col_step) = (row_diff.signum(), col_diff.signum());

    (0..=steps)
        .filter_map(|i| {
            let row = start.row.checked_add_signed(i * row_step)?;
            let col = start.col.checked_add_signed(i * col_step)?;
            Some(Position::new(row, col))
        })
        .collect()
}

/// Whether a selection covers exactly the cells of the placed word, in either order.
pub fn is_match(selection: &[Position], placed: &[Position]) -> bool {
    if selection.len() != placed.len() {
        return false;
    }

    let selected: HashSet<_> = selection.iter().collect();
    let target: HashSet<_> = placed.iter().collect();

    selected == target
}

/// An in-progress drag gesture, anchored at the cell where it started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gesture {
    anchor: Position,
    path: Vec<Position>,
}

impl Gesture {
    pub fn new(anchor: Position) -> Self {
        Self {
            anchor,
            path: vec![anchor],
        }
    }

    /// Recomputes the path from the anchor to `hovered`, replacing the old one.
    pub fn hover(&mut self, hovered: Position) -> &[Position] {
        self.path = extend_path(self.anchor, hovered);
        &self.path
    }

    pub fn path(&self) -> &[Position] {
        &self.path
    }
}
