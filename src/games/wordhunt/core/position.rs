use serde::{Deserialize, Serialize};

/// A cell in the grid, 0-indexed from the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    pub const fn in_bounds(self, size: usize) -> bool {
        self.row < size && self.col < size
    }

    /// The cell `steps` cells away in `direction`, if it stays inside a `size`-wide grid.
    pub fn step(self, direction: Direction, steps: usize, size: usize) -> Option<Self> {
        let (row_delta, col_delta) = direction.delta();
        let steps = isize::try_from(steps).ok()?;

        let row = offset(self.row, row_delta * steps)?;
        let col = offset(self.col, col_delta * steps)?;

        Some(Self::new(row, col)).filter(|pos| pos.in_bounds(size))
    }
}

fn offset(base: usize, delta: isize) -> Option<usize> {
    base.checked_add_signed(delta)
}

impl From<(usize, usize)> for Position {
    fn from((row, col): (usize, usize)) -> Self {
        Self::new(row, col)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// One of the eight unit steps a word can run along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    East,
    West,
    South,
    North,
    SouthEast,
    NorthWest,
    SouthWest,
    NorthEast,
}

impl Direction {
    pub const ALL: [Self; 8] = [
        Self::East,
        Self::West,
        Self::South,
        Self::North,
        Self::SouthEast,
        Self::NorthWest,
        Self::SouthWest,
        Self::NorthEast,
    ];

    /// `(row, col)` unit vector.
    pub const fn delta(self) -> (isize, isize) {
        match self {
            Self::East => (0, 1),
            Self::West => (0, -1),
            Self::South => (1, 0),
            Self::North => (-1, 0),
            Self::SouthEast => (1, 1),
            Self::NorthWest => (-1, -1),
            Self::SouthWest => (1, -1),
            Self::NorthEast => (-1, 1),
        }
    }

    pub fn from_delta(delta: (isize, isize)) -> Option<Self> {
        Self::ALL.into_iter().find(|dir| dir.delta() == delta)
    }

    /// The direction between two adjacent cells.
    pub fn between(from: Position, to: Position) -> Option<Self> {
        let row = to.row as isize - from.row as isize;
        let col = to.col as isize - from.col as isize;
        Self::from_delta((row, col))
    }
}

#[cfg(test)]
mod tests {
    use super::{Direction, Position};
    use pretty_assertions::assert_eq;

    #[test]
    fn step_stays_in_bounds() {
        let origin = Position::new(0, 0);

        assert_eq!(origin.step(Direction::SouthEast, 3, 10), Some(Position::new(3, 3)));
        assert_eq!(origin.step(Direction::North, 1, 10), None);
        assert_eq!(origin.step(Direction::East, 10, 10), None);
        assert_eq!(origin.step(Direction::East, 9, 10), Some(Position::new(0, 9)));
    }

    #[test]
    fn step_zero_is_identity() {
        let pos = Position::new(4, 7);

        for dir in Direction::ALL {
            assert_eq!(pos.step(dir, 0, 10), Some(pos));
        }
    }

    #[test]
    fn directions_are_unique_unit_vectors() {
        for dir in Direction::ALL {
            let (row, col) = dir.delta();
            assert!(row.abs() <= 1 && col.abs() <= 1 && (row, col) != (0, 0));
            assert_eq!(Direction::from_delta(dir.delta()), Some(dir));
        }
    }

    #[test]
    fn between_adjacent_cells() {
        let centre = Position::new(5, 5);

        assert_eq!(
            Direction::between(centre, Position::new(4, 6)),
            Some(Direction::NorthEast)
        );
        assert_eq!(Direction::between(centre, Position::new(5, 7)), None);
        assert_eq!(Direction::between(centre, centre), None);
    }
}
