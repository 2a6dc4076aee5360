use rand::Rng;

use super::Position;

pub const ALPHABET: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Square letter grid. A cell is `None` until a word or a filler letter is written to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    size: usize,
    cells: Vec<Option<char>>,
}

impl Grid {
    pub fn empty(size: usize) -> Self {
        Self {
            size,
            cells: vec![None; size * size],
        }
    }

    pub const fn size(&self) -> usize {
        self.size
    }

    fn index(&self, pos: Position) -> Option<usize> {
        pos.in_bounds(self.size).then(|| pos.row * self.size + pos.col)
    }

    pub fn get(&self, pos: Position) -> Option<char> {
        self.index(pos).and_then(|index| self.cells[index])
    }

    pub fn is_vacant(&self, pos: Position) -> bool {
        self.index(pos).is_some_and(|index| self.cells[index].is_none())
    }

    /// Writes `letter` at `pos`. Out-of-bounds positions are ignored.
    pub fn set(&mut self, pos: Position, letter: char) {
        if let Some(index) = self.index(pos) {
            self.cells[index] = Some(letter);
        }
    }

    /// Fills every vacant cell with an independent, uniformly random letter.
    pub fn fill_vacant(&mut self, rng: &mut impl Rng) {
        for cell in self.cells.iter_mut().filter(|cell| cell.is_none()) {
            *cell = Some(char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]));
        }
    }

    pub fn is_filled(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.size).flat_map(move |row| (0..self.size).map(move |col| Position::new(row, col)))
    }

    /// Letters along `path`, or `None` if any cell is vacant or out of bounds.
    pub fn read(&self, path: &[Position]) -> Option<String> {
        path.iter().map(|pos| self.get(*pos)).collect()
    }
}
