use rand::{seq::SliceRandom, Rng};
use thisslime::TracingError;
use tracing::{debug, trace, warn};

use super::{Direction, Grid, Position, Word};

#[derive(Debug, Clone, thiserror::Error, TracingError)]
#[error("word `{word}` has {length} letters but the grid is only {size} wide")]
#[event(level = ERROR)]
pub struct WordTooLongError {
    #[field(print = Display)]
    word: String,
    length: usize,
    size: usize,
}

impl WordTooLongError {
    fn new(word: &Word, size: usize) -> Self {
        Self {
            word: word.to_string(),
            length: word.len(),
            size,
        }
    }
}

/// A word written into a grid, with one position per letter in reading order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedWord {
    word: Word,
    direction: Direction,
    path: Vec<Position>,
}

impl PlacedWord {
    pub fn word(&self) -> &Word {
        &self.word
    }

    pub const fn direction(&self) -> Direction {
        self.direction
    }

    pub fn path(&self) -> &[Position] {
        &self.path
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.path.contains(&pos)
    }
}

/// Places one word into a grid along a random direction.
///
/// Random placement is tried for a bounded number of rounds, each round
/// visiting all eight directions in a fresh random order with a bounded number
/// of random start cells. If that never succeeds, the word is forced onto the
/// centred diagonal and then onto the centre row, so placement always
/// terminates and only fails when the word cannot fit at all.
#[derive(Debug, Clone, Copy)]
pub struct WordPlacer {
    pub outer_attempts: usize,
    pub starts_per_direction: usize,
}

impl Default for WordPlacer {
    fn default() -> Self {
        Self {
            outer_attempts: 1000,
            starts_per_direction: 50,
        }
    }
}

impl WordPlacer {
    pub fn place(
        &self,
        grid: &mut Grid,
        word: &Word,
        rng: &mut impl Rng,
    ) -> Result<PlacedWord, WordTooLongError> {
        let size = grid.size();

        if !word.fits(size) {
            return Err(WordTooLongError::new(word, size));
        }

        let (direction, path) = self
            .random(grid, word, rng)
            .or_else(|| centred_diagonal(grid, word))
            .or_else(|| centred_row(word, size))
            .ok_or_else(|| WordTooLongError::new(word, size))?;

        for (pos, letter) in path.iter().zip(word.iter()) {
            grid.set(*pos, *letter);
        }

        debug!(%word, ?direction, start = %path[0], "placed word");

        Ok(PlacedWord {
            word: word.clone(),
            direction,
            path,
        })
    }

    fn random(
        &self,
        grid: &Grid,
        word: &Word,
        rng: &mut impl Rng,
    ) -> Option<(Direction, Vec<Position>)> {
        let size = grid.size();
        let mut directions = Direction::ALL;

        for attempt in 0..self.outer_attempts {
            directions.shuffle(rng);

            for direction in directions {
                for _ in 0..self.starts_per_direction {
                    let start = Position::new(rng.gen_range(0..size), rng.gen_range(0..size));

                    if let Some(path) = fitting_span(grid, word, start, direction) {
                        trace!(attempt, "random placement found");
                        return Some((direction, path));
                    }
                }
            }
        }

        warn!(%word, "random placement exhausted, falling back");
        None
    }
}

/// Cells covered by a `len`-letter word starting at `start`, if all are in bounds.
pub fn span(start: Position, direction: Direction, len: usize, size: usize) -> Option<Vec<Position>> {
    (0..len).map(|i| start.step(direction, i, size)).collect()
}

/// The span for `word` at `start`, if every cell is vacant or already holds the right letter.
pub fn fitting_span(
    grid: &Grid,
    word: &Word,
    start: Position,
    direction: Direction,
) -> Option<Vec<Position>> {
    span(start, direction, word.len(), grid.size()).filter(|path| {
        path.iter()
            .zip(word.iter())
            .all(|(pos, letter)| grid.get(*pos).map_or(true, |existing| existing == *letter))
    })
}

fn centred_diagonal(grid: &Grid, word: &Word) -> Option<(Direction, Vec<Position>)> {
    let offset = (grid.size() - word.len()) / 2;
    let start = Position::new(offset, offset);

    fitting_span(grid, word, start, Direction::SouthEast).map(|path| (Direction::SouthEast, path))
}

fn centred_row(word: &Word, size: usize) -> Option<(Direction, Vec<Position>)> {
    let start = Position::new(size / 2, (size - word.len()) / 2);

    span(start, Direction::East, word.len(), size).map(|path| (Direction::East, path))
}
