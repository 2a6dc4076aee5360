use std::sync::Arc;

use rand::Rng;
use tracing::trace;
use tracing_unwrap::ResultExt;

use super::{
    core::{Grid, PlacedWord, Word, WordPlacer},
    words_list::{EmptyWordsListError, WordsList},
};

/// One playable board: a full grid with a single hidden target word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    grid: Grid,
    target: PlacedWord,
}

impl Round {
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn target(&self) -> &PlacedWord {
        &self.target
    }

    pub fn word(&self) -> &Word {
        self.target.word()
    }
}

#[derive(Debug, Clone)]
pub struct RoundGenerator {
    words: Arc<WordsList>,
    grid_size: usize,
    placer: WordPlacer,
}

impl RoundGenerator {
    pub fn new(words: WordsList, grid_size: usize) -> Result<Self, EmptyWordsListError> {
        Ok(Self {
            words: Arc::new(words.fitting(grid_size)?),
            grid_size,
            placer: WordPlacer::default(),
        })
    }

    /// A fresh, independent round. Target words may repeat between calls.
    pub fn new_round(&self, rng: &mut impl Rng) -> Round {
        let word = self.words.random(rng);
        let mut grid = Grid::empty(self.grid_size);

        let target = self
            .placer
            .place(&mut grid, word, rng)
            .expect_or_log("words list only holds words that fit the grid");

        grid.fill_vacant(rng);

        trace!(%word, "generated round");

        Round { grid, target }
    }
}

#[cfg(test)]
mod tests {
    use super::RoundGenerator;
    use crate::games::wordhunt::{
        core::Direction,
        words_list::WordsList,
    };
    use pretty_assertions::assert_eq;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn rounds_are_playable() {
        let generator = RoundGenerator::new(WordsList::builtin(), 10).unwrap();
        let mut rng = StdRng::seed_from_u64(2024);

        for _ in 0..200 {
            let round = generator.new_round(&mut rng);
            let grid = round.grid();
            let path = round.target().path();

            assert!(grid.is_filled());
            assert!(grid
                .positions()
                .filter_map(|pos| grid.get(pos))
                .all(|ch| ch.is_ascii_uppercase()));

            assert!(round.word().len() <= 10);
            assert_eq!(path.len(), round.word().len());
            assert_eq!(grid.read(path), Some(round.word().to_string()));
            assert!(path
                .windows(2)
                .all(|pair| Direction::between(pair[0], pair[1]) == Some(round.target().direction())));
        }
    }

    #[test]
    fn words_repeat_eventually() {
        let generator = RoundGenerator::new(WordsList::builtin(), 4).unwrap();
        let mut rng = StdRng::seed_from_u64(5);

        let words: Vec<String> = (0..100)
            .map(|_| generator.new_round(&mut rng).word().to_string())
            .collect();
        let distinct: std::collections::HashSet<_> = words.iter().collect();

        assert!(distinct.len() < words.len());
        assert!(words.iter().all(|word| word.len() <= 4));
    }
}
