use std::{path::Path, str::FromStr};

use rand::{seq::SliceRandom, Rng};
use thisslime::TracingError;
use tracing::{debug, info, warn};
use tracing_unwrap::OptionExt;

use super::core::{ParseWordError, Word};

const BUILTIN_WORDS: &str = include_str!("../../../data/words.txt");
const BUILTIN_FACTS: &str = include_str!("../../../data/facts.txt");

#[derive(Debug, thiserror::Error, TracingError)]
pub enum Error {
    #[error("couldn't read list: {0}")]
    #[event(level = ERROR)]
    Io(#[from] std::io::Error),

    #[error("invalid word in list: {0}")]
    #[event(level = ERROR)]
    Parse(#[from] ParseWordError),

    #[error(transparent)]
    Empty(#[from] EmptyWordsListError),
}

#[derive(Debug, thiserror::Error, TracingError)]
#[error("no words fit in a {grid_size}x{grid_size} grid")]
#[event(level = ERROR)]
pub struct EmptyWordsListError {
    grid_size: usize,
}

fn entries(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

/// Vocabulary of target words.
#[derive(Debug, Clone)]
pub struct WordsList {
    words: Vec<Word>,
}

impl WordsList {
    pub fn builtin() -> Self {
        let words = entries(BUILTIN_WORDS)
            .filter_map(|entry| match Word::from_str(entry) {
                Ok(word) => Some(word),
                Err(err) => {
                    warn!(%err, "skipping built-in word");
                    None
                }
            })
            .collect();

        Self { words }
    }

    #[tracing::instrument(skip_all, fields(?path))]
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        let words = entries(&text)
            .map(Word::from_str)
            .collect::<Result<Vec<_>, _>>()?;

        info!(count = words.len(), "loaded words list");

        Ok(Self { words })
    }

    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, Error> {
        path.map_or_else(|| Ok(Self::builtin()), Self::load)
    }

    /// Only the words that fit in a `grid_size`-wide grid. Errors if none do.
    pub fn fitting(self, grid_size: usize) -> Result<Self, EmptyWordsListError> {
        let total = self.words.len();
        let words: Vec<Word> = self
            .words
            .into_iter()
            .filter(|word| word.fits(grid_size))
            .collect();

        debug!(total, fitting = words.len(), grid_size, "filtered words list");

        if words.is_empty() {
            Err(EmptyWordsListError { grid_size })
        } else {
            Ok(Self { words })
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Word> {
        self.words.iter()
    }

    pub fn random(&self, rng: &mut impl Rng) -> &Word {
        self.words
            .choose(rng)
            .expect_or_log("words list is filtered to be non-empty")
    }
}

/// Short facts shown alongside round feedback.
#[derive(Debug, Clone, Default)]
pub struct Facts {
    facts: Vec<String>,
}

impl Facts {
    pub fn builtin() -> Self {
        Self::parse(BUILTIN_FACTS)
    }

    fn parse(text: &str) -> Self {
        Self {
            facts: entries(text).map(str::to_owned).collect(),
        }
    }

    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(path) => Ok(Self::parse(&std::fs::read_to_string(path)?)),
            None => Ok(Self::builtin()),
        }
    }

    pub fn random(&self, rng: &mut impl Rng) -> Option<String> {
        self.facts.choose(rng).cloned()
    }
}
