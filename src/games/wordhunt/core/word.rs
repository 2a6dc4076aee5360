use std::{ops::Index, slice::Iter, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An uppercase A–Z word to hide in the grid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Word {
    letters: Vec<char>,
}

impl Word {
    pub fn len(&self) -> usize {
        self.letters.len()
    }

    pub fn iter(&self) -> Iter<'_, char> {
        self.letters.iter()
    }

    pub fn fits(&self, grid_size: usize) -> bool {
        self.len() <= grid_size
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseWordError {
    #[error("word must not be empty")]
    Empty,

    #[error("word `{0}` must contain only the letters A to Z")]
    NotAlphabetic(String),
}

impl FromStr for Word {
    type Err = ParseWordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if s.is_empty() {
            return Err(ParseWordError::Empty);
        }

        if !s.chars().all(|ch| ch.is_ascii_alphabetic()) {
            return Err(ParseWordError::NotAlphabetic(s.to_owned()));
        }

        Ok(Self {
            letters: s.to_ascii_uppercase().chars().collect(),
        })
    }
}

impl TryFrom<String> for Word {
    type Error = ParseWordError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(&value)
    }
}

impl From<Word> for String {
    fn from(value: Word) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for Word {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letters.iter().collect::<String>())
    }
}

impl Index<usize> for Word {
    type Output = char;

    fn index(&self, index: usize) -> &Self::Output {
        self.letters.index(index)
    }
}

#[cfg(test)]
mod tests {
    use super::{ParseWordError, Word};
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    #[test]
    fn uppercases() {
        let word = Word::from_str("aztec").unwrap();
        assert_eq!(word.to_string(), "AZTEC");
        assert_eq!(word.len(), 5);
        assert_eq!(word[1], 'Z');
    }

    #[test]
    fn rejects_junk() {
        assert_eq!(Word::from_str("  "), Err(ParseWordError::Empty));
        assert_eq!(
            Word::from_str("zk-rollup"),
            Err(ParseWordError::NotAlphabetic("zk-rollup".to_owned()))
        );
    }

    #[test]
    fn fits() {
        let word = Word::from_str("BLOCKCHAIN").unwrap();
        assert!(word.fits(10));
        assert!(!word.fits(9));
    }
}
