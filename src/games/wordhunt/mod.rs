use rand::{rngs::StdRng, SeedableRng};

use crate::framework::config::GameConfig;

pub mod core;

pub mod round;
use round::RoundGenerator;

pub mod runner;
pub use runner::{Input, Runner};

pub mod scores;

pub mod session;
pub use session::{Feedback, RoundState, Session, Status};

pub mod words_list;
use words_list::{Facts, WordsList};

/// A session set up from config, with the word and fact lists loaded.
#[tracing::instrument(skip_all, fields(grid_size = config.grid_size))]
pub fn new_session(config: &GameConfig) -> Result<Session, words_list::Error> {
    let words = WordsList::load_or_builtin(config.words_file.as_deref())?;
    let facts = Facts::load_or_builtin(config.facts_file.as_deref())?;
    let generator = RoundGenerator::new(words, config.grid_size)?;

    Ok(Session::new(
        generator,
        facts,
        config.clone(),
        StdRng::from_entropy(),
    ))
}
