use std::{path::PathBuf, time::Duration};

use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct GameConfig {
    pub grid_size: usize,
    pub round_seconds: u32,
    pub hint_at_seconds: u32,
    pub points_per_word: u32,
    success_delay_ms: u64,
    feedback_window_ms: u64,
    pub words_file: Option<PathBuf>,
    pub facts_file: Option<PathBuf>,
}

impl GameConfig {
    pub const GRID_SIZE: usize = 10;
    pub const ROUND_SECONDS: u32 = 60;
    pub const HINT_AT_SECONDS: u32 = 10;
    pub const POINTS_PER_WORD: u32 = 50;
    pub const SUCCESS_DELAY: Duration = Duration::from_millis(1500);
    pub const FEEDBACK_WINDOW: Duration = Duration::from_millis(2000);

    /// How long the success feedback stays up before the next round.
    pub const fn success_delay(&self) -> Duration {
        Duration::from_millis(self.success_delay_ms)
    }

    /// How long the time-up feedback stays up.
    pub const fn feedback_window(&self) -> Duration {
        Duration::from_millis(self.feedback_window_ms)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_size: Self::GRID_SIZE,
            round_seconds: Self::ROUND_SECONDS,
            hint_at_seconds: Self::HINT_AT_SECONDS,
            points_per_word: Self::POINTS_PER_WORD,
            success_delay_ms: Self::SUCCESS_DELAY.as_millis() as u64,
            feedback_window_ms: Self::FEEDBACK_WINDOW.as_millis() as u64,
            words_file: None,
            facts_file: None,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ScoresConfig {
    pub max_attempts: u32,
    base_delay_ms: u64,
    flush_interval_secs: u64,
}

impl ScoresConfig {
    pub const MAX_ATTEMPTS: u32 = 3;
    pub const BASE_DELAY: Duration = Duration::from_millis(500);
    pub const FLUSH_INTERVAL: Duration = Duration::from_secs(30);

    /// First retry delay; doubles on every further attempt.
    pub const fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// Never shorter than a second.
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs.max(1))
    }
}

impl Default for ScoresConfig {
    fn default() -> Self {
        Self {
            max_attempts: Self::MAX_ATTEMPTS,
            base_delay_ms: Self::BASE_DELAY.as_millis() as u64,
            flush_interval_secs: Self::FLUSH_INTERVAL.as_secs(),
        }
    }
}
