use serde::Deserialize;

use crate::accounts::{leaderboard, TieBreak};

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct LeaderboardConfig {
    limit: usize,
    pub tie_break: TieBreak,
}

impl LeaderboardConfig {
    pub const LIMIT: usize = 20;

    pub fn limit(&self) -> usize {
        self.limit.min(leaderboard::MAX_LIMIT)
    }
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            limit: Self::LIMIT,
            tie_break: TieBreak::default(),
        }
    }
}
