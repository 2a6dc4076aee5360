use std::cmp::Ordering;

use serde::Deserialize;

use super::{Account, AccountId};

/// Hard cap on how many entries a leaderboard can hold.
pub const MAX_LIMIT: usize = 100;

/// Order of accounts with equal high scores.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Whoever reached the score first ranks higher.
    #[default]
    EarliestScore,
    /// Whoever registered first ranks higher.
    FirstInserted,
}

impl TieBreak {
    /// Leaderboard order: higher score first, then the tie-break, then
    /// account id so the order is total.
    pub fn compare(self, a: &Account, b: &Account) -> Ordering {
        let by_score = b.high_score.cmp(&a.high_score);

        let by_tie_break = match self {
            Self::EarliestScore => match (a.high_score_at, b.high_score_at) {
                (Some(a), Some(b)) => a.cmp(&b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            Self::FirstInserted => Ordering::Equal,
        };

        by_score.then(by_tie_break).then_with(|| a.id.cmp(&b.id))
    }

    pub fn is_ahead(self, other: &Account, of: &Account) -> bool {
        self.compare(other, of) == Ordering::Less
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Standing {
    pub rank: u64,
    pub id: AccountId,
    pub username: String,
    pub high_score: u32,
    pub in_top: bool,
}

impl Standing {
    pub fn new(rank: u64, account: &Account) -> Self {
        Self {
            rank,
            id: account.id,
            username: account.username.clone(),
            high_score: account.high_score,
            in_top: false,
        }
    }

    pub fn in_top(mut self) -> Self {
        self.in_top = true;
        self
    }
}

impl std::fmt::Display for Standing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:>3}. {:<10} {:>6}", self.rank, self.username, self.high_score)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Leaderboard {
    pub entries: Vec<Standing>,
    pub user: Option<Standing>,
}

/// Numbers accounts that are already in leaderboard order.
pub fn rank(sorted: Vec<Account>) -> Vec<Standing> {
    sorted
        .iter()
        .zip(1..)
        .map(|(account, rank)| Standing::new(rank, account).in_top())
        .collect()
}
