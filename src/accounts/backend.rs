use std::collections::HashMap;

use mongodb::bson::{oid::ObjectId, DateTime};
use tokio::sync::RwLock;

use super::{leaderboard::TieBreak, Account, AccountId, ScoreSample, UsernameTakenError};

/// An account right after a score was folded into it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scored {
    pub account: Account,
    pub high_score_raised: bool,
}

/// Account storage. Every update is applied to the stored document in one
/// step, so overlapping writers can't undo each other.
pub trait Backend {
    type Error: std::fmt::Display;

    // read
    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, Self::Error>;
    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, Self::Error>;

    /// Accounts with a positive high score, best first.
    async fn top(&self, limit: usize, tie_break: TieBreak) -> Result<Vec<Account>, Self::Error>;

    /// How many scored accounts rank above `account`.
    async fn count_ahead(&self, account: &Account, tie_break: TieBreak)
        -> Result<u64, Self::Error>;

    // update
    async fn insert(
        &self,
        account: Account,
    ) -> Result<Result<(), UsernameTakenError>, Self::Error>;

    /// Moves `last_played_at` forward to `at`.
    async fn touch(&self, id: AccountId, at: DateTime) -> Result<(), Self::Error>;

    /// Folds `sample` into the record of its game and returns how many
    /// rounds it adds over what that record already held.
    async fn record_game(&self, sample: &ScoreSample) -> Result<u32, Self::Error>;

    /// Adds `rounds`, moves `last_played_at` forward and raises the high
    /// score if `sample` beats it. `None` if the account doesn't exist.
    async fn apply_score(
        &self,
        sample: &ScoreSample,
        rounds: u32,
    ) -> Result<Option<Scored>, Self::Error>;
}

type GameKey = (AccountId, ObjectId, u32);

/// Process-local storage, used for tests and `--memory` play.
#[derive(Debug, Default)]
pub struct InMemory {
    accounts: RwLock<HashMap<AccountId, Account>>,
    games: RwLock<HashMap<GameKey, ScoreSample>>,
}

impl InMemory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Backend for InMemory {
    type Error = std::convert::Infallible;

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, Self::Error> {
        let guard = self.accounts.read().await;
        Ok(guard.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, Self::Error> {
        let guard = self.accounts.read().await;
        Ok(guard
            .values()
            .find(|account| account.username == username)
            .cloned())
    }

    async fn top(&self, limit: usize, tie_break: TieBreak) -> Result<Vec<Account>, Self::Error> {
        let guard = self.accounts.read().await;

        let mut scored: Vec<Account> = guard
            .values()
            .filter(|account| account.high_score > 0)
            .cloned()
            .collect();
        scored.sort_by(|a, b| tie_break.compare(a, b));
        scored.truncate(limit);

        Ok(scored)
    }

    async fn count_ahead(
        &self,
        account: &Account,
        tie_break: TieBreak,
    ) -> Result<u64, Self::Error> {
        let guard = self.accounts.read().await;

        Ok(guard
            .values()
            .filter(|other| other.high_score > 0 && tie_break.is_ahead(other, account))
            .count() as u64)
    }

    async fn insert(
        &self,
        account: Account,
    ) -> Result<Result<(), UsernameTakenError>, Self::Error> {
        let mut guard = self.accounts.write().await;

        if guard
            .values()
            .any(|existing| existing.username == account.username)
        {
            return Ok(Err(UsernameTakenError::new(account.username)));
        }

        guard.insert(account.id, account);
        Ok(Ok(()))
    }

    async fn touch(&self, id: AccountId, at: DateTime) -> Result<(), Self::Error> {
        let mut guard = self.accounts.write().await;

        if let Some(account) = guard.get_mut(&id) {
            account.last_played_at = account.last_played_at.max(at);
        }

        Ok(())
    }

    async fn record_game(&self, sample: &ScoreSample) -> Result<u32, Self::Error> {
        let mut guard = self.games.write().await;
        let key = (sample.account, sample.session, sample.game);

        let Some(record) = guard.get_mut(&key) else {
            guard.insert(key, sample.clone());
            return Ok(sample.rounds_played);
        };

        let added = sample.rounds_played.saturating_sub(record.rounds_played);
        record.score = record.score.max(sample.score);
        record.rounds_played = record.rounds_played.max(sample.rounds_played);
        record.recorded_at = record.recorded_at.max(sample.recorded_at);

        Ok(added)
    }

    async fn apply_score(
        &self,
        sample: &ScoreSample,
        rounds: u32,
    ) -> Result<Option<Scored>, Self::Error> {
        let mut guard = self.accounts.write().await;

        let Some(account) = guard.get_mut(&sample.account) else {
            return Ok(None);
        };

        account.total_rounds_played += rounds;
        account.last_played_at = account.last_played_at.max(sample.recorded_at);

        let high_score_raised = sample.score > account.high_score;
        if high_score_raised {
            account.high_score = sample.score;
            account.high_score_at = Some(sample.recorded_at);
        }

        Ok(Some(Scored {
            account: account.clone(),
            high_score_raised,
        }))
    }
}
