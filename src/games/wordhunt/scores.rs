use std::time::Duration;

use backoff::ExponentialBackoffBuilder;
use mongodb::bson::{oid::ObjectId, DateTime};
use thisslime::TracingError;
use tracing::{debug, error, warn};

use crate::{
    accounts::{self, Account, AccountId, Accounts, Backend, ScoreReceipt, ScoreSample},
    framework::config::ScoresConfig,
};

/// Cumulative score of one game at some point in time.
///
/// Ordered by game, then score, then rounds, so a later report of the same
/// game or any report of a later game compares greater.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScoreUpdate {
    pub game: u32,
    pub score: u32,
    pub rounds_played: u32,
}

#[derive(Debug)]
pub enum SaveOutcome {
    Saved(ScoreReceipt),
    /// The store kept failing; the update is dropped.
    Exhausted { attempts: u32, error: accounts::Error },
    /// The store refused the update; retrying wouldn't help.
    Rejected(accounts::Error),
}

impl SaveOutcome {
    pub const fn is_saved(&self) -> bool {
        matches!(self, Self::Saved(_))
    }
}

/// Sends score updates for one signed-in player, retrying store failures
/// with exponential backoff.
#[derive(Debug)]
pub struct ScoreClient<B> {
    accounts: Accounts<B>,
    account: AccountId,
    username: String,
    session: ObjectId,
    max_attempts: u32,
    base_delay: Duration,
}

impl<B> Clone for ScoreClient<B> {
    fn clone(&self) -> Self {
        Self {
            accounts: self.accounts.clone(),
            account: self.account,
            username: self.username.clone(),
            session: self.session,
            max_attempts: self.max_attempts,
            base_delay: self.base_delay,
        }
    }
}

impl<B: Backend> ScoreClient<B> {
    pub fn new(accounts: Accounts<B>, account: &Account, config: &ScoresConfig) -> Self {
        Self {
            accounts,
            account: account.id,
            username: account.username.clone(),
            session: ObjectId::new(),
            max_attempts: config.max_attempts.max(1),
            base_delay: config.base_delay(),
        }
    }

    fn sample(&self, update: ScoreUpdate) -> ScoreSample {
        ScoreSample {
            account: self.account,
            username: self.username.clone(),
            session: self.session,
            game: update.game,
            score: update.score,
            rounds_played: update.rounds_played,
            recorded_at: DateTime::now(),
        }
    }

    #[tracing::instrument(skip(self), fields(username = %self.username))]
    pub async fn save(&self, update: ScoreUpdate) -> SaveOutcome {
        let backoff = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.base_delay)
            .with_multiplier(2.0)
            .with_randomization_factor(0.0)
            .with_max_elapsed_time(None)
            .build();

        let max_attempts = self.max_attempts;
        let mut attempts = 0;

        let result = backoff::future::retry_notify(
            backoff,
            || {
                attempts += 1;
                let attempt = attempts;
                let sample = self.sample(update);

                async move {
                    self.accounts
                        .record_score(sample)
                        .await
                        .map_err(|err| match err.backoff() {
                            backoff::Error::Transient { err, .. } if attempt >= max_attempts => {
                                backoff::Error::permanent(err)
                            }
                            classified => classified,
                        })
                }
            },
            |err, after: Duration| warn!("{err}, retrying in {}ms...", after.as_millis()),
        )
        .await;

        match result {
            Ok(receipt) => {
                debug!(high_score = receipt.high_score, "score saved");
                SaveOutcome::Saved(receipt)
            }
            Err(error @ accounts::Error::Data(_)) => {
                error.trace();
                error!(attempts, "giving up on score save");
                SaveOutcome::Exhausted { attempts, error }
            }
            Err(error) => {
                error.trace();
                SaveOutcome::Rejected(error)
            }
        }
    }
}

/// Tracks which score updates the store has confirmed, so a periodic flush
/// can resend whatever was lost.
#[derive(Debug, Default)]
pub struct ScoreLedger {
    latest: Option<ScoreUpdate>,
    confirmed: Option<ScoreUpdate>,
    in_flight: u32,
}

impl ScoreLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&mut self, update: ScoreUpdate) {
        self.latest = self.latest.max(Some(update));
        self.in_flight += 1;
    }

    pub fn settled(&mut self, update: ScoreUpdate, outcome: &SaveOutcome) {
        self.in_flight = self.in_flight.saturating_sub(1);

        if outcome.is_saved() {
            self.confirmed = self.confirmed.max(Some(update));
        }
    }

    pub const fn in_flight(&self) -> u32 {
        self.in_flight
    }

    /// The newest update, if it is ahead of the last confirmed one and no
    /// save is currently running.
    pub fn pending(&self) -> Option<ScoreUpdate> {
        if self.in_flight > 0 {
            return None;
        }

        self.latest.filter(|latest| Some(*latest) > self.confirmed)
    }
}
