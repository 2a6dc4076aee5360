use std::{
    ops::RangeInclusive,
    sync::{Arc, OnceLock},
};

use arc_swap::ArcSwapOption;
use mongodb::bson::{oid::ObjectId, DateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thisslime::TracingError;
use tracing::{debug, info};

mod backend;
pub use backend::{Backend, InMemory, Scored};

pub mod leaderboard;
pub use leaderboard::{Leaderboard, Standing, TieBreak};

mod mongo;
pub use mongo::MongoDb;

pub type AccountId = ObjectId;

#[derive(Debug, thiserror::Error, TracingError)]
#[span]
pub enum Error {
    #[error(transparent)]
    InvalidUsername(#[from] InvalidUsernameError),

    #[error(transparent)]
    InvalidPin(#[from] InvalidPinError),

    #[error(transparent)]
    UsernameTaken(#[from] UsernameTakenError),

    #[error(transparent)]
    InvalidCredentials(#[from] InvalidCredentialsError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error("data error: {0}")]
    #[event(level = ERROR)]
    Data(String),
}

impl Error {
    pub fn data(error: impl std::fmt::Display) -> Self {
        Self::Data(error.to_string())
    }

    /// Only store errors are worth retrying.
    pub fn backoff(self) -> backoff::Error<Self> {
        match self {
            Self::Data(_) => backoff::Error::transient(self),
            _ => backoff::Error::permanent(self),
        }
    }
}

#[derive(Clone, Debug, thiserror::Error, TracingError)]
#[error("username must be 4 to 10 characters, got {length}")]
#[event(level = WARN)]
pub struct InvalidUsernameError {
    length: usize,
}

#[derive(Clone, Debug, thiserror::Error, TracingError)]
#[error("pin must be exactly 6 digits")]
#[event(level = WARN)]
pub struct InvalidPinError;

#[derive(Clone, Debug, thiserror::Error, TracingError)]
#[error("username {username} is already taken")]
#[event(level = WARN)]
pub struct UsernameTakenError {
    #[field(print = Display)]
    username: String,
}

impl UsernameTakenError {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

#[derive(Clone, Debug, thiserror::Error, TracingError)]
#[error("wrong username or pin for {username}")]
#[event(level = WARN)]
pub struct InvalidCredentialsError {
    #[field(print = Display)]
    username: String,
}

#[derive(Clone, Debug, thiserror::Error, TracingError)]
#[error("no account found for {key}")]
#[event(level = WARN)]
pub struct NotFoundError {
    #[field(print = Display)]
    key: String,
}

impl NotFoundError {
    pub fn new(key: impl ToString) -> Self {
        Self {
            key: key.to_string(),
        }
    }
}

const USERNAME_LENGTH: RangeInclusive<usize> = 4..=10;

fn pin_regex() -> &'static Regex {
    static PIN: OnceLock<Regex> = OnceLock::new();
    PIN.get_or_init(|| Regex::new(r"^\d{6}$").expect("hard-coded regex should be valid"))
}

/// A username and pin that have passed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    pin: String,
}

impl Credentials {
    pub fn new(username: &str, pin: &str) -> Result<Self, Error> {
        let username = username.trim();
        let length = username.chars().count();

        if !USERNAME_LENGTH.contains(&length) {
            return Err(InvalidUsernameError { length }.into());
        }

        if !pin_regex().is_match(pin) {
            return Err(InvalidPinError.into());
        }

        Ok(Self {
            username: username.to_owned(),
            pin: pin.to_owned(),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Login,
    Register,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "_id")]
    pub id: AccountId,
    pub username: String,
    pin: String,
    pub high_score: u32,
    pub high_score_at: Option<DateTime>,
    pub total_rounds_played: u32,
    pub created_at: DateTime,
    pub last_played_at: DateTime,
}

impl Account {
    fn new(credentials: Credentials, now: DateTime) -> Self {
        Self {
            id: ObjectId::new(),
            username: credentials.username,
            pin: credentials.pin,
            high_score: 0,
            high_score_at: None,
            total_rounds_played: 0,
            created_at: now,
            last_played_at: now,
        }
    }

    fn pin_matches(&self, credentials: &Credentials) -> bool {
        self.pin == credentials.pin
    }
}

/// One score report for a game. Samples of the same game share a `session`
/// and `game` key; later samples supersede earlier ones.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSample {
    pub account: AccountId,
    pub username: String,
    pub session: ObjectId,
    pub game: u32,
    pub score: u32,
    pub rounds_played: u32,
    pub recorded_at: DateTime,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScoreReceipt {
    pub high_score_updated: bool,
    pub high_score: u32,
}

/// Account storage with validation, score bookkeeping and a cached leaderboard.
#[derive(Debug)]
pub struct Accounts<B> {
    backend: Arc<B>,
    standings: Arc<ArcSwapOption<Vec<Standing>>>,
    tie_break: TieBreak,
}

impl<B> Clone for Accounts<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            standings: self.standings.clone(),
            tie_break: self.tie_break,
        }
    }
}

impl<B: Backend> Accounts<B> {
    pub fn new(backend: B, tie_break: TieBreak) -> Self {
        Self {
            backend: Arc::new(backend),
            standings: Arc::default(),
            tie_break,
        }
    }

    #[cfg(test)]
    pub(crate) fn backend(&self) -> &B {
        &self.backend
    }

    #[tracing::instrument(skip_all, fields(%username))]
    pub async fn register(&self, username: &str, pin: &str) -> Result<Account, Error> {
        let credentials = Credentials::new(username, pin)?;

        let account = Account::new(credentials, DateTime::now());

        self.backend
            .insert(account.clone())
            .await
            .map_err(Error::data)??;

        info!(id = %account.id, "registered account");

        Ok(account)
    }

    #[tracing::instrument(skip_all, fields(%username))]
    pub async fn login(&self, username: &str, pin: &str) -> Result<Account, Error> {
        let credentials = Credentials::new(username, pin)?;

        let invalid = || InvalidCredentialsError {
            username: credentials.username.clone(),
        };

        let mut account = self
            .backend
            .find_by_username(credentials.username())
            .await
            .map_err(Error::data)?
            .ok_or_else(invalid)?;

        if !account.pin_matches(&credentials) {
            return Err(invalid().into());
        }

        let now = DateTime::now();
        self.backend
            .touch(account.id, now)
            .await
            .map_err(Error::data)?;
        account.last_played_at = account.last_played_at.max(now);

        debug!(id = %account.id, "logged in");

        Ok(account)
    }

    pub async fn authenticate(
        &self,
        username: &str,
        pin: &str,
        action: Action,
    ) -> Result<Account, Error> {
        match action {
            Action::Login => self.login(username, pin).await,
            Action::Register => self.register(username, pin).await,
        }
    }

    pub async fn account(&self, id: AccountId) -> Result<Account, Error> {
        self.backend
            .find_by_id(id)
            .await
            .map_err(Error::data)?
            .ok_or_else(|| NotFoundError::new(id).into())
    }

    pub async fn account_by_username(&self, username: &str) -> Result<Account, Error> {
        self.backend
            .find_by_username(username)
            .await
            .map_err(Error::data)?
            .ok_or_else(|| NotFoundError::new(username).into())
    }

    /// Folds a score sample into the account. Rounds are counted as the
    /// increase over what the same game already reported, so sending a game
    /// twice doesn't count its rounds twice. Each step is a single update in
    /// the store, so overlapping saves never lower the high score.
    #[tracing::instrument(skip_all, fields(account = %sample.account, score = sample.score))]
    pub async fn record_score(&self, sample: ScoreSample) -> Result<ScoreReceipt, Error> {
        self.account(sample.account).await?;

        let rounds = self
            .backend
            .record_game(&sample)
            .await
            .map_err(Error::data)?;

        let Scored {
            account,
            high_score_raised,
        } = self
            .backend
            .apply_score(&sample, rounds)
            .await
            .map_err(Error::data)?
            .ok_or_else(|| NotFoundError::new(sample.account))?;

        if high_score_raised {
            info!(high_score = account.high_score, "new high score");
            self.standings.store(None);
        }

        Ok(ScoreReceipt {
            high_score_updated: high_score_raised,
            high_score: account.high_score,
        })
    }

    /// The top `limit` players, plus the position of `user` if they have a score.
    #[tracing::instrument(skip(self))]
    pub async fn leaderboard(
        &self,
        limit: usize,
        user: Option<AccountId>,
    ) -> Result<Leaderboard, Error> {
        let limit = limit.min(leaderboard::MAX_LIMIT);
        let standings = self.standings().await?;

        let entries: Vec<Standing> = standings.iter().take(limit).cloned().collect();

        let user = match user {
            Some(id) => self.standing_of(id, &entries).await?,
            None => None,
        };

        Ok(Leaderboard { entries, user })
    }

    async fn standings(&self) -> Result<Arc<Vec<Standing>>, Error> {
        if let Some(cached) = self.standings.load_full() {
            debug!("leaderboard cache hit");
            return Ok(cached);
        }

        let top = self
            .backend
            .top(leaderboard::MAX_LIMIT, self.tie_break)
            .await
            .map_err(Error::data)?;

        let standings = Arc::new(leaderboard::rank(top));
        self.standings.store(Some(standings.clone()));

        debug!(entries = standings.len(), "leaderboard cache refreshed");

        Ok(standings)
    }

    async fn standing_of(
        &self,
        id: AccountId,
        entries: &[Standing],
    ) -> Result<Option<Standing>, Error> {
        if let Some(entry) = entries.iter().find(|entry| entry.id == id) {
            return Ok(Some(entry.clone().in_top()));
        }

        let account = self.account(id).await?;
        if account.high_score == 0 {
            return Ok(None);
        }

        let ahead = self
            .backend
            .count_ahead(&account, self.tie_break)
            .await
            .map_err(Error::data)?;

        Ok(Some(Standing::new(ahead + 1, &account)))
    }
}
