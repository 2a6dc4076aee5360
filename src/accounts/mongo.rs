use futures::TryStreamExt;
use mongodb::{
    bson::{doc, DateTime, Document},
    error::{ErrorKind, WriteError, WriteFailure},
    options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument},
    Collection, Database, IndexModel,
};

use super::{
    backend::{Backend, Scored},
    leaderboard::TieBreak,
    Account, AccountId, ScoreSample, UsernameTakenError,
};

const DUPLICATE_KEY: i32 = 11000;

#[derive(Debug, Clone)]
pub struct MongoDb {
    accounts: Collection<Account>,
    scores: Collection<ScoreSample>,
}

impl MongoDb {
    pub fn new(db: &Database) -> Self {
        Self {
            accounts: db.collection("accounts"),
            scores: db.collection("scores"),
        }
    }

    #[tracing::instrument(skip_all)]
    pub async fn ensure_indexes(&self) -> Result<(), mongodb::error::Error> {
        let unique_username = IndexModel::builder()
            .keys(doc! { "username": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.accounts.create_index(unique_username, None).await?;

        let game_key = IndexModel::builder()
            .keys(doc! { "account": 1, "session": 1, "game": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.scores.create_index(game_key, None).await?;

        tracing::debug!("indexes ready");

        Ok(())
    }
}

fn sort(tie_break: TieBreak) -> Document {
    match tie_break {
        TieBreak::EarliestScore => doc! { "high_score": -1, "high_score_at": 1, "_id": 1 },
        TieBreak::FirstInserted => doc! { "high_score": -1, "_id": 1 },
    }
}

fn ahead_of(account: &Account, tie_break: TieBreak) -> Document {
    let score = i64::from(account.high_score);

    let mut ties = match tie_break {
        TieBreak::EarliestScore => vec![
            doc! { "high_score": score, "high_score_at": { "$lt": account.high_score_at } },
            doc! {
                "high_score": score,
                "high_score_at": account.high_score_at,
                "_id": { "$lt": account.id },
            },
        ],
        TieBreak::FirstInserted => vec![doc! { "high_score": score, "_id": { "$lt": account.id } }],
    };
    ties.push(doc! { "high_score": { "$gt": score } });

    doc! { "$or": ties }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(WriteError { code: DUPLICATE_KEY, .. }))
    )
}

impl Backend for MongoDb {
    type Error = mongodb::error::Error;

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, Self::Error> {
        self.accounts.find_one(doc! { "_id": id }, None).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, Self::Error> {
        self.accounts
            .find_one(doc! { "username": username }, None)
            .await
    }

    async fn top(&self, limit: usize, tie_break: TieBreak) -> Result<Vec<Account>, Self::Error> {
        self.accounts
            .find(
                doc! { "high_score": { "$gt": 0 } },
                FindOptions::builder()
                    .sort(sort(tie_break))
                    .limit(i64::try_from(limit).unwrap_or(i64::MAX))
                    .build(),
            )
            .await?
            .try_collect()
            .await
    }

    async fn count_ahead(
        &self,
        account: &Account,
        tie_break: TieBreak,
    ) -> Result<u64, Self::Error> {
        self.accounts
            .count_documents(ahead_of(account, tie_break), None)
            .await
    }

    async fn insert(
        &self,
        account: Account,
    ) -> Result<Result<(), UsernameTakenError>, Self::Error> {
        if self.find_by_username(&account.username).await?.is_some() {
            return Ok(Err(UsernameTakenError::new(account.username)));
        }

        // the unique index still catches a registration racing this one
        match self.accounts.insert_one(&account, None).await {
            Ok(_) => Ok(Ok(())),
            Err(err) if is_duplicate_key(&err) => {
                Ok(Err(UsernameTakenError::new(account.username)))
            }
            Err(err) => Err(err),
        }
    }

    async fn touch(&self, id: AccountId, at: DateTime) -> Result<(), Self::Error> {
        self.accounts
            .update_one(
                doc! { "_id": id },
                doc! { "$max": { "last_played_at": at } },
                None,
            )
            .await
            .map(|_| ())
    }

    async fn record_game(&self, sample: &ScoreSample) -> Result<u32, Self::Error> {
        let before = self
            .scores
            .find_one_and_update(
                doc! {
                    "account": sample.account,
                    "session": sample.session,
                    "game": i64::from(sample.game),
                },
                doc! {
                    "$max": {
                        "score": i64::from(sample.score),
                        "rounds_played": i64::from(sample.rounds_played),
                        "recorded_at": sample.recorded_at,
                    },
                    "$setOnInsert": { "username": sample.username.as_str() },
                },
                FindOneAndUpdateOptions::builder()
                    .upsert(true)
                    .return_document(ReturnDocument::Before)
                    .build(),
            )
            .await?;

        Ok(sample
            .rounds_played
            .saturating_sub(before.map_or(0, |record| record.rounds_played)))
    }

    async fn apply_score(
        &self,
        sample: &ScoreSample,
        rounds: u32,
    ) -> Result<Option<Scored>, Self::Error> {
        let score = i64::from(sample.score);

        let raised = self
            .accounts
            .update_one(
                doc! { "_id": sample.account, "high_score": { "$lt": score } },
                doc! { "$set": { "high_score": score, "high_score_at": sample.recorded_at } },
                None,
            )
            .await?;

        let account = self
            .accounts
            .find_one_and_update(
                doc! { "_id": sample.account },
                doc! {
                    "$inc": { "total_rounds_played": i64::from(rounds) },
                    "$max": { "last_played_at": sample.recorded_at },
                },
                FindOneAndUpdateOptions::builder()
                    .return_document(ReturnDocument::After)
                    .build(),
            )
            .await?;

        Ok(account.map(|account| Scored {
            account,
            high_score_raised: raised.modified_count > 0,
        }))
    }
}
