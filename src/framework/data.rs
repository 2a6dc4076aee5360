use mongodb::{options::ClientOptions, Client};
use thisslime::TracingError;
use tracing::{info, warn};

use super::config::AppConfig;
use crate::accounts::{Accounts, Backend, InMemory, MongoDb};

#[derive(Debug, thiserror::Error, TracingError)]
#[span]
pub enum Error {
    #[error("couldn't connect to db: {0}")]
    #[event(level = ERROR)]
    Connect(mongodb::error::Error),

    #[error("couldn't prepare db: {0}")]
    #[event(level = ERROR)]
    Setup(mongodb::error::Error),
}

/// Everything the app needs at runtime: config, and the account store with
/// the connection that backs it.
#[derive(Debug)]
pub struct AppData<B> {
    pub config: AppConfig,
    pub accounts: Accounts<B>,
    client: Option<Client>,
}

impl AppData<MongoDb> {
    #[tracing::instrument(skip_all, fields(db = %config.db.name))]
    pub async fn open(config: AppConfig) -> Result<Self, Error> {
        let mut options = ClientOptions::parse(config.db.url().as_ref())
            .await
            .map_err(Error::Connect)?;
        options.app_name = Some("wordhunt".to_owned());

        let client = Client::with_options(options).map_err(Error::Connect)?;
        let db = client.database(&config.db.name);

        let backend = MongoDb::new(&db);
        backend.ensure_indexes().await.map_err(Error::Setup)?;

        info!("connected to db");

        Ok(Self {
            accounts: Accounts::new(backend, config.leaderboard.tie_break),
            config,
            client: Some(client),
        })
    }
}

impl AppData<InMemory> {
    pub fn in_memory(config: AppConfig) -> Self {
        warn!("using in-memory storage, nothing will be kept");

        Self {
            accounts: Accounts::new(InMemory::new(), config.leaderboard.tie_break),
            config,
            client: None,
        }
    }
}

impl<B: Backend> AppData<B> {
    /// Shuts the db connection down, if there is one.
    pub async fn close(self) {
        if let Some(client) = self.client {
            client.shutdown().await;
            info!("db connection closed");
        }
    }
}
