use std::path::{Path, PathBuf};

use serde::Deserialize;
use thisslime::TracingError;
use tracing::{info, warn};

mod db;
pub use db::DbConfig;

mod game;
pub use game::{GameConfig, ScoresConfig};

mod leaderboard;
pub use leaderboard::LeaderboardConfig;

#[derive(Debug, thiserror::Error, TracingError)]
pub enum Error {
    #[error("file read error: {0}")]
    #[event(level = ERROR)]
    Read(config::ConfigError),

    #[error("parsing error: {0}")]
    #[event(level = ERROR)]
    Parse(config::ConfigError),
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub scores: ScoresConfig,
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub leaderboard: LeaderboardConfig,
}

impl AppConfig {
    const PATH_VAR: &'static str = "WORDHUNT_TOML";
    const DEFAULT_PATH: &'static str = "./wordhunt.toml";

    /// Config file location from `WORDHUNT_TOML`, or `./wordhunt.toml`.
    pub fn path_from_env() -> PathBuf {
        if let Ok(path) = std::env::var(Self::PATH_VAR) {
            info!(path, "looking for config file with {}...", Self::PATH_VAR);
            path.into()
        } else {
            warn!(path = Self::DEFAULT_PATH, "{} unset, using default path", Self::PATH_VAR);
            Self::DEFAULT_PATH.into()
        }
    }

    /// Loads the config file if it exists. Every field has a default, so a
    /// missing file yields the default configuration.
    #[tracing::instrument(skip_all, name = "config", fields(?path))]
    pub fn load(path: &Path) -> Result<Self, Error> {
        let config: Self = ::config::Config::builder()
            .add_source(::config::File::from(path).required(false))
            .build()
            .map_err(Error::Read)?
            .try_deserialize()
            .map_err(Error::Parse)?;

        info!("config loaded");

        Ok(config)
    }
}
