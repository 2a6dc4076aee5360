#![warn(clippy::perf)]
#![warn(clippy::unwrap_used)]

use std::process::ExitCode;

use clap::Parser;
use thisslime::TracingError;
use tokio::task::LocalSet;
#[allow(unused_imports)]
use tracing::{debug, info, trace};

/// Player accounts, scores and the leaderboard.
mod accounts;

mod cli;
use cli::Cli;

mod errors;
use errors::Error;

mod framework;
use framework::{AppConfig, AppData};

mod games;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    framework::logging::init_tracing();

    info!("wordhunt {}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();

    match LocalSet::new().run_until(run(cli)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            err.trace();
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Error> {
    let path = cli.config.unwrap_or_else(AppConfig::path_from_env);
    let config = AppConfig::load(&path)?;
    let command = cli.command.unwrap_or_default();

    if cli.memory {
        let data = AppData::in_memory(config);
        let result = command.run(&data).await;
        data.close().await;
        result
    } else {
        let data = AppData::open(config).await?;
        let result = command.run(&data).await;
        data.close().await;
        result
    }
}
