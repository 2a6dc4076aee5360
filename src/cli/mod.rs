use std::path::PathBuf;

use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::{mpsc, watch},
};
use tracing::{error, info};

use crate::{
    accounts::{leaderboard::MAX_LIMIT, Account, Action, Backend},
    errors::Error,
    framework::AppData,
    games::wordhunt::{self, scores::ScoreClient, Input, RoundState, Runner},
};

pub mod terminal;
use terminal::Line;

#[derive(clap::Parser, Debug)]
#[command(version, about = "Find the hidden word before the clock runs out.")]
pub struct Cli {
    /// Keep accounts in memory instead of MongoDB.
    #[arg(long, global = true)]
    pub memory: bool,

    /// Config file. Defaults to $WORDHUNT_TOML, then ./wordhunt.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(clap::Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Play in the terminal. Without a username the game isn't saved.
    Play {
        #[arg(long, requires = "pin")]
        username: Option<String>,

        #[arg(long, requires = "username")]
        pin: Option<String>,

        /// Create the account instead of logging in.
        #[arg(long, requires = "username")]
        register: bool,
    },

    /// Show the best players.
    Leaderboard {
        #[arg(long)]
        limit: Option<usize>,

        /// Also show where this player stands.
        #[arg(long)]
        username: Option<String>,
    },

    /// Print the loaded config.
    Config,
}

impl Default for Command {
    fn default() -> Self {
        Self::Play {
            username: None,
            pin: None,
            register: false,
        }
    }
}

impl Command {
    pub async fn run<B: Backend + 'static>(self, data: &AppData<B>) -> Result<(), Error> {
        match self {
            Self::Play {
                username,
                pin,
                register,
            } => {
                let account = match (username, pin) {
                    (Some(username), Some(pin)) => {
                        let action = if register {
                            Action::Register
                        } else {
                            Action::Login
                        };
                        Some(data.accounts.authenticate(&username, &pin, action).await?)
                    }
                    _ => None,
                };

                play(data, account).await
            }
            Self::Leaderboard { limit, username } => leaderboard(data, limit, username).await,
            Self::Config => {
                println!("{:#?}", data.config);
                Ok(())
            }
        }
    }
}

#[tracing::instrument(skip_all)]
async fn play<B: Backend + 'static>(
    data: &AppData<B>,
    account: Option<Account>,
) -> Result<(), Error> {
    let high_score = account.as_ref().map_or(0, |account| account.high_score);

    if account.is_none() {
        info!("playing as guest");
    }

    let session = wordhunt::new_session(&data.config.game)?.with_high_score(high_score);
    let scores = account
        .as_ref()
        .map(|account| ScoreClient::new(data.accounts.clone(), account, &data.config.scores));

    let (runner, state) = Runner::new(session, scores, data.config.scores.flush_interval());
    let (tx, rx) = mpsc::channel(16);

    let game = tokio::task::spawn_local(runner.run(rx));
    let screen = tokio::task::spawn_local(draw(state, high_score));

    println!("{}", terminal::HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    'input: while let Some(line) = lines.next_line().await? {
        match terminal::parse_line(&line) {
            Ok(Line::Inputs(inputs)) => {
                for input in inputs {
                    if tx.send(input).await.is_err() || input == Input::Quit {
                        break 'input;
                    }
                }
            }
            Ok(Line::Help) => println!("{}", terminal::HELP),
            Ok(Line::Nothing) => (),
            Err(err) => println!("{err}"),
        }
    }

    drop(tx);

    if let Err(err) = game.await {
        error!(%err, "game task failed");
    }
    screen.abort();

    Ok(())
}

async fn draw(mut state: watch::Receiver<RoundState>, mut best: u32) {
    let mut last: Option<RoundState> = None;

    loop {
        {
            let current = state.borrow_and_update();
            best = best.max(current.score);

            if terminal::worth_redrawing(last.as_ref(), &current) {
                println!("{}", terminal::render(&current, best));
                last = Some(current.clone());
            }
        }

        if state.changed().await.is_err() {
            break;
        }
    }
}

#[tracing::instrument(skip(data))]
async fn leaderboard<B: Backend>(
    data: &AppData<B>,
    limit: Option<usize>,
    username: Option<String>,
) -> Result<(), Error> {
    let limit = limit.map_or_else(
        || data.config.leaderboard.limit(),
        |limit| limit.min(MAX_LIMIT),
    );

    let user = match &username {
        Some(username) => Some(data.accounts.account_by_username(username).await?.id),
        None => None,
    };

    let board = data.accounts.leaderboard(limit, user).await?;

    if board.entries.is_empty() {
        println!("no scores yet");
    }

    for entry in &board.entries {
        println!("{entry}");
    }

    match (username, board.user) {
        (Some(_), Some(standing)) if !standing.in_top => println!("...\n{standing}"),
        (Some(username), None) => println!("{username} hasn't scored yet"),
        _ => (),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;
    use pretty_assertions::assert_eq;

    #[test]
    fn plays_as_guest_by_default() {
        let cli = Cli::try_parse_from(["wordhunt"]).unwrap();
        assert!(!cli.memory);
        assert_eq!(cli.command.unwrap_or_default(), Command::default());
    }

    #[test]
    fn login_needs_both() {
        assert!(Cli::try_parse_from(["wordhunt", "play", "--username", "player"]).is_err());
        assert!(Cli::try_parse_from(["wordhunt", "play", "--register"]).is_err());

        let cli = Cli::try_parse_from([
            "wordhunt", "--memory", "play", "--username", "player", "--pin", "123456",
            "--register",
        ])
        .unwrap();

        assert!(cli.memory);
        assert_eq!(
            cli.command,
            Some(Command::Play {
                username: Some("player".to_owned()),
                pin: Some("123456".to_owned()),
                register: true,
            })
        );
    }

    #[test]
    fn leaderboard_args() {
        let cli = Cli::try_parse_from(["wordhunt", "leaderboard", "--limit", "5", "--memory"])
            .unwrap();

        assert!(cli.memory);
        assert_eq!(
            cli.command,
            Some(Command::Leaderboard {
                limit: Some(5),
                username: None,
            })
        );
    }
}
