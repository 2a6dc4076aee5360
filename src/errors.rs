use thisslime::TracingError;

use crate::{accounts, framework, games::wordhunt::words_list};

#[derive(Debug, thiserror::Error, TracingError)]
#[span]
pub enum Error {
    #[error(transparent)]
    Config(#[from] framework::config::Error),

    #[error(transparent)]
    Data(#[from] framework::data::Error),

    #[error(transparent)]
    Accounts(#[from] accounts::Error),

    #[error(transparent)]
    Words(#[from] words_list::Error),

    #[error("terminal error: {0}")]
    #[event(level = ERROR)]
    Io(#[from] std::io::Error),
}
