use tracing_subscriber::{
    prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

#[allow(unused_imports)]
use tracing::{error, instrument, trace};

const DEFAULT_FILTER: &str = "wordhunt=info,tracing_unwrap=warn";

/// Logs go to stderr so they don't interleave with the board on stdout.
/// `RUST_LOG` overrides the default filter.
#[instrument]
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(DEFAULT_FILTER).expect("hard-coded env filter should be valid")
    });

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    trace!("finished");
}
