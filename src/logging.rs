//! Progress and diagnostic output
//!
//! Everything goes to stderr so that stdout only carries the new revision ID.
//! The level comes from `BITAR_LOG` (`EnvFilter` syntax, e.g. `debug` or
//! `bitar=trace`) and defaults to `info`, which reports each source and each
//! imported path.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_ENV_VAR: &str = "BITAR_LOG";

const DEFAULT_LEVEL: &str = "info";

pub fn init_logging() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(build_env_filter())
        .with(
            fmt::layer()
                .without_time()
                .with_target(false)
                .with_ansi(false)
                .with_writer(std::io::stderr),
        )
        .try_init()?;

    Ok(())
}

fn build_env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
}
