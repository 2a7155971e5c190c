//! Tracing/logging initialization

use anyhow::{bail, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;

/// Initialize the tracing subscriber based on configuration.
///
/// `RUST_LOG` overrides the configured level when set.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))?;

    let subscriber = tracing_subscriber::registry().with(filter);

    match config.format.as_str() {
        "json" => {
            let fmt_layer = fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_current_span(true);
            subscriber.with(fmt_layer).try_init()?;
        }
        "pretty" => {
            let fmt_layer = fmt::layer().with_target(true).with_thread_ids(true);
            subscriber.with(fmt_layer).try_init()?;
        }
        other => bail!("unknown log format: {other}"),
    }

    Ok(())
}
