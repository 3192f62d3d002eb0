//! Diagnostics go to stderr through `tracing`; stdout is left to command
//! output such as `test-path` JSON.
//!
//! `clay-core` and `clay-adapters` only emit events. The filter comes from
//! `RUST_LOG` when set, otherwise from [`GlobalArgs::log_level`] applied to
//! the three Clay crates.

use std::io::IsTerminal as _;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::GlobalArgs;

const CLAY_TARGETS: [&str; 3] = ["clay", "clay_core", "clay_adapters"];

pub fn init_logging(args: &GlobalArgs) -> anyhow::Result<()> {
    let level = args.log_level();
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(directives(level)))?;

    // targets from debug level up
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(!args.no_color && std::io::stderr().is_terminal())
        .with_target(level >= LevelFilter::DEBUG)
        .without_time();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("cannot install log subscriber: {e}"))
}

fn directives(level: LevelFilter) -> String {
    CLAY_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}
