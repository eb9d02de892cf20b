//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! Level priority:
//! 1. `-v` flag: debug
//! 2. `RADIRU_LOG` environment variable (e.g. "info", "debug")
//! 3. warn

use anyhow::{Result, anyhow};
use tracing_subscriber::fmt;

pub const LOG_ENV: &str = "RADIRU_LOG";

/// Install the global subscriber. Call once, before the first cycle.
pub fn init_logging(verbose: bool) -> Result<()> {
    let level = resolve_level(verbose, std::env::var(LOG_ENV).ok().as_deref());

    fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("installing log subscriber: {e}"))
}

fn resolve_level(verbose: bool, env_value: Option<&str>) -> tracing::Level {
    if verbose {
        return tracing::Level::DEBUG;
    }
    env_value
        .and_then(parse_level_str)
        .unwrap_or(tracing::Level::WARN)
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
