// src/logging.rs

//! `tracing` setup for the `sessiondag` binary.
//!
//! The filter is picked from, in order:
//! 1. `--log-level` (applies to every target)
//! 2. `SESSIONDAG_LOG`, in `EnvFilter` directive syntax, so
//!    `SESSIONDAG_LOG=info,sessiondag::solver=trace` works
//! 3. `info`
//!
//! Output goes to stderr; stdout carries the plan and session listings.

use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "SESSIONDAG_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Filter directive for the given CLI level and environment value.
///
/// An environment value that does not parse as a directive falls back to
/// the default, with a note on stderr (the subscriber is not up yet).
pub fn filter_directive(cli_level: Option<LogLevel>, env_value: Option<&str>) -> String {
    if let Some(level) = cli_level {
        return level.directive().to_string();
    }

    match env_value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) if EnvFilter::try_new(value).is_ok() => value.to_string(),
        Some(value) => {
            eprintln!("sessiondag: ignoring invalid {LOG_ENV_VAR}={value:?}");
            DEFAULT_DIRECTIVE.to_string()
        }
        None => DEFAULT_DIRECTIVE.to_string(),
    }
}

/// Install the global subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env_value = std::env::var(LOG_ENV_VAR).ok();
    let directive = filter_directive(cli_level, env_value.as_deref());

    fmt()
        .with_env_filter(EnvFilter::new(directive))
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(())
}
