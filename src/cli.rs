// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{ArgGroup, Parser, ValueEnum};

/// Command-line arguments for `sessiondag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sessiondag",
    version,
    about = "Plan test sessions from job units and manage their checkpoints.",
    long_about = None,
    group(
        ArgGroup::new("action")
            .required(true)
            .args(["dry_run", "list_sessions", "inspect", "discard"])
    )
)]
pub struct CliArgs {
    /// Path to the plan file (TOML).
    ///
    /// Default: `Sessiondag.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Sessiondag.toml")]
    pub config: String,

    /// Select this job explicitly (repeatable). Overrides `[selection]`.
    #[arg(long = "job", value_name = "ID")]
    pub jobs: Vec<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SESSIONDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, solve and print the run list with its problem
    /// report. Nothing is executed.
    ///
    /// Exactly one of `--dry-run`, `--list-sessions`, `--inspect` and
    /// `--discard` must be given.
    #[arg(long)]
    pub dry_run: bool,

    /// List sessions stored under `[session].root`.
    #[arg(long)]
    pub list_sessions: bool,

    /// Print the stored state of one session.
    #[arg(long, value_name = "SESSION_ID")]
    pub inspect: Option<String>,

    /// Delete a stored session (e.g. after its checkpoint turned out corrupt).
    #[arg(long, value_name = "SESSION_ID")]
    pub discard: Option<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
