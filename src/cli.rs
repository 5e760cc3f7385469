// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::DEFAULT_CONFIG_FILE;

/// Command-line arguments for `stackguard`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "stackguard",
    version,
    about = "Pause container stacks around a backup and bring them back afterwards.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// Only operate on this stack (repeatable). Default: every configured stack.
    #[arg(long = "stack", value_name = "NAME")]
    pub stacks: Vec<String>,

    /// Log what would be stopped/started without doing it.
    ///
    /// Overrides `[config].dry_run` when set.
    #[arg(long)]
    pub dry_run: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `STACKGUARD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Full cycle: record state, stop running stacks, run the backup, restart.
    Run,
    /// Print the live state of each stack.
    Status,
    /// Record state and stop the stacks that are running.
    Stop,
    /// Start every selected stack regardless of its previous state.
    Start,
    /// Print declared services and container status of each stack.
    Services,
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
