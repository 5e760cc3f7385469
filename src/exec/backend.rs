// src/exec/backend.rs

//! Pluggable command executor abstraction.
//!
//! The lifecycle coordinator talks to a `CommandExecutor` instead of spawning
//! processes itself. This makes it easy to swap in a fake executor in tests
//! while keeping the production implementation in [`command`].
//!
//! - `RealCommandExecutor` is the implementation used by `stackguard`. It runs
//!   processes with `tokio::process` and bounds them with `tokio::time`.
//! - Tests can provide their own `CommandExecutor` that, for example, records
//!   every invocation and replies with scripted output.
//!
//! [`command`]: super::command

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::Duration;

use crate::errors::{Result, StackguardError};

use super::command::run_command;

/// What to do with one of the child's output streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Buffer the stream and return it in [`CommandResult`].
    #[default]
    Capture,
    /// Forward each line to the log as it arrives; nothing is returned.
    Stream,
}

/// A fully described external command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub dir: Option<PathBuf>,
    pub timeout: Duration,
    pub stdout: OutputMode,
    pub stderr: OutputMode,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            dir: None,
            timeout: Duration::from_secs(30),
            stdout: OutputMode::Capture,
            stderr: OutputMode::Capture,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Capture both stdout and stderr.
    pub fn capture(mut self) -> Self {
        self.stdout = OutputMode::Capture;
        self.stderr = OutputMode::Capture;
        self
    }

    /// Stream both stdout and stderr to the log.
    pub fn stream(mut self) -> Self {
        self.stdout = OutputMode::Stream;
        self.stderr = OutputMode::Stream;
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Outcome of one invocation.
///
/// A timeout is reported through `timed_out`, not as an error: the caller
/// decides what it means.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
    /// Exit code; `None` when the process was killed or ended by a signal.
    pub exit_code: Option<i32>,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    /// Human-readable reason for an unsuccessful run, or `None` on success.
    pub fn failure(&self) -> Option<String> {
        if self.success() {
            return None;
        }
        if self.timed_out {
            return Some("timed out".to_string());
        }
        let code = match self.exit_code {
            Some(code) => format!("exit code {code}"),
            None => "terminated by signal".to_string(),
        };
        match self.stderr.trim() {
            "" => Some(code),
            stderr => Some(format!("{code}: {stderr}")),
        }
    }

    /// Non-empty, whitespace-trimmed stdout lines in order.
    pub fn stdout_lines(&self) -> Vec<String> {
        non_empty_lines(&self.stdout)
    }
}

pub fn non_empty_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Trait abstracting how external commands are run.
///
/// Production code uses [`RealCommandExecutor`]; tests can provide their own
/// implementation that doesn't spawn real processes.
pub trait CommandExecutor: Send + Sync {
    /// Run `spec` to completion or until its timeout elapses.
    ///
    /// Errors are reserved for failures to run the program at all (spawn or
    /// wait errors). A non-zero exit or a timeout is returned as data.
    fn run(
        &self,
        spec: CommandSpec,
    ) -> Pin<Box<dyn Future<Output = Result<CommandResult>> + Send + '_>>;

    /// Whether `program` can be found on the search path.
    fn program_exists(&self, program: &str) -> bool;
}

/// Real executor used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealCommandExecutor;

impl RealCommandExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl CommandExecutor for RealCommandExecutor {
    fn run(
        &self,
        spec: CommandSpec,
    ) -> Pin<Box<dyn Future<Output = Result<CommandResult>> + Send + '_>> {
        Box::pin(async move { run_command(spec).await.map_err(StackguardError::from) })
    }

    fn program_exists(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}
