// src/exec/mod.rs

//! Process execution layer.
//!
//! This module runs external programs (the orchestration tool and the backup
//! command) with a working directory, a bounded timeout and per-stream
//! capture-or-stream handling. It does not retry and does not interpret
//! output; that is the lifecycle coordinator's job.
//!
//! - [`backend`] provides the `CommandExecutor` trait, the invocation and
//!   result types, and the production `RealCommandExecutor`.
//! - [`command`] owns the `tokio::process` runner used by the real executor.
//! - [`probe`] checks that the orchestration tool is usable at all.

pub mod backend;
pub mod command;
pub mod probe;

pub use backend::{
    CommandExecutor, CommandResult, CommandSpec, OutputMode, RealCommandExecutor,
    non_empty_lines,
};
pub use probe::ensure_tool_available;
