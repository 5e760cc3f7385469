// src/lifecycle/mod.rs

//! Stack lifecycle coordination around a backup.
//!
//! The [`Coordinator`] records each stack's state before the backup
//! ([`Registry`]), stops only the stacks that were running, verifies the stop
//! by polling ([`StopPolicy`]), and afterwards restarts them, or force-starts
//! everything when the backup itself failed.
//!
//! - [`compose`] builds the orchestration-tool invocations.
//! - [`poll`] holds the settle/poll schedule and the injectable sleeper.

use std::fmt;

use crate::types::StackState;

pub mod compose;
pub mod coordinator;
pub mod poll;
pub mod registry;

pub use compose::ComposeVerb;
pub use coordinator::{Coordinator, CoordinatorOptions};
pub use poll::{PollSchedule, PollStep, Sleeper, StopPolicy, TokioSleeper};
pub use registry::Registry;

/// The three mutating operations.
///
/// They share one "issue command, interpret result" path and differ only in
/// gating and failure policy:
///
/// | op           | gated on stored `Running` | command failure         |
/// |--------------|---------------------------|-------------------------|
/// | `SmartStop`  | yes                       | logged, then verified   |
/// | `SmartStart` | yes                       | hard error              |
/// | `ForceStart` | no                        | hard error              |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleOp {
    SmartStop,
    SmartStart,
    ForceStart,
}

impl LifecycleOp {
    pub fn is_gated(self) -> bool {
        !matches!(self, LifecycleOp::ForceStart)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleOp::SmartStop => "stop",
            LifecycleOp::SmartStart => "start",
            LifecycleOp::ForceStart => "force-start",
        }
    }
}

impl fmt::Display for LifecycleOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a successful lifecycle operation went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpOutcome {
    /// Not attempted: the stack was not running before the backup.
    Skipped(StackState),
    /// Not attempted: dry-run mode.
    DryRun,
    /// Command issued and its effect accepted.
    Done,
}

impl fmt::Display for OpOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpOutcome::Skipped(state) => write!(f, "skipped (was {state})"),
            OpOutcome::DryRun => f.write_str("dry-run"),
            OpOutcome::Done => f.write_str("done"),
        }
    }
}
