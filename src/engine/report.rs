// src/engine/report.rs

//! Per-stack and per-cycle outcomes.

use std::fmt;

use crate::errors::StackguardError;
use crate::lifecycle::{LifecycleOp, OpOutcome};
use crate::types::StackState;

/// What happened to the backup step itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    /// Not run because a stop could not be verified or the cycle aborted.
    NotRun,
    DryRun,
    Succeeded,
    Failed(String),
}

/// Everything that happened to one stack during a cycle.
#[derive(Debug)]
pub struct StackReport {
    pub name: String,
    pub initial: StackState,
    pub stop: Option<PhaseResult>,
    pub start: Option<PhaseResult>,
}

/// Result of one lifecycle operation, kept for reporting.
#[derive(Debug)]
pub struct PhaseResult {
    pub op: LifecycleOp,
    pub result: Result<OpOutcome, StackguardError>,
}

impl StackReport {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            initial: StackState::Unknown,
            stop: None,
            start: None,
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = &StackguardError> {
        [&self.stop, &self.start]
            .into_iter()
            .flatten()
            .filter_map(|phase| phase.result.as_ref().err())
    }
}

#[derive(Debug)]
pub struct CycleReport {
    pub stacks: Vec<StackReport>,
    /// Status checks that failed while storing initial states.
    pub probe_errors: Vec<StackguardError>,
    pub backup: BackupOutcome,
}

impl CycleReport {
    /// True when the backup ran (or was dry-run) and every stop and start
    /// succeeded. Probe failures are advisory and do not count.
    pub fn is_success(&self) -> bool {
        matches!(self.backup, BackupOutcome::Succeeded | BackupOutcome::DryRun)
            && self.failures().next().is_none()
    }

    pub fn failures(&self) -> impl Iterator<Item = &StackguardError> {
        self.stacks.iter().flat_map(|stack| stack.errors())
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stack in &self.stacks {
            write!(f, "{}: initial={}", stack.name, stack.initial)?;
            for phase in [&stack.stop, &stack.start].into_iter().flatten() {
                match &phase.result {
                    Ok(outcome) => write!(f, ", {}={}", phase.op, outcome)?,
                    Err(e) => write!(f, ", {}=FAILED ({e})", phase.op)?,
                }
            }
            writeln!(f)?;
        }
        match &self.backup {
            BackupOutcome::NotRun => writeln!(f, "backup: not run"),
            BackupOutcome::DryRun => writeln!(f, "backup: dry-run"),
            BackupOutcome::Succeeded => writeln!(f, "backup: succeeded"),
            BackupOutcome::Failed(reason) => writeln!(f, "backup: FAILED ({reason})"),
        }
    }
}
