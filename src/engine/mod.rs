// src/engine/mod.rs

//! Backup-cycle driver.
//!
//! [`cycle::run_cycle`] drives a [`Coordinator`](crate::lifecycle::Coordinator)
//! through one store → stop → backup → start pass over the selected stacks
//! and collects the outcome in a [`CycleReport`].

pub mod cycle;
pub mod report;

pub use cycle::{backup_command, run_cycle};
pub use report::{BackupOutcome, CycleReport, PhaseResult, StackReport};
