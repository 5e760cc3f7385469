// src/engine/cycle.rs

//! One backup cycle: store, stop, back up, restart.

use tracing::{error, info, warn};

use crate::config::BackupSection;
use crate::engine::report::{BackupOutcome, CycleReport, PhaseResult, StackReport};
use crate::errors::Result;
use crate::exec::{CommandExecutor, CommandSpec};
use crate::lifecycle::{Coordinator, LifecycleOp, Sleeper};
use crate::types::Stack;

/// Build the invocation for the external backup step.
pub fn backup_command(backup: &BackupSection) -> CommandSpec {
    let spec = CommandSpec::new(&backup.program)
        .args(backup.args.iter().cloned())
        .timeout(backup.timeout)
        .stream();
    match &backup.dir {
        Some(dir) => spec.current_dir(dir),
        None => spec,
    }
}

/// Bracket the backup command with conditional stop/start of `stacks`.
///
/// Only an unavailable orchestration tool aborts the cycle, before any stack
/// is touched. Everything else is collected into the returned report:
///
/// - a failed status check stores `Unknown`, so that stack is left alone;
/// - a stop that cannot be verified skips the backup, and stacks that were
///   stopped are started again;
/// - a failed backup force-starts every stack regardless of its stored state.
pub async fn run_cycle<E, S>(
    coordinator: &mut Coordinator<E, S>,
    stacks: &[Stack],
    backup: &BackupSection,
) -> Result<CycleReport>
where
    E: CommandExecutor,
    S: Sleeper,
{
    coordinator.ensure_tool_available().await?;

    let mut reports: Vec<StackReport> = stacks.iter().map(|s| StackReport::new(&s.name)).collect();
    let mut probe_errors = Vec::new();

    for (stack, report) in stacks.iter().zip(reports.iter_mut()) {
        match coordinator.store(&stack.name, stack).await {
            Ok(state) => report.initial = state,
            Err(e) => probe_errors.push(e),
        }
    }

    let mut stop_failed = false;
    for (stack, report) in stacks.iter().zip(reports.iter_mut()) {
        let result = coordinator.smart_stop(&stack.name, stack).await;
        if let Err(e) = &result {
            error!(stack = %stack.name, error = %e, "stop failed");
            stop_failed = true;
        }
        report.stop = Some(PhaseResult {
            op: LifecycleOp::SmartStop,
            result,
        });
    }

    let backup_outcome = if stop_failed {
        warn!("skipping backup: not every stack could be stopped");
        BackupOutcome::NotRun
    } else if coordinator.options().dry_run {
        info!(cmd = %backup_command(backup), "dry-run: would run backup");
        BackupOutcome::DryRun
    } else {
        run_backup(coordinator.executor(), backup).await
    };

    let restart = match backup_outcome {
        BackupOutcome::Failed(_) => {
            warn!("backup failed; force-starting every stack");
            LifecycleOp::ForceStart
        }
        _ => LifecycleOp::SmartStart,
    };

    for (stack, report) in stacks.iter().zip(reports.iter_mut()) {
        let result = coordinator.apply(restart, &stack.name, stack).await;
        if let Err(e) = &result {
            error!(stack = %stack.name, error = %e, "{restart} failed");
        }
        report.start = Some(PhaseResult {
            op: restart,
            result,
        });
    }

    Ok(CycleReport {
        stacks: reports,
        probe_errors,
        backup: backup_outcome,
    })
}

async fn run_backup<E>(executor: &E, backup: &BackupSection) -> BackupOutcome
where
    E: CommandExecutor + ?Sized,
{
    let spec = backup_command(backup);
    info!(cmd = %spec, "running backup");

    match executor.run(spec).await {
        Err(e) => {
            error!(error = %e, "backup could not be run");
            BackupOutcome::Failed(e.to_string())
        }
        Ok(result) if result.timed_out => {
            let reason = format!("timed out after {}s", backup.timeout.as_secs());
            error!(%reason, "backup failed");
            BackupOutcome::Failed(reason)
        }
        Ok(result) => match result.failure() {
            Some(reason) => {
                error!(%reason, "backup failed");
                BackupOutcome::Failed(reason)
            }
            None => {
                info!("backup succeeded");
                BackupOutcome::Succeeded
            }
        },
    }
}
