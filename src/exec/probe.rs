// src/exec/probe.rs

//! Capability probes for the orchestration tool.

use std::time::Duration;

use tracing::{debug, info};

use crate::errors::{Result, StackguardError};

use super::backend::{CommandExecutor, CommandSpec};

/// Verify that `program` is on the search path and that `program <verb...>`
/// exits successfully within `timeout`.
///
/// Used as a gate before any stack operation is attempted.
pub async fn ensure_tool_available<E>(
    executor: &E,
    program: &str,
    verb: &[&str],
    timeout: Duration,
) -> Result<()>
where
    E: CommandExecutor + ?Sized,
{
    if !executor.program_exists(program) {
        return Err(StackguardError::ToolUnavailable(format!(
            "'{program}' not found on PATH"
        )));
    }
    debug!(program, "tool found on PATH");

    let spec = CommandSpec::new(program)
        .args(verb.iter().copied())
        .timeout(timeout)
        .capture();
    let shown = spec.to_string();

    let result = executor.run(spec).await.map_err(|e| {
        StackguardError::ToolUnavailable(format!("'{shown}' could not be run: {e}"))
    })?;

    if let Some(reason) = result.failure() {
        return Err(StackguardError::ToolUnavailable(format!(
            "'{shown}' failed: {reason}"
        )));
    }

    info!(
        program,
        version = %result.stdout.trim(),
        "orchestration tool available"
    );
    Ok(())
}
