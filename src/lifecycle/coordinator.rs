// src/lifecycle/coordinator.rs

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::errors::{Result, StackguardError};
use crate::exec::{CommandExecutor, CommandResult, ensure_tool_available};
use crate::lifecycle::compose::{ComposeVerb, VERSION_VERB};
use crate::lifecycle::poll::{PollStep, Sleeper, StopPolicy, TokioSleeper};
use crate::lifecycle::registry::Registry;
use crate::lifecycle::{LifecycleOp, OpOutcome};
use crate::types::{Stack, StackState, find_compose_file};

/// Timing and mode settings for a [`Coordinator`].
#[derive(Debug, Clone)]
pub struct CoordinatorOptions {
    /// Stop grace period handed to the tool, and the base of the stop/start
    /// wall-clock bound.
    pub timeout: Duration,
    /// Added to `timeout` to bound stop/start invocations.
    pub timeout_buffer: Duration,
    /// Bound for status checks and listings, independent of `timeout`.
    pub probe_timeout: Duration,
    pub dry_run: bool,
    pub compose_program: String,
    pub stop_policy: StopPolicy,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            timeout_buffer: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(30),
            dry_run: false,
            compose_program: "docker".to_string(),
            stop_policy: StopPolicy::default(),
        }
    }
}

impl CoordinatorOptions {
    /// Wall-clock bound for stop and start commands.
    pub fn command_bound(&self) -> Duration {
        self.timeout + self.timeout_buffer
    }
}

/// Records stack states before a backup and decides how to stop and restart
/// them.
///
/// Sequential by construction: every operation runs to completion before the
/// next, and only [`Coordinator::store`] (which takes `&mut self`) writes the
/// registry.
pub struct Coordinator<E, S = TokioSleeper> {
    executor: E,
    sleeper: S,
    options: CoordinatorOptions,
    registry: Registry,
}

impl<E: CommandExecutor> Coordinator<E, TokioSleeper> {
    pub fn new(executor: E, options: CoordinatorOptions) -> Self {
        Self::with_sleeper(executor, TokioSleeper, options)
    }
}

impl<E, S> Coordinator<E, S>
where
    E: CommandExecutor,
    S: Sleeper,
{
    pub fn with_sleeper(executor: E, sleeper: S, options: CoordinatorOptions) -> Self {
        Self {
            executor,
            sleeper,
            options,
            registry: Registry::new(),
        }
    }

    pub fn options(&self) -> &CoordinatorOptions {
        &self.options
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Fail with `ToolUnavailable` unless the orchestration tool is on the
    /// PATH and its compose subcommand works.
    pub async fn ensure_tool_available(&self) -> Result<()> {
        ensure_tool_available(
            &self.executor,
            &self.options.compose_program,
            &VERSION_VERB,
            self.options.probe_timeout,
        )
        .await
    }

    /// Observe the stack's current liveness.
    ///
    /// `NotFound` when the directory has no service-definition file. An
    /// error means the state is `Unknown`. Never touches the registry.
    pub async fn check(&self, stack: &Stack) -> Result<StackState> {
        if find_compose_file(stack.dir()).is_none() {
            debug!(stack = %stack.name, dir = %stack.dir.display(), "no service-definition file");
            return Ok(StackState::NotFound);
        }

        let result = self.query(ComposeVerb::RunningServices, stack).await?;
        let running = result.stdout_lines();
        let state = if running.is_empty() {
            StackState::Stopped
        } else {
            StackState::Running
        };
        debug!(stack = %stack.name, ?running, %state, "checked stack");
        Ok(state)
    }

    /// Check the stack and record the outcome under `name`.
    ///
    /// On failure `Unknown` is recorded and the error is still returned.
    pub async fn store(&mut self, name: &str, stack: &Stack) -> Result<StackState> {
        match self.check(stack).await {
            Ok(state) => {
                info!(stack = name, %state, "stored initial state");
                self.registry.record(name, state);
                Ok(state)
            }
            Err(e) => {
                warn!(stack = name, error = %e, "status check failed; storing unknown");
                self.registry.record(name, StackState::Unknown);
                Err(e)
            }
        }
    }

    pub fn stored_state(&self, name: &str) -> StackState {
        self.registry.get(name)
    }

    pub async fn smart_stop(&self, name: &str, stack: &Stack) -> Result<OpOutcome> {
        self.apply(LifecycleOp::SmartStop, name, stack).await
    }

    pub async fn smart_start(&self, name: &str, stack: &Stack) -> Result<OpOutcome> {
        self.apply(LifecycleOp::SmartStart, name, stack).await
    }

    pub async fn force_start(&self, name: &str, stack: &Stack) -> Result<OpOutcome> {
        self.apply(LifecycleOp::ForceStart, name, stack).await
    }

    /// Gate, issue and interpret one lifecycle operation.
    pub async fn apply(&self, op: LifecycleOp, name: &str, stack: &Stack) -> Result<OpOutcome> {
        if op.is_gated() {
            let stored = self.stored_state(name);
            if !stored.is_running() {
                info!(
                    stack = name,
                    op = %op,
                    state = %stored,
                    "skipping {op}: stack was not running before backup"
                );
                return Ok(OpOutcome::Skipped(stored));
            }
        }

        if self.options.dry_run {
            info!(stack = name, op = %op, "dry-run: would {op} stack");
            return Ok(OpOutcome::DryRun);
        }

        let verb = match op {
            LifecycleOp::SmartStop => ComposeVerb::Stop {
                grace: self.options.timeout,
            },
            LifecycleOp::SmartStart | LifecycleOp::ForceStart => ComposeVerb::Start,
        };
        let bound = self.options.command_bound();
        let spec = verb.command(&self.options.compose_program, stack, bound);

        info!(stack = name, op = %op, cmd = %spec, "issuing {op}");
        let result = self.executor.run(spec).await;

        match op {
            LifecycleOp::SmartStop => {
                log_stop_result(name, bound, &result);
                self.verify_stopped(name, stack).await
            }
            LifecycleOp::SmartStart | LifecycleOp::ForceStart => {
                interpret_start(op, name, bound, result)
            }
        }
    }

    /// Settle, then poll until the stack no longer reports running containers.
    ///
    /// A failed poll is inconclusive and does not count as stopped.
    async fn verify_stopped(&self, name: &str, stack: &Stack) -> Result<OpOutcome> {
        let policy = self.options.stop_policy;

        for step in policy.schedule() {
            match step {
                PollStep::Wait(delay) => self.sleeper.sleep(delay).await,
                PollStep::Poll(attempt) => match self.check(stack).await {
                    Ok(state) if !state.is_running() => {
                        info!(stack = name, attempt, %state, "stack stopped");
                        return Ok(OpOutcome::Done);
                    }
                    Ok(_) => {
                        info!(
                            stack = name,
                            attempt,
                            max_attempts = policy.attempts,
                            "containers still running"
                        );
                    }
                    Err(e) => {
                        warn!(
                            stack = name,
                            attempt,
                            error = %e,
                            "status check failed while verifying stop"
                        );
                    }
                },
            }
        }

        warn!(
            stack = name,
            attempts = policy.attempts,
            "containers still running after {} attempts",
            policy.attempts
        );
        Err(StackguardError::StopVerificationExhausted {
            stack: name.to_string(),
            attempts: policy.attempts,
        })
    }

    /// Services declared in the stack's service-definition file.
    pub async fn list_services(&self, stack: &Stack) -> Result<Vec<String>> {
        Ok(self
            .query(ComposeVerb::DeclaredServices, stack)
            .await?
            .stdout_lines())
    }

    /// One `name<TAB>state` line per container of the stack.
    pub async fn list_containers(&self, stack: &Stack) -> Result<Vec<String>> {
        Ok(self
            .query(ComposeVerb::ContainerStatus, stack)
            .await?
            .stdout_lines())
    }

    /// Run a read-only verb; any failure to get clean output is a probe error.
    async fn query(&self, verb: ComposeVerb, stack: &Stack) -> Result<CommandResult> {
        let spec = verb.command(
            &self.options.compose_program,
            stack,
            self.options.probe_timeout,
        );
        let probe_error = |reason: String| StackguardError::Probe {
            stack: stack.name.clone(),
            reason,
        };

        let result = self
            .executor
            .run(spec)
            .await
            .map_err(|e| probe_error(e.to_string()))?;

        match result.failure() {
            Some(reason) => Err(probe_error(reason)),
            None => Ok(result),
        }
    }
}

fn log_stop_result(name: &str, bound: Duration, result: &Result<CommandResult>) {
    match result {
        Ok(r) if r.timed_out => warn!(
            stack = name,
            timeout_secs = bound.as_secs(),
            "stop command timed out; verifying state anyway"
        ),
        Ok(r) => match r.failure() {
            Some(reason) => warn!(
                stack = name,
                %reason,
                "stop command failed; verifying state anyway"
            ),
            None => debug!(stack = name, "stop command finished"),
        },
        Err(e) => warn!(
            stack = name,
            error = %e,
            "stop command could not be run; verifying state anyway"
        ),
    }
}

fn interpret_start(
    op: LifecycleOp,
    name: &str,
    bound: Duration,
    result: Result<CommandResult>,
) -> Result<OpOutcome> {
    let result = result.map_err(|e| StackguardError::StartFailure {
        stack: name.to_string(),
        op: op.as_str(),
        reason: e.to_string(),
    })?;

    if result.timed_out {
        warn!(stack = name, op = %op, timeout_secs = bound.as_secs(), "{op} timed out");
        return Err(StackguardError::StartTimeout {
            stack: name.to_string(),
            op: op.as_str(),
            secs: bound.as_secs(),
        });
    }

    if let Some(reason) = result.failure() {
        warn!(stack = name, op = %op, %reason, "{op} failed");
        return Err(StackguardError::StartFailure {
            stack: name.to_string(),
            op: op.as_str(),
            reason,
        });
    }

    info!(stack = name, op = %op, "stack started");
    Ok(OpOutcome::Done)
}
