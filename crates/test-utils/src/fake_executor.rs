use std::collections::{HashMap, HashSet, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use stackguard::errors::{Result, StackguardError};
use stackguard::exec::{CommandExecutor, CommandResult, CommandSpec};

/// Scripted reply for one invocation.
#[derive(Debug, Clone)]
pub enum FakeResponse {
    Completed(CommandResult),
    /// The program could not be run at all.
    SpawnError(String),
}

impl FakeResponse {
    pub fn ok(stdout: &str) -> Self {
        FakeResponse::Completed(CommandResult {
            stdout: stdout.to_string(),
            exit_code: Some(0),
            ..Default::default()
        })
    }

    pub fn exit(code: i32, stderr: &str) -> Self {
        FakeResponse::Completed(CommandResult {
            stderr: stderr.to_string(),
            exit_code: Some(code),
            ..Default::default()
        })
    }

    pub fn timed_out() -> Self {
        FakeResponse::Completed(CommandResult {
            timed_out: true,
            ..Default::default()
        })
    }

    pub fn spawn_error(message: &str) -> Self {
        FakeResponse::SpawnError(message.to_string())
    }

    /// `ps --services --filter status=running` output listing `services`.
    pub fn running(services: &[&str]) -> Self {
        let mut stdout = services.join("\n");
        stdout.push('\n');
        Self::ok(&stdout)
    }

    /// `ps --services --filter status=running` output with nothing running.
    pub fn none_running() -> Self {
        Self::ok("")
    }
}

#[derive(Debug, Default)]
struct Inner {
    /// Replies per key; the last reply of a queue repeats forever.
    responses: HashMap<String, VecDeque<FakeResponse>>,
    calls: Vec<CommandSpec>,
    missing_programs: HashSet<String>,
}

/// A fake executor that:
/// - records every invocation
/// - replies from per-verb scripts instead of spawning processes.
///
/// Invocations are keyed by their compose verb (`"ps"`, `"stop"`, `"start"`,
/// `"config"`, `"version"`) or, for anything that is not `<program>
/// compose ...`, by the program name. Unscripted keys succeed with empty
/// output.
///
/// Cloning shares the script and the call log, so a test can hand one clone
/// to the coordinator and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct FakeExecutor {
    inner: Arc<Mutex<Inner>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for `key`.
    pub fn on(self, key: &str, response: FakeResponse) -> Self {
        self.inner
            .lock()
            .unwrap()
            .responses
            .entry(key.to_string())
            .or_default()
            .push_back(response);
        self
    }

    /// Make `program_exists` report `program` as missing.
    pub fn without_program(self, program: &str) -> Self {
        self.inner
            .lock()
            .unwrap()
            .missing_programs
            .insert(program.to_string());
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Keys of all recorded invocations, in order.
    pub fn call_keys(&self) -> Vec<String> {
        self.calls().iter().map(key_of).collect()
    }

    pub fn count(&self, key: &str) -> usize {
        self.calls().iter().filter(|spec| key_of(spec) == key).count()
    }

    /// Number of invocations that could change a stack (stop or start).
    pub fn mutating_calls(&self) -> usize {
        self.count("stop") + self.count("start")
    }

    fn respond(&self, spec: CommandSpec) -> FakeResponse {
        let mut inner = self.inner.lock().unwrap();
        let key = key_of(&spec);
        inner.calls.push(spec);

        match inner.responses.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or_else(|| FakeResponse::ok("")),
            None => FakeResponse::ok(""),
        }
    }
}

fn key_of(spec: &CommandSpec) -> String {
    match spec.args.first().map(String::as_str) {
        Some("compose") => spec.args.get(1).cloned().unwrap_or_default(),
        _ => spec.program.clone(),
    }
}

impl CommandExecutor for FakeExecutor {
    fn run(
        &self,
        spec: CommandSpec,
    ) -> Pin<Box<dyn Future<Output = Result<CommandResult>> + Send + '_>> {
        let response = self.respond(spec);

        Box::pin(async move {
            match response {
                FakeResponse::Completed(result) => Ok(result),
                FakeResponse::SpawnError(message) => {
                    Err(StackguardError::Other(anyhow::anyhow!(message)))
                }
            }
        })
    }

    fn program_exists(&self, program: &str) -> bool {
        !self.inner.lock().unwrap().missing_programs.contains(program)
    }
}
