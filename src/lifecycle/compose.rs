// src/lifecycle/compose.rs

//! Compose verbs the coordinator issues against a stack directory.

use std::time::Duration;

use crate::exec::CommandSpec;
use crate::types::Stack;

/// Sub-verb used to check that the compose plugin works at all.
pub const VERSION_VERB: [&str; 2] = ["compose", "version"];

/// A compose invocation, independent of program name and timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeVerb {
    /// Names of services whose containers are currently running.
    RunningServices,
    /// Stop containers, giving each `grace` to shut down before killing.
    Stop { grace: Duration },
    Start,
    /// Services declared in the service-definition file.
    DeclaredServices,
    /// Every container of the stack with its state.
    ContainerStatus,
}

impl ComposeVerb {
    pub fn args(self) -> Vec<String> {
        let args: Vec<String> = match self {
            ComposeVerb::RunningServices => vec![
                "ps".into(),
                "--services".into(),
                "--filter".into(),
                "status=running".into(),
            ],
            ComposeVerb::Stop { grace } => vec![
                "stop".into(),
                "--timeout".into(),
                whole_secs_rounded_up(grace).to_string(),
            ],
            ComposeVerb::Start => vec!["start".into()],
            ComposeVerb::DeclaredServices => vec!["config".into(), "--services".into()],
            ComposeVerb::ContainerStatus => vec![
                "ps".into(),
                "--all".into(),
                "--format".into(),
                "{{.Name}}\t{{.State}}".into(),
            ],
        };
        std::iter::once("compose".to_string()).chain(args).collect()
    }

    /// Build the full command for `stack`.
    ///
    /// Read-only verbs capture their output; stop and start stream it so
    /// progress shows up in the log.
    pub fn command(self, program: &str, stack: &Stack, timeout: Duration) -> CommandSpec {
        let spec = CommandSpec::new(program)
            .args(self.args())
            .current_dir(stack.dir())
            .timeout(timeout);
        match self {
            ComposeVerb::Stop { .. } | ComposeVerb::Start => spec.stream(),
            _ => spec.capture(),
        }
    }
}

/// The tool takes whole seconds; a sub-second grace must not become zero.
fn whole_secs_rounded_up(grace: Duration) -> u64 {
    grace.as_secs() + u64::from(grace.subsec_nanos() > 0)
}
