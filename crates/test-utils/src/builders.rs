#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use stackguard::config::{BackupSection, ConfigFile, ConfigSection, RawConfigFile, StackConfig};
use stackguard::lifecycle::{Coordinator, CoordinatorOptions};
use stackguard::types::Stack;
use tempfile::TempDir;

use crate::fake_executor::FakeExecutor;
use crate::sleeper::RecordingSleeper;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                backup: None,
                stack: BTreeMap::new(),
            },
        }
    }

    pub fn with_stack(mut self, name: &str, dir: impl AsRef<Path>) -> Self {
        self.config
            .stack
            .insert(name.to_string(), StackConfig::new(dir.as_ref()));
        self
    }

    pub fn with_backup(mut self, program: &str, args: &[&str]) -> Self {
        let mut backup = BackupSection::new(program);
        backup.args = args.iter().map(|a| a.to_string()).collect();
        self.config.backup = Some(backup);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.config.timeout = timeout;
        self
    }

    pub fn dry_run(mut self, val: bool) -> Self {
        self.config.config.dry_run = val;
        self
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A stack backed by a temporary directory holding a `compose.yaml`.
///
/// Keep the returned `TempDir` alive for as long as the stack is used.
pub fn stack_fixture(name: &str) -> (TempDir, Stack) {
    let dir = tempfile::tempdir().expect("creating stack dir");
    std::fs::write(dir.path().join("compose.yaml"), "services: {}\n")
        .expect("writing compose.yaml");
    let stack = Stack::new(name, dir.path());
    (dir, stack)
}

/// A coordinator over a fake executor and a recording sleeper.
///
/// Returns clones of both so the test can inspect them afterwards.
pub fn fake_coordinator(
    executor: FakeExecutor,
    dry_run: bool,
) -> (
    Coordinator<FakeExecutor, RecordingSleeper>,
    FakeExecutor,
    RecordingSleeper,
) {
    let sleeper = RecordingSleeper::new();
    let options = CoordinatorOptions {
        dry_run,
        ..CoordinatorOptions::default()
    };
    let coordinator = Coordinator::with_sleeper(executor.clone(), sleeper.clone(), options);
    (coordinator, executor, sleeper)
}
