// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file:
///
/// ```toml
/// [config]
/// timeout = "60s"
/// dry_run = false
/// compose_program = "docker"
///
/// [backup]
/// program = "restic"
/// args = ["backup", "/srv"]
///
/// [stack.web]
/// dir = "/srv/web"
/// ```
///
/// Use [`ConfigFile::try_from`] to get a validated [`ConfigFile`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// The external backup step; only needed by the `run` command.
    #[serde(default)]
    pub backup: Option<BackupSection>,

    /// All stacks from `[stack.<name>]`, keyed by stack name.
    #[serde(default)]
    pub stack: BTreeMap<String, StackConfig>,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub backup: Option<BackupSection>,
    pub stack: BTreeMap<String, StackConfig>,
}

impl ConfigFile {
    /// Build without validation. Only the validator should call this.
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        backup: Option<BackupSection>,
        stack: BTreeMap<String, StackConfig>,
    ) -> Self {
        Self {
            config,
            backup,
            stack,
        }
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSection {
    /// Stop grace period, and the base of the stop/start wall-clock bound.
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Log stop/start intent without touching any stack.
    #[serde(default)]
    pub dry_run: bool,

    /// Orchestration tool providing the `compose` subcommand.
    #[serde(default = "default_compose_program")]
    pub compose_program: String,
}

fn default_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_compose_program() -> String {
    "docker".to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            dry_run: false,
            compose_program: default_compose_program(),
        }
    }
}

/// `[backup]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackupSection {
    pub program: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Working directory; relative paths are resolved against the config
    /// file's directory.
    #[serde(default)]
    pub dir: Option<PathBuf>,

    #[serde(default = "default_backup_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_backup_timeout() -> Duration {
    Duration::from_secs(24 * 60 * 60)
}

/// `[stack.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StackConfig {
    /// Directory holding the stack's service-definition file.
    pub dir: PathBuf,
}

impl StackConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl BackupSection {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            dir: None,
            timeout: default_backup_timeout(),
        }
    }
}
