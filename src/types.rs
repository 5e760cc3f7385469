use std::fmt;
use std::path::{Path, PathBuf};

/// Last observed liveness of a stack's containers.
///
/// `Unknown` is both the default and the result of any failed probe; stop and
/// start decisions treat it as "leave the stack alone".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StackState {
    Running,
    Stopped,
    NotFound,
    #[default]
    Unknown,
}

impl StackState {
    pub fn is_running(self) -> bool {
        self == StackState::Running
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StackState::Running => "running",
            StackState::Stopped => "stopped",
            StackState::NotFound => "not found",
            StackState::Unknown => "unknown",
        }
    }
}

impl fmt::Display for StackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named group of services managed from one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stack {
    pub name: String,
    pub dir: PathBuf,
}

impl Stack {
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Service-definition file names recognised in a stack directory.
pub const COMPOSE_FILE_NAMES: [&str; 4] = [
    "compose.yaml",
    "compose.yml",
    "docker-compose.yaml",
    "docker-compose.yml",
];

/// Return the first service-definition file found in `dir`, if any.
pub fn find_compose_file(dir: &Path) -> Option<PathBuf> {
    COMPOSE_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
}
