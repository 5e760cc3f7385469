// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StackguardError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// The orchestration tool is missing or its compose subcommand is broken.
    #[error("Tool unavailable: {0}")]
    ToolUnavailable(String),

    /// The liveness check for a stack could not be executed.
    #[error("[{stack}] status check failed: {reason}")]
    Probe { stack: String, reason: String },

    /// Stop was issued but polling kept observing running containers.
    #[error("[{stack}] containers still running after {attempts} attempts")]
    StopVerificationExhausted { stack: String, attempts: u32 },

    #[error("[{stack}] {op} timed out after {secs}s")]
    StartTimeout {
        stack: String,
        op: &'static str,
        secs: u64,
    },

    #[error("[{stack}] {op} failed: {reason}")]
    StartFailure {
        stack: String,
        op: &'static str,
        reason: String,
    },

    /// The external backup command failed or timed out.
    #[error("Backup failed: {0}")]
    Backup(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StackguardError {
    /// Name of the stack this error is about, if any.
    pub fn stack(&self) -> Option<&str> {
        match self {
            StackguardError::Probe { stack, .. }
            | StackguardError::StopVerificationExhausted { stack, .. }
            | StackguardError::StartTimeout { stack, .. }
            | StackguardError::StartFailure { stack, .. } => Some(stack),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, StackguardError>;
