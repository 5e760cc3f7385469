// src/config/validate.rs

use std::collections::HashSet;
use std::time::Duration;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, StackguardError};
use crate::types::Stack;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = StackguardError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.backup, raw.stack))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_stacks(cfg)?;
    validate_global_config(cfg)?;
    validate_stacks(cfg)?;
    validate_backup(cfg)?;
    Ok(())
}

fn ensure_has_stacks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.stack.is_empty() {
        return Err(StackguardError::ConfigError(
            "config must contain at least one [stack.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.timeout < Duration::from_secs(1) {
        return Err(StackguardError::ConfigError(
            "[config].timeout must be at least 1s".to_string(),
        ));
    }
    if cfg.config.compose_program.trim().is_empty() {
        return Err(StackguardError::ConfigError(
            "[config].compose_program must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_stacks(cfg: &RawConfigFile) -> Result<()> {
    for (name, stack) in cfg.stack.iter() {
        if name.trim().is_empty() {
            return Err(StackguardError::ConfigError(
                "stack names must not be empty".to_string(),
            ));
        }
        if stack.dir.as_os_str().is_empty() {
            return Err(StackguardError::ConfigError(format!(
                "stack '{name}' has an empty `dir`"
            )));
        }
    }
    Ok(())
}

fn validate_backup(cfg: &RawConfigFile) -> Result<()> {
    let Some(backup) = &cfg.backup else {
        return Ok(());
    };
    if backup.program.trim().is_empty() {
        return Err(StackguardError::ConfigError(
            "[backup].program must not be empty".to_string(),
        ));
    }
    if backup.timeout.is_zero() {
        return Err(StackguardError::ConfigError(
            "[backup].timeout must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

impl ConfigFile {
    /// Resolve the stacks to operate on.
    ///
    /// An empty selection means every configured stack, in name order.
    /// Otherwise the selection order is kept; unknown or repeated names are
    /// rejected.
    pub fn select_stacks(&self, names: &[String]) -> Result<Vec<Stack>> {
        if names.is_empty() {
            return Ok(self
                .stack
                .iter()
                .map(|(name, stack)| Stack::new(name.clone(), stack.dir.clone()))
                .collect());
        }

        let mut seen = HashSet::new();
        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            if !seen.insert(name.as_str()) {
                return Err(StackguardError::ConfigError(format!(
                    "stack '{name}' selected more than once"
                )));
            }
            let stack = self.stack.get(name).ok_or_else(|| {
                StackguardError::ConfigError(format!("unknown stack '{name}'"))
            })?;
            selected.push(Stack::new(name.clone(), stack.dir.clone()));
        }
        Ok(selected)
    }
}
