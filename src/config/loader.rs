// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Config file looked up when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "stackguard.toml";

/// Load a configuration file from a given path and return the raw
/// `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** validate. Use
/// [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file, resolve relative directories against the
/// file's location, and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let mut raw_config = load_from_path(path)?;
    resolve_relative_dirs(&mut raw_config, &config_root_dir(path));
    ConfigFile::try_from(raw_config)
}

/// Directory that relative paths in the config are resolved against.
///
/// A bare filename like `stackguard.toml` has an empty parent; the current
/// working directory is used then.
pub fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

fn resolve_relative_dirs(raw: &mut RawConfigFile, root: &Path) {
    for stack in raw.stack.values_mut() {
        if stack.dir.is_relative() {
            stack.dir = root.join(&stack.dir);
        }
    }
    if let Some(backup) = raw.backup.as_mut() {
        backup.dir = Some(match backup.dir.take() {
            Some(dir) if dir.is_relative() => root.join(dir),
            Some(dir) => dir,
            None => root.to_path_buf(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_filename_resolves_to_current_dir() {
        let root = config_root_dir(Path::new(DEFAULT_CONFIG_FILE));
        assert_eq!(root, std::env::current_dir().unwrap());
    }

    #[test]
    fn nested_path_resolves_to_parent() {
        let root = config_root_dir(Path::new("/etc/stackguard/stackguard.toml"));
        assert_eq!(root, PathBuf::from("/etc/stackguard"));
    }
}
