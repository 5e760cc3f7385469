// src/config/mod.rs

//! Configuration loading and validation for stackguard.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate it and select stacks (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{DEFAULT_CONFIG_FILE, config_root_dir, load_and_validate, load_from_path};
pub use model::{BackupSection, ConfigFile, ConfigSection, RawConfigFile, StackConfig};
