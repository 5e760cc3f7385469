// tests/config_loading.rs

use std::io::Write;
use std::time::Duration;

use stackguard::config::load_and_validate;
use stackguard::coordinator_options;
use stackguard::errors::StackguardError;
use stackguard_test_utils::builders::ConfigFileBuilder;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn loads_full_config_and_resolves_relative_dirs() {
    let file = write_config(
        r#"
[config]
timeout = "2m"
dry_run = true
compose_program = "podman"

[backup]
program = "restic"
args = ["backup", "data"]
timeout = "3h"

[stack.web]
dir = "web"

[stack.db]
dir = "/srv/db"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    let root = file.path().parent().unwrap();

    assert_eq!(cfg.config.timeout, Duration::from_secs(120));
    assert!(cfg.config.dry_run);
    assert_eq!(cfg.config.compose_program, "podman");
    assert_eq!(cfg.stack["web"].dir, root.join("web"));
    assert_eq!(cfg.stack["db"].dir, std::path::PathBuf::from("/srv/db"));

    let backup = cfg.backup.as_ref().unwrap();
    assert_eq!(backup.timeout, Duration::from_secs(3 * 60 * 60));
    assert_eq!(backup.dir.as_deref(), Some(root));
}

#[test]
fn defaults_apply_when_config_section_is_missing() {
    let file = write_config(
        r#"
[stack.web]
dir = "/srv/web"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.config.timeout, Duration::from_secs(60));
    assert!(!cfg.config.dry_run);
    assert_eq!(cfg.config.compose_program, "docker");
    assert!(cfg.backup.is_none());
}

#[test]
fn config_without_stacks_is_rejected() {
    let file = write_config("[config]\ntimeout = \"30s\"\n");

    match load_and_validate(file.path()) {
        Err(StackguardError::ConfigError(msg)) => assert!(msg.contains("[stack.<name>]")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn zero_timeout_is_rejected() {
    let raw = ConfigFileBuilder::new()
        .with_stack("web", "/srv/web")
        .with_timeout(Duration::ZERO)
        .build_raw();

    match stackguard::config::ConfigFile::try_from(raw) {
        Err(StackguardError::ConfigError(msg)) => assert!(msg.contains("timeout")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn sub_second_timeout_is_rejected() {
    let file = write_config(
        r#"
[config]
timeout = "500ms"

[stack.web]
dir = "/srv/web"
"#,
    );

    match load_and_validate(file.path()) {
        Err(StackguardError::ConfigError(msg)) => assert!(msg.contains("at least 1s")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn unknown_keys_are_toml_errors() {
    let file = write_config(
        r#"
[stack.web]
dir = "/srv/web"
restart = "always"
"#,
    );

    assert!(matches!(
        load_and_validate(file.path()),
        Err(StackguardError::TomlError(_))
    ));
}

#[test]
fn select_stacks_keeps_order_and_rejects_bad_names() {
    let cfg = ConfigFileBuilder::new()
        .with_stack("web", "/srv/web")
        .with_stack("db", "/srv/db")
        .with_stack("cache", "/srv/cache")
        .build();

    let all: Vec<String> = cfg.select_stacks(&[]).unwrap().into_iter().map(|s| s.name).collect();
    assert_eq!(all, vec!["cache", "db", "web"]);

    let picked: Vec<String> = cfg
        .select_stacks(&["web".to_string(), "db".to_string()])
        .unwrap()
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(picked, vec!["web", "db"]);

    assert!(matches!(
        cfg.select_stacks(&["mail".to_string()]),
        Err(StackguardError::ConfigError(msg)) if msg.contains("unknown stack 'mail'")
    ));
    assert!(matches!(
        cfg.select_stacks(&["web".to_string(), "web".to_string()]),
        Err(StackguardError::ConfigError(msg)) if msg.contains("more than once")
    ));
}

#[test]
fn cli_dry_run_overrides_config() {
    let cfg = ConfigFileBuilder::new()
        .with_stack("web", "/srv/web")
        .with_timeout(Duration::from_secs(45))
        .build();

    let options = coordinator_options(&cfg, true);
    assert!(options.dry_run);
    assert_eq!(options.command_bound(), Duration::from_secs(75));

    let cfg = ConfigFileBuilder::new()
        .with_stack("web", "/srv/web")
        .dry_run(true)
        .build();
    assert!(coordinator_options(&cfg, false).dry_run);
}
