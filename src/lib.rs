// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod lifecycle;
pub mod logging;
pub mod types;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::cli::{CliArgs, Command};
use crate::config::{ConfigFile, load_and_validate};
use crate::engine::run_cycle;
use crate::errors::StackguardError;
use crate::exec::{CommandExecutor, RealCommandExecutor};
use crate::lifecycle::{Coordinator, CoordinatorOptions, Sleeper};
use crate::types::Stack;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and stack selection
/// - the lifecycle coordinator on the real executor
/// - the selected command
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;
    let stacks = cfg.select_stacks(&args.stacks)?;

    let options = coordinator_options(&cfg, args.dry_run);
    if options.dry_run {
        info!("dry-run: no stack will be stopped or started");
    }
    let mut coordinator = Coordinator::new(RealCommandExecutor::new(), options);

    match args.command {
        Command::Run => run_backup_cycle(&mut coordinator, &cfg, &stacks).await,
        Command::Status => print_status(&coordinator, &stacks).await,
        Command::Stop => stop_stacks(&mut coordinator, &stacks).await,
        Command::Start => force_start_stacks(&coordinator, &stacks).await,
        Command::Services => print_services(&coordinator, &stacks).await,
    }
}

/// Translate config (plus the CLI dry-run override) into coordinator options.
pub fn coordinator_options(cfg: &ConfigFile, dry_run: bool) -> CoordinatorOptions {
    CoordinatorOptions {
        timeout: cfg.config.timeout,
        dry_run: dry_run || cfg.config.dry_run,
        compose_program: cfg.config.compose_program.clone(),
        ..CoordinatorOptions::default()
    }
}

async fn run_backup_cycle<E, S>(
    coordinator: &mut Coordinator<E, S>,
    cfg: &ConfigFile,
    stacks: &[Stack],
) -> Result<()>
where
    E: CommandExecutor,
    S: Sleeper,
{
    let backup = cfg.backup.as_ref().ok_or_else(|| {
        StackguardError::ConfigError("`run` needs a [backup] section".to_string())
    })?;

    let report = run_cycle(coordinator, stacks, backup).await?;
    print!("{report}");

    for err in &report.probe_errors {
        warn!(error = %err, "status check failed; stack was left alone");
    }

    if !report.is_success() {
        bail!(
            "backup cycle finished with {} stack failure(s); backup: {:?}",
            report.failures().count(),
            report.backup
        );
    }
    Ok(())
}

async fn print_status<E, S>(coordinator: &Coordinator<E, S>, stacks: &[Stack]) -> Result<()>
where
    E: CommandExecutor,
    S: Sleeper,
{
    coordinator.ensure_tool_available().await?;

    let mut failures = 0;
    for stack in stacks {
        match coordinator.check(stack).await {
            Ok(state) => println!("{}\t{}", stack.name, state),
            Err(e) => {
                failures += 1;
                println!("{}\tunknown", stack.name);
                warn!(error = %e, "status check failed");
            }
        }
    }

    if failures > 0 {
        bail!("{failures} status check(s) failed");
    }
    Ok(())
}

async fn stop_stacks<E, S>(coordinator: &mut Coordinator<E, S>, stacks: &[Stack]) -> Result<()>
where
    E: CommandExecutor,
    S: Sleeper,
{
    coordinator.ensure_tool_available().await?;

    let mut failures = 0;
    for stack in stacks {
        if let Err(e) = coordinator.store(&stack.name, stack).await {
            warn!(error = %e, "status check failed; stack will be left alone");
        }
        match coordinator.smart_stop(&stack.name, stack).await {
            Ok(outcome) => println!("{}\t{}", stack.name, outcome),
            Err(e) => {
                failures += 1;
                println!("{}\tfailed: {}", stack.name, e);
            }
        }
    }

    if failures > 0 {
        bail!("{failures} stack(s) could not be stopped");
    }
    Ok(())
}

async fn force_start_stacks<E, S>(coordinator: &Coordinator<E, S>, stacks: &[Stack]) -> Result<()>
where
    E: CommandExecutor,
    S: Sleeper,
{
    coordinator.ensure_tool_available().await?;

    let mut failures = 0;
    for stack in stacks {
        match coordinator.force_start(&stack.name, stack).await {
            Ok(outcome) => println!("{}\t{}", stack.name, outcome),
            Err(e) => {
                failures += 1;
                println!("{}\tfailed: {}", stack.name, e);
            }
        }
    }

    if failures > 0 {
        bail!("{failures} stack(s) could not be started");
    }
    Ok(())
}

async fn print_services<E, S>(coordinator: &Coordinator<E, S>, stacks: &[Stack]) -> Result<()>
where
    E: CommandExecutor,
    S: Sleeper,
{
    coordinator.ensure_tool_available().await?;

    for stack in stacks {
        println!("{} ({})", stack.name, stack.dir.display());
        let services = coordinator.list_services(stack).await?;
        println!("  services:");
        for service in services {
            println!("    {service}");
        }
        let containers = coordinator.list_containers(stack).await?;
        println!("  containers:");
        for container in containers {
            println!("    {container}");
        }
    }
    Ok(())
}
