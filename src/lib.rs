// src/lib.rs

pub mod agent;
pub mod cli;
pub mod config;
pub mod console;
pub mod coordinator;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod task;
pub mod transport;
pub mod types;

use std::sync::Arc;

use anyhow::{Result, anyhow};
use tracing::{debug, info, warn};

use crate::cli::{CliArgs, Command, TargetArgs};
use crate::config::{ConfigFile, load_or_default};
use crate::console::StdoutConsole;
use crate::coordinator::{Coordinator, Route, StepOptions, StepValue};
use crate::transport::TcpTransport;
use crate::types::LogMode;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the route (direct or through an agent) and the stdout console
/// - the agent server and Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_or_default(args.config.as_deref())?;

    match args.command {
        Command::Agent { listen } => {
            let addr = listen.unwrap_or_else(|| cfg.agent.listen.clone());
            agent::bind_and_serve(&addr, shutdown_signal()).await?;
        }
        Command::Run {
            target,
            encoding,
            return_stdout,
            return_status,
            per_line,
            cmd,
        } => {
            let log_mode = if per_line {
                LogMode::PerLine
            } else {
                cfg.coordinator.log_mode
            };
            let coordinator = coordinator_for(&cfg, &target, log_mode);
            let options = StepOptions {
                return_stdout,
                return_status,
                encoding,
            };
            let value = coordinator.run_command(cmd, options).await?;
            print_step_value(&value);
        }
        Command::Build { target, cmd } => {
            let coordinator = coordinator_for(&cfg, &target, cfg.coordinator.log_mode);
            coordinator.run_build_step(cmd).await?;
        }
        Command::Task { name, target } => {
            let task = cfg
                .task(&name)
                .ok_or_else(|| anyhow!("no [task.{name}] in config"))?;
            let coordinator = coordinator_for(&cfg, &target, cfg.coordinator.log_mode);
            let value = coordinator.run_step(task).await?;
            print_step_value(&value);
        }
        Command::Check => print_check(&cfg),
    }

    Ok(())
}

/// Pick the route: `--direct` wins, then `--agent`, then `[coordinator].agent`.
fn coordinator_for(cfg: &ConfigFile, target: &TargetArgs, log_mode: LogMode) -> Coordinator {
    let agent = if target.direct {
        None
    } else {
        target
            .agent
            .clone()
            .or_else(|| cfg.coordinator.agent.clone())
    };

    let route = match agent {
        Some(addr) => {
            if log_mode == LogMode::PerLine {
                warn!(agent = %addr, "per_line log mode only applies to direct execution; output will be logged once the call returns");
            }
            Route::remote(TcpTransport::new(addr))
        }
        None => Route::direct(log_mode),
    };

    debug!(?route, "coordinator route selected");
    Coordinator::new(route, Arc::new(StdoutConsole))
}

fn print_step_value(value: &StepValue) {
    match value {
        StepValue::Stdout(text) => println!("{text}"),
        StepValue::Status(code) => println!("{code}"),
        StepValue::Completed => {}
    }
}

/// Resolves on Ctrl-C. If the signal handler cannot be installed the agent
/// keeps running until killed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Ctrl+C received");
}

/// Simple check output: print coordinator/agent settings and tasks.
fn print_check(cfg: &ConfigFile) {
    println!("remote-task check");
    match cfg.coordinator.agent.as_deref() {
        Some(agent) => println!("  coordinator.agent = {agent}"),
        None => println!("  coordinator.agent = (direct)"),
    }
    println!("  coordinator.log_mode = {:?}", cfg.coordinator.log_mode);
    println!("  agent.listen = {}", cfg.agent.listen);
    println!();

    let tasks: Vec<_> = cfg.tasks().collect();
    println!("tasks ({}):", tasks.len());
    for (name, task) in tasks {
        println!("  - {name}");
        println!("      command: {:?}", task.command());
        if task.return_stdout() {
            println!("      return_stdout: true");
        }
        if task.return_status() {
            println!("      return_status: true");
        }
        if let Some(encoding) = task.encoding() {
            println!("      encoding: {encoding}");
        }
    }

    debug!("check complete (no execution)");
}
