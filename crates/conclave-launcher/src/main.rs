//! # conclave
//!
//! Fleet launcher: spawns the specialist servers and the supervisor as
//! child processes, waits for each to report healthy before starting
//! the next, restarts any that die, and shuts the fleet down cleanly on
//! `SIGINT`/`SIGTERM` or `conclave --stop`. Styled after the teacher's
//! `cli` binary (`clap` derive CLI, global args with `env` fallbacks,
//! daemon start/stop lifecycle) but scoped to running a fleet of our
//! own processes rather than a single agent host.

mod config;
mod process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::FleetConfig;
use process::ManagedProcess;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "conclave")]
#[command(version, about = "Launch and supervise the Conclave fleet", long_about = None)]
struct Cli {
    /// Host the specialist servers and supervisor bind to.
    #[arg(long, global = true, env = "CONCLAVE_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, env = "CONCLAVE_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Path to the PID file (overrides uid-based default).
    #[arg(long, global = true, env = "CONCLAVE_PID_FILE")]
    pid_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the fleet in the foreground (default if no subcommand is given).
    Start,
    /// Stop a running fleet by PID file.
    Stop,
    /// Report whether a fleet appears to be running.
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&cli.log_level))
        .init();

    let pid_file = cli.pid_file.clone().unwrap_or_else(config::pid_file_path);

    match cli.command.unwrap_or(Commands::Start) {
        Commands::Start => start(&cli.host, &pid_file).await,
        Commands::Stop => stop(&pid_file).await,
        Commands::Status => status(&pid_file).await,
    }
}

async fn start(host: &str, pid_file: &std::path::Path) -> Result<()> {
    if let Some(pid) = process::read_pid_file(pid_file) {
        if process::process_exists(pid) {
            anyhow::bail!("a fleet already appears to be running (pid {pid}, pid file {pid_file:?})");
        }
        warn!(pid, "stale PID file found, removing");
        process::remove_pid_file(pid_file)?;
    }

    let config = FleetConfig::default();
    let mut children: Vec<ManagedProcess> = Vec::new();

    for specialist in &config.specialists {
        let mut proc = ManagedProcess::new(
            specialist.name.clone(),
            specialist.binary.clone(),
            vec!["--port".to_string(), specialist.port.to_string(), "--host".to_string(), host.to_string()],
        );
        proc.spawn()?;
        children.push(proc);
        tokio::time::sleep(config.stagger_delay).await;
    }

    for specialist in &config.specialists {
        let ready = process::wait_until_healthy(
            host,
            specialist.port,
            config.readiness_timeout,
            config.readiness_poll_interval,
        )
        .await;
        if ready {
            info!(name = %specialist.name, port = specialist.port, "specialist is healthy");
        } else {
            warn!(name = %specialist.name, port = specialist.port, "specialist did not become healthy in time, starting anyway");
        }
    }

    let mut supervisor = ManagedProcess::new(
        "conclave-supervisor",
        config.supervisor_binary.clone(),
        vec!["--port".to_string(), config.supervisor_port.to_string(), "--host".to_string(), host.to_string()],
    );
    supervisor.spawn()?;
    children.push(supervisor);

    process::write_pid_file(pid_file, std::process::id())?;

    info!("fleet is up, entering monitor loop");
    run_monitor_loop(config, children, pid_file).await
}

/// Watch every child, restart any that exit on their own, and shut the
/// whole fleet down cleanly on SIGINT/SIGTERM.
async fn run_monitor_loop(config: FleetConfig, mut children: Vec<ManagedProcess>, pid_file: &std::path::Path) -> Result<()> {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(config.monitor_interval) => {
                for child in &mut children {
                    if let Some(status) = child.poll_exit().await {
                        if status.success() {
                            info!(name = %child.name, "child exited cleanly, not restarting");
                        } else {
                            error!(name = %child.name, ?status, "child exited unexpectedly, restarting");
                            if let Err(e) = child.spawn() {
                                error!(name = %child.name, error = %e, "failed to restart child");
                            }
                        }
                    }
                }
            }
            _ = shutdown_signal() => {
                info!("shutdown requested, stopping fleet");
                break;
            }
        }
    }

    for child in children.iter_mut().rev() {
        let _ = child.terminate(config.shutdown_timeout).await;
    }
    process::remove_pid_file(pid_file)?;
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

async fn stop(pid_file: &std::path::Path) -> Result<()> {
    let pid = process::read_pid_file(pid_file).context("no PID file found; is a fleet running?")?;
    if !process::process_exists(pid) {
        warn!(pid, "PID file is stale, removing");
        process::remove_pid_file(pid_file)?;
        return Ok(());
    }

    info!(pid, "sending SIGTERM to launcher process");
    unsafe {
        libc::kill(pid as i32, libc::SIGTERM);
    }

    for _ in 0..50 {
        if !process::process_exists(pid) {
            info!("fleet stopped");
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    anyhow::bail!("fleet did not stop within the timeout; it may need a manual SIGKILL")
}

async fn status(pid_file: &std::path::Path) -> Result<()> {
    match process::read_pid_file(pid_file) {
        Some(pid) if process::process_exists(pid) => {
            println!("running (pid {pid})");
        }
        Some(_) => println!("stopped (stale PID file)"),
        None => println!("stopped"),
    }
    Ok(())
}
