//! Child process lifecycle: spawn, poll for readiness, monitor for
//! unexpected exit and restart, and graceful SIGTERM-then-SIGKILL
//! shutdown. Grounded in the teacher's `cli/src/daemon/mod.rs`
//! (`stop_daemon`, `process_exists`, `write_pid_file`/`remove_pid_file`),
//! generalized from a single daemon process to a small fleet of them.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::{Child, Command};
use tracing::{info, warn};

/// A supervised child process: how to relaunch it, and its current
/// handle.
pub struct ManagedProcess {
    pub name: String,
    pub binary: PathBuf,
    pub args: Vec<String>,
    child: Option<Child>,
}

impl ManagedProcess {
    pub fn new(name: impl Into<String>, binary: PathBuf, args: Vec<String>) -> Self {
        Self { name: name.into(), binary, args, child: None }
    }

    pub fn spawn(&mut self) -> Result<()> {
        let child = Command::new(&self.binary)
            .args(&self.args)
            .kill_on_drop(false)
            .spawn()
            .with_context(|| format!("failed to spawn {}", self.name))?;
        info!(name = %self.name, pid = child.id(), "spawned child process");
        self.child = Some(child);
        Ok(())
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(|c| c.id())
    }

    /// `Some(status)` once the child has exited, `None` if it's still
    /// running. Never blocks.
    pub async fn poll_exit(&mut self) -> Option<std::process::ExitStatus> {
        match self.child.as_mut() {
            Some(child) => child.try_wait().ok().flatten(),
            None => None,
        }
    }

    pub async fn terminate(&mut self, timeout: Duration) -> Result<()> {
        let Some(pid) = self.pid() else { return Ok(()) };
        info!(name = %self.name, pid, "sending SIGTERM");
        send_signal(pid, libc::SIGTERM)?;

        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if !process_exists(pid) {
                info!(name = %self.name, pid, "process stopped gracefully");
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
        }

        warn!(name = %self.name, pid, "graceful shutdown timed out, sending SIGKILL");
        send_signal(pid, libc::SIGKILL)?;
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok(())
    }
}

#[cfg(unix)]
fn send_signal(pid: u32, signal: i32) -> Result<()> {
    unsafe {
        if libc::kill(pid as i32, signal) != 0 {
            anyhow::bail!("failed to send signal {signal} to process {pid}");
        }
    }
    Ok(())
}

#[cfg(not(unix))]
fn send_signal(_pid: u32, _signal: i32) -> Result<()> {
    Ok(())
}

pub fn process_exists(pid: u32) -> bool {
    #[cfg(unix)]
    {
        unsafe { libc::kill(pid as i32, 0) == 0 }
    }
    #[cfg(not(unix))]
    {
        let _ = pid;
        true
    }
}

/// Poll `http://host:port/health` until it answers 2xx or `timeout`
/// elapses. Returns whether it became ready.
pub async fn wait_until_healthy(host: &str, port: u16, timeout: Duration, poll_interval: Duration) -> bool {
    let client = reqwest::Client::builder().timeout(Duration::from_millis(500)).build().unwrap_or_default();
    let url = format!("http://{host}:{port}/health");
    let deadline = tokio::time::Instant::now() + timeout;

    while tokio::time::Instant::now() < deadline {
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return true;
            }
        }
        tokio::time::sleep(poll_interval).await;
    }
    false
}

pub fn write_pid_file(path: &Path, pid: u32) -> Result<()> {
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    std::fs::write(path, pid.to_string()).with_context(|| format!("failed to write PID file {path:?}"))?;
    info!(?path, "wrote PID file");
    Ok(())
}

pub fn remove_pid_file(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path).with_context(|| format!("failed to remove PID file {path:?}"))?;
        info!(?path, "removed PID file");
    }
    Ok(())
}

pub fn read_pid_file(path: &Path) -> Option<u32> {
    std::fs::read_to_string(path).ok()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_process_exists() {
        assert!(process_exists(std::process::id()));
    }

    #[test]
    fn pid_zero_or_invalid_is_unlikely_to_exist() {
        // PID 999999 is not a valid process on any system we target.
        assert!(!process_exists(999_999));
    }
}
