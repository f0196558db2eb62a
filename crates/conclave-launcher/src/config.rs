//! Fleet configuration: which specialist servers to spawn, on which
//! ports, and where to keep the PID file. Grounded in the teacher's
//! `cli/src/daemon/mod.rs::get_pid_file_path` (uid-based path choice:
//! a system path when run as root, a `/tmp` fallback otherwise).

use std::path::PathBuf;
use std::time::Duration;

/// One specialist server the launcher is responsible for.
#[derive(Debug, Clone)]
pub struct SpecialistConfig {
    pub name: String,
    pub port: u16,
    pub binary: PathBuf,
}

#[derive(Debug, Clone)]
pub struct FleetConfig {
    pub specialists: Vec<SpecialistConfig>,
    pub supervisor_binary: PathBuf,
    pub supervisor_port: u16,
    pub host: String,
    /// Delay between starting each specialist, so they don't all bind
    /// ports and spike CPU in the same instant.
    pub stagger_delay: Duration,
    /// How long to poll a freshly-spawned process's `/health` before
    /// giving up and starting it anyway.
    pub readiness_timeout: Duration,
    pub readiness_poll_interval: Duration,
    /// How often the monitor loop checks child liveness.
    pub monitor_interval: Duration,
    /// How long to wait after SIGTERM before escalating to SIGKILL.
    pub shutdown_timeout: Duration,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            specialists: vec![SpecialistConfig {
                name: "conclave-demo-tools".to_string(),
                port: 8801,
                binary: PathBuf::from("conclave-demo-tools"),
            }],
            supervisor_binary: PathBuf::from("conclave-supervisor"),
            supervisor_port: 8800,
            host: "127.0.0.1".to_string(),
            stagger_delay: Duration::from_millis(200),
            readiness_timeout: Duration::from_secs(10),
            readiness_poll_interval: Duration::from_millis(250),
            monitor_interval: Duration::from_secs(5),
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}

#[cfg(unix)]
const PID_FILE: &str = "/var/run/conclave/conclave.pid";
#[cfg(unix)]
const PID_FILE_FALLBACK: &str = "/tmp/conclave.pid";

/// Root path when run as root, a `/tmp` fallback otherwise — matches
/// the teacher's convention so a fleet started as root and one started
/// by a developer never collide on the same path.
pub fn pid_file_path() -> PathBuf {
    #[cfg(unix)]
    {
        let uid = unsafe { libc::geteuid() };
        if uid == 0 {
            PathBuf::from(PID_FILE)
        } else {
            PathBuf::from(PID_FILE_FALLBACK)
        }
    }
    #[cfg(not(unix))]
    {
        std::env::temp_dir().join("conclave.pid")
    }
}
