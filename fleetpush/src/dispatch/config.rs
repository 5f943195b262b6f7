//! Run configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::managed::ManagedSshTransport;
use crate::platform::PlatformRegistry;
use crate::transport::{HostKeyVerification, RawSshTransport};

/// Default directory for sink files and the run log.
pub const DEFAULT_OUTPUT_DIR: &str = "log/sshpass";

/// Settings for one dispatch run.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Directory for `output_<host>_<port>.log` files.
    pub output_dir: PathBuf,

    /// Maximum devices in flight. `None` or 0 means no limit.
    pub workers: Option<usize>,

    /// Wall-clock limit for one device's whole session.
    pub device_timeout: Option<Duration>,

    /// SSH connection timeout.
    pub connect_timeout: Duration,

    /// How long the managed transport waits for each prompt.
    pub command_timeout: Duration,

    pub host_key_verification: HostKeyVerification,

    /// known_hosts file for the managed transport.
    pub known_hosts_path: Option<PathBuf>,

    pub sshpass_program: String,
    pub ssh_program: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            workers: None,
            device_timeout: None,
            connect_timeout: Duration::from_secs(30),
            command_timeout: Duration::from_secs(30),
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
            sshpass_program: "sshpass".to_string(),
            ssh_program: "ssh".to_string(),
        }
    }
}

impl DispatchConfig {
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn with_device_timeout(mut self, timeout: Duration) -> Self {
        self.device_timeout = Some(timeout);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn with_host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    pub fn with_known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    pub fn with_sshpass_program(mut self, program: impl Into<String>) -> Self {
        self.sshpass_program = program.into();
        self
    }

    pub fn with_ssh_program(mut self, program: impl Into<String>) -> Self {
        self.ssh_program = program.into();
        self
    }

    /// Worker limit, with 0 treated as unlimited.
    pub fn worker_limit(&self) -> Option<usize> {
        self.workers.filter(|&n| n > 0)
    }

    pub fn raw_transport(&self) -> RawSshTransport {
        RawSshTransport::new()
            .sshpass_program(&self.sshpass_program)
            .ssh_program(&self.ssh_program)
            .connect_timeout(self.connect_timeout)
            .host_key_verification(self.host_key_verification)
    }

    pub fn managed_transport(&self, registry: Arc<PlatformRegistry>) -> ManagedSshTransport {
        let transport = ManagedSshTransport::new(registry)
            .connect_timeout(self.connect_timeout)
            .command_timeout(self.command_timeout)
            .host_key_verification(self.host_key_verification);
        match &self.known_hosts_path {
            Some(path) => transport.known_hosts_path(path),
            None => transport,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DispatchConfig::default();
        assert_eq!(config.output_dir, PathBuf::from("log/sshpass"));
        assert_eq!(config.worker_limit(), None);
        assert_eq!(config.host_key_verification, HostKeyVerification::AcceptNew);
    }

    #[test]
    fn test_zero_workers_is_unbounded() {
        assert_eq!(DispatchConfig::default().with_workers(0).worker_limit(), None);
        assert_eq!(DispatchConfig::default().with_workers(4).worker_limit(), Some(4));
    }
}
