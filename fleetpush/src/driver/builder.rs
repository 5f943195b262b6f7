//! Builder for managed-device drivers.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use super::generic::GenericDriver;
use crate::device::DEFAULT_PORT;
use crate::error::{DriverError, Result};
use crate::platform::PlatformDefinition;
use crate::transport::{AuthMethod, HostKeyVerification, SshConfig};

/// Builder for [`GenericDriver`].
///
/// Building does not connect; call [`Driver::open`](super::Driver::open) on
/// the result.
///
/// ```rust,no_run
/// use fleetpush::driver::{Driver, DriverBuilder};
/// use fleetpush::platform::vendors;
///
/// # async fn example() -> Result<(), fleetpush::Error> {
/// let mut driver = DriverBuilder::new("10.0.0.1")
///     .username("admin")
///     .password("secret")
///     .platform(vendors::generic::platform())
///     .build()?;
/// driver.open().await?;
/// let response = driver.send_command("show vlan").await?;
/// println!("{}", response.result);
/// driver.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct DriverBuilder {
    host: String,
    port: u16,
    username: Option<String>,
    auth: AuthMethod,
    platform: Option<PlatformDefinition>,
    timeout: Duration,
    command_timeout: Option<Duration>,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
}

impl DriverBuilder {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            username: None,
            auth: AuthMethod::None,
            platform: None,
            timeout: Duration::from_secs(30),
            command_timeout: None,
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Password for login and for privilege escalation prompts.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.auth = AuthMethod::Password(SecretString::from(password.into()));
        self
    }

    pub fn platform(mut self, platform: PlatformDefinition) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Connect timeout, also used per prompt unless `command_timeout` is set.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// How long to wait for the prompt after each command.
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    /// Use this known_hosts file instead of `~/.ssh/known_hosts`.
    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<GenericDriver> {
        let username = self.username.ok_or_else(|| DriverError::InvalidConfig {
            message: "username is required".to_string(),
        })?;
        let platform = self.platform.ok_or_else(|| DriverError::InvalidConfig {
            message: "platform is required".to_string(),
        })?;

        let ssh_config = SshConfig {
            host: self.host,
            port: self.port,
            username,
            auth: self.auth,
            timeout: self.timeout,
            terminal_width: platform.terminal_width,
            terminal_height: platform.terminal_height,
            host_key_verification: self.host_key_verification,
            known_hosts_path: self.known_hosts_path,
        };

        let mut driver = GenericDriver::new(ssh_config, platform)?;
        if let Some(timeout) = self.command_timeout {
            driver.set_command_timeout(timeout);
        }
        Ok(driver)
    }
}
