//! Device records and command payloads.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};

use crate::error::{self, ConfigError};

/// Device-type tag routed to the raw `sshpass` transport.
pub const RAW_DEVICE_TYPE: &str = "ssh";

/// Alternative spelling of [`RAW_DEVICE_TYPE`].
pub const RAW_DEVICE_TYPE_ALIAS: &str = "raw";

/// Device-type tag used when an inventory entry omits `device_type`.
pub const DEFAULT_DEVICE_TYPE: &str = "generic";

/// Default SSH port.
pub const DEFAULT_PORT: u16 = 22;

/// Device family tag from the inventory.
///
/// `"ssh"` (or `"raw"`) selects the raw password transport; any other value
/// names a managed-device platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceType(String);

impl DeviceType {
    /// Create a device type from its tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The raw-transport tag.
    pub fn raw() -> Self {
        Self::new(RAW_DEVICE_TYPE)
    }

    /// The tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this tag selects the raw password transport.
    pub fn is_raw(&self) -> bool {
        self.0 == RAW_DEVICE_TYPE || self.0 == RAW_DEVICE_TYPE_ALIAS
    }
}

impl Default for DeviceType {
    fn default() -> Self {
        Self::new(DEFAULT_DEVICE_TYPE)
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One remote target and its credentials.
///
/// Records are validated on construction and never mutated afterwards; a
/// dispatch run shares them as `Arc<DeviceRecord>`.
pub struct DeviceRecord {
    host: String,
    port: u16,
    username: String,
    password: SecretString,
    device_type: DeviceType,
}

impl DeviceRecord {
    /// Create a validated device record.
    ///
    /// Fails if `host` is empty or starts with `-` (it is handed to an
    /// external ssh process), or if `port` is 0.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
        device_type: DeviceType,
    ) -> Result<Self, String> {
        let host = host.into().trim().to_string();
        if host.is_empty() {
            return Err("host must not be empty".to_string());
        }
        if host.starts_with('-') {
            return Err(format!("host '{host}' must not start with '-'"));
        }
        if port == 0 {
            return Err(format!("port for '{host}' must be in 1..=65535"));
        }

        Ok(Self {
            host,
            port,
            username: username.into(),
            password: SecretString::from(password.into()),
            device_type,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &SecretString {
        &self.password
    }

    /// Expose the password for handing it to a transport.
    pub(crate) fn expose_password(&self) -> &str {
        self.password.expose_secret()
    }

    pub fn device_type(&self) -> &DeviceType {
        &self.device_type
    }

    /// `host:port` label used in logs.
    pub fn label(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for DeviceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceRecord")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("device_type", &self.device_type)
            .finish()
    }
}

/// Newline-separated command script sent to every device of a run.
///
/// Cloning is cheap; all sessions of a run share the same text.
#[derive(Clone, PartialEq, Eq)]
pub struct CommandPayload(Arc<str>);

impl CommandPayload {
    pub fn new(text: impl Into<String>) -> Self {
        Self(Arc::from(text.into()))
    }

    /// Read a command file.
    pub fn from_path(path: impl AsRef<Path>) -> error::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(text))
    }

    /// The full script text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Non-blank lines with trailing `\r` removed, as sent by the managed
    /// transport.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.0
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.trim().is_empty())
    }

    /// Number of non-blank lines.
    pub fn line_count(&self) -> usize {
        self.lines().count()
    }

    pub fn is_blank(&self) -> bool {
        self.line_count() == 0
    }
}

impl From<String> for CommandPayload {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<&str> for CommandPayload {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

// Payloads may carry secrets; only their size is ever printed.
impl fmt::Debug for CommandPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommandPayload({} lines)", self.line_count())
    }
}
