//! YAML device inventory.
//!
//! ```yaml
//! devices:
//!   - host: 10.0.0.1
//!     port: 2222
//!     username: admin
//!     password: secret
//!     device_type: ssh
//!   - host: olt-02.example.net
//!     username: admin
//!     password: secret
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::device::{DEFAULT_PORT, DeviceRecord, DeviceType};
use crate::error::{ConfigError, Result};

#[derive(Debug, Deserialize)]
struct InventoryFile {
    #[serde(default)]
    devices: Vec<DeviceEntry>,
}

#[derive(Deserialize)]
struct DeviceEntry {
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    username: String,
    password: String,
    #[serde(default)]
    device_type: Option<String>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

// Keep passwords out of serde error context and debug output.
impl std::fmt::Debug for DeviceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceEntry")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("device_type", &self.device_type)
            .finish_non_exhaustive()
    }
}

/// Parsed device inventory.
#[derive(Debug)]
pub struct Inventory {
    devices: Vec<Arc<DeviceRecord>>,
}

impl Inventory {
    /// Load an inventory from a YAML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// Parse an inventory document.
    ///
    /// An empty or missing `devices` list is an error: there is nothing to
    /// dispatch to. So is a repeated `host:port`, since both entries would
    /// write the same output file.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let file: InventoryFile = serde_yaml::from_str(text).map_err(ConfigError::Parse)?;

        if file.devices.is_empty() {
            return Err(ConfigError::EmptyInventory.into());
        }

        let devices = file
            .devices
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                let device_type = entry
                    .device_type
                    .filter(|tag| !tag.trim().is_empty())
                    .map(DeviceType::new)
                    .unwrap_or_default();

                DeviceRecord::new(
                    entry.host,
                    entry.port,
                    entry.username,
                    entry.password,
                    device_type,
                )
                .map(Arc::new)
                .map_err(|message| ConfigError::InvalidDevice { index, message })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut seen = HashMap::new();
        for (index, device) in devices.iter().enumerate() {
            if let Some(&first) = seen.get(&(device.host(), device.port())) {
                return Err(ConfigError::DuplicateDevice {
                    index,
                    first,
                    host: device.host().to_string(),
                    port: device.port(),
                }
                .into());
            }
            seen.insert((device.host(), device.port()), index);
        }

        Ok(Self { devices })
    }

    pub fn devices(&self) -> &[Arc<DeviceRecord>] {
        &self.devices
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_parse_with_defaults() {
        let inventory = Inventory::from_yaml(
            r#"
devices:
  - host: 10.0.0.1
    port: 2222
    username: admin
    password: secret
    device_type: ssh
  - host: olt-02
    username: admin
    password: secret
  - host: sw-03
    username: ops
    password: secret
    device_type: cisco_ios
"#,
        )
        .unwrap();

        let devices = inventory.devices();
        assert_eq!(devices.len(), 3);
        assert_eq!(devices[0].port(), 2222);
        assert!(devices[0].device_type().is_raw());
        assert_eq!(devices[1].port(), 22);
        assert_eq!(devices[1].device_type().as_str(), "generic");
        assert_eq!(devices[2].device_type().as_str(), "cisco_ios");
    }

    #[test]
    fn test_empty_inventory_is_config_error() {
        for text in ["devices: []", "{}", "other: 1"] {
            let err = Inventory::from_yaml(text).unwrap_err();
            assert!(matches!(err, Error::Config(ConfigError::EmptyInventory)), "{text}: {err}");
        }
    }

    #[test]
    fn test_invalid_entry_reports_index() {
        let err = Inventory::from_yaml(
            r#"
devices:
  - host: ok
    username: a
    password: b
  - host: ""
    username: a
    password: b
"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidDevice { index: 1, .. })
        ));
    }

    #[test]
    fn test_duplicate_host_port_rejected() {
        let err = Inventory::from_yaml(
            r#"
devices:
  - {host: olt1, username: a, password: b}
  - {host: olt1, port: 2222, username: a, password: b}
  - {host: olt1, port: 22, username: c, password: d, device_type: ssh}
"#,
        )
        .unwrap_err();
        match err {
            Error::Config(ConfigError::DuplicateDevice {
                index,
                first,
                host,
                port,
            }) => {
                assert_eq!((index, first, port), (2, 0, 22));
                assert_eq!(host, "olt1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_out_of_range_port_fails_parse() {
        let err = Inventory::from_yaml(
            "devices:\n  - {host: a, port: 70000, username: u, password: p}\n",
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = Inventory::from_path("/nonexistent/inventory.yaml").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Read { .. })));
    }
}
