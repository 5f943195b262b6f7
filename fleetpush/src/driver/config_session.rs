//! Configuration-mode guard.
//!
//! The guard holds `&mut GenericDriver`, so nothing else can use the driver
//! while the device is in configuration mode. [`finish`] and [`detach`]
//! consume it.
//!
//! [`finish`]: GenericConfigSession::finish
//! [`detach`]: GenericConfigSession::detach

use bytes::Bytes;
use log::{debug, warn};

use super::Driver;
use super::generic::GenericDriver;
use super::response::Response;
use crate::error::{DriverError, Result};

/// A driver held in the platform's configuration privilege level.
pub struct GenericConfigSession<'a> {
    driver: &'a mut GenericDriver,
    original_privilege: Option<String>,
    config_privilege: String,
    /// Device output while entering configuration mode.
    entry_output: Bytes,
    consumed: bool,
}

impl<'a> GenericConfigSession<'a> {
    /// Escalate `driver` into configuration mode.
    pub async fn new(driver: &'a mut GenericDriver) -> Result<Self> {
        let config_privilege = driver
            .platform()
            .config_level()
            .map(|level| level.name.clone())
            .ok_or_else(|| DriverError::NoConfigMode {
                platform: driver.platform().name.clone(),
            })?;
        let original_privilege = driver.current_privilege().map(str::to_string);

        let entry_output = driver.transition_to(&config_privilege).await?;

        Ok(Self {
            driver,
            original_privilege,
            config_privilege,
            entry_output,
            consumed: false,
        })
    }

    /// Send one configuration line.
    ///
    /// Returns `None` without sending anything when the line would re-enter
    /// configuration mode while already in it (`conf t` at the top of a
    /// script).
    pub async fn send_command(&mut self, line: &str) -> Result<Option<Response>> {
        let in_config = self.driver.current_privilege() == Some(self.config_privilege.as_str());
        let redundant = in_config
            && self
                .driver
                .privilege_manager()
                .get(&self.config_privilege)
                .is_some_and(|level| level.is_escalate_command(line));
        if redundant {
            debug!("skipping '{}', already in configuration mode", line);
            return Ok(None);
        }

        self.driver.send_command(line).await.map(Some)
    }

    /// What the device printed while the session entered configuration mode.
    pub fn entry_output(&self) -> &[u8] {
        &self.entry_output
    }

    /// Whether the device closed the session.
    pub fn is_closed(&self) -> bool {
        self.driver.session_ended()
    }

    /// Return to the privilege level the session started from, returning
    /// what the device printed on the way out.
    pub async fn finish(mut self) -> Result<Bytes> {
        self.consumed = true;
        if self.driver.session_ended() {
            return Ok(Bytes::new());
        }
        match self.original_privilege.clone() {
            Some(original) if self.driver.current_privilege() != Some(original.as_str()) => {
                self.driver.transition_to(&original).await
            }
            _ => Ok(Bytes::new()),
        }
    }

    /// Release the driver wherever the script left it.
    pub fn detach(mut self) {
        self.consumed = true;
    }
}

impl Drop for GenericConfigSession<'_> {
    fn drop(&mut self) {
        if !self.consumed {
            warn!("configuration session dropped without finish() or detach()");
        }
    }
}
