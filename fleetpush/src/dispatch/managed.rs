//! Managed-device transport: an interactive driver session per device.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use log::debug;

use super::sink::OutputSink;
use super::strategy::Transport;
use crate::device::{CommandPayload, DeviceRecord};
use crate::driver::{Driver, DriverBuilder, GenericDriver};
use crate::error::{ChannelError, DriverError, Result};
use crate::platform::PlatformRegistry;
use crate::transport::HostKeyVerification;

/// Pushes a payload line by line through a [`GenericDriver`] in the
/// platform's configuration mode.
#[derive(Debug, Clone)]
pub struct ManagedSshTransport {
    registry: Arc<PlatformRegistry>,
    connect_timeout: Duration,
    command_timeout: Duration,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
}

impl ManagedSshTransport {
    pub fn new(registry: Arc<PlatformRegistry>) -> Self {
        Self {
            registry,
            connect_timeout: Duration::from_secs(30),
            command_timeout: Duration::from_secs(30),
            host_key_verification: HostKeyVerification::default(),
            known_hosts_path: None,
        }
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    pub fn registry(&self) -> &PlatformRegistry {
        &self.registry
    }

    fn driver(&self, device: &DeviceRecord) -> Result<GenericDriver> {
        let platform = self.registry.resolve(device.device_type().as_str())?.clone();
        let mut builder = DriverBuilder::new(device.host())
            .port(device.port())
            .username(device.username())
            .password(device.expose_password())
            .platform(platform)
            .timeout(self.connect_timeout)
            .command_timeout(self.command_timeout)
            .host_key_verification(self.host_key_verification);
        if let Some(path) = &self.known_hosts_path {
            builder = builder.known_hosts_path(path);
        }
        builder.build()
    }
}

impl Transport for ManagedSshTransport {
    async fn execute(
        &self,
        device: &DeviceRecord,
        payload: &CommandPayload,
        sink: &mut OutputSink,
    ) -> Result<()> {
        let mut driver = self.driver(device)?;
        driver.open().await?;

        let result = push_payload(&mut driver, payload, sink).await;

        if let Err(e) = driver.close().await {
            debug!("{} close: {}", device.label(), e);
        }
        result
    }
}

/// Send every payload line in configuration mode, appending each line's
/// transcript to `sink` as soon as its prompt arrives. Entering and leaving
/// configuration mode are part of the transcript.
///
/// Stops at the first line the device rejects. A device that hangs up on
/// the last line (a trailing `exit`) has run the whole script.
pub(crate) async fn push_payload(
    driver: &mut GenericDriver,
    payload: &CommandPayload,
    sink: &mut OutputSink,
) -> Result<()> {
    let lines: Vec<&str> = payload.lines().collect();
    let mut session = driver.config_session().await?;
    sink.write_all(session.entry_output()).await?;

    for (index, line) in lines.iter().enumerate() {
        let Some(response) = session.send_command(line).await? else {
            continue;
        };
        sink.write_all(response.raw_result.as_bytes()).await?;

        if let Some(marker) = response.failure_message {
            match session.finish().await {
                Ok(output) => sink.write_all(&output).await?,
                Err(e) => debug!("leaving configuration mode after '{}' failed: {}", line, e),
            }
            return Err(DriverError::CommandRejected {
                command: line.to_string(),
                message: marker,
            }
            .into());
        }

        if session.is_closed() {
            session.detach();
            return if index + 1 == lines.len() {
                Ok(())
            } else {
                Err(ChannelError::Closed.into())
            };
        }
    }

    let output = session.finish().await?;
    sink.write_all(&output).await
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio_test::io::Builder;

    use crate::device::DeviceType;
    use crate::error::{Error, PlatformError};
    use crate::platform::vendors;

    fn device() -> DeviceRecord {
        DeviceRecord::new("olt1", 22, "admin", "pw", DeviceType::default()).unwrap()
    }

    async fn attached(mock: tokio_test::io::Mock) -> GenericDriver {
        let mut driver = DriverBuilder::new("olt1")
            .username("admin")
            .platform(vendors::generic::platform())
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        driver.attach(mock).await.unwrap();
        driver
    }

    async fn read_sink(sink: OutputSink) -> String {
        let path = sink.finish().await.unwrap();
        std::fs::read_to_string(path).unwrap()
    }

    #[tokio::test]
    async fn test_full_script_ending_in_exit() {
        let mock = Builder::new()
            .read(b"olt#")
            .write(b"configure terminal\n")
            .read(b"configure terminal\r\nolt(config)#")
            .write(b"vlan 100\n")
            .read(b"vlan 100\r\nolt(config-vlan)#")
            .write(b"end\n")
            .read(b"end\r\nolt#")
            .write(b"exit\n")
            .read(b"exit\r\n")
            .build();
        let mut driver = attached(mock).await;
        let dir = tempfile::tempdir().unwrap();
        let mut sink = OutputSink::create(dir.path(), &device()).await.unwrap();

        let payload = CommandPayload::new("conf t\nvlan 100\nend\nexit\n");
        push_payload(&mut driver, &payload, &mut sink).await.unwrap();

        let transcript = read_sink(sink).await;
        assert_eq!(
            transcript,
            "configure terminal\r\nolt(config)#vlan 100\r\nolt(config-vlan)#end\r\nolt#exit\r\n"
        );
    }

    #[tokio::test]
    async fn test_transcript_includes_leaving_config_mode() {
        let mock = Builder::new()
            .read(b"olt#")
            .write(b"configure terminal\n")
            .read(b"configure terminal\r\nolt(config)#")
            .write(b"vlan 100\n")
            .read(b"vlan 100\r\nolt(config-vlan)#")
            .write(b"end\n")
            .read(b"end\r\nolt#")
            .build();
        let mut driver = attached(mock).await;
        let dir = tempfile::tempdir().unwrap();
        let mut sink = OutputSink::create(dir.path(), &device()).await.unwrap();

        push_payload(&mut driver, &CommandPayload::new("vlan 100\n"), &mut sink)
            .await
            .unwrap();

        assert_eq!(
            read_sink(sink).await,
            "configure terminal\r\nolt(config)#vlan 100\r\nolt(config-vlan)#end\r\nolt#"
        );
        assert_eq!(driver.current_privilege(), Some("privilege_exec"));
    }

    #[tokio::test]
    async fn test_rejected_line_stops_run() {
        let mock = Builder::new()
            .read(b"olt#")
            .write(b"configure terminal\n")
            .read(b"configure terminal\r\nolt(config)#")
            .write(b"vlan 100\n")
            .read(b"vlan 100\r\nolt(config-vlan)#")
            .write(b"vlna 200\n")
            .read(b"vlna 200\r\n% Invalid input detected\r\nolt(config-vlan)#")
            .write(b"end\n")
            .read(b"end\r\nolt#")
            .build();
        let mut driver = attached(mock).await;
        let dir = tempfile::tempdir().unwrap();
        let mut sink = OutputSink::create(dir.path(), &device()).await.unwrap();

        let payload = CommandPayload::new("vlan 100\nvlna 200\nname never-sent\n");
        let err = push_payload(&mut driver, &payload, &mut sink).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Driver(DriverError::CommandRejected { ref command, .. }) if command == "vlna 200"
        ));

        let transcript = read_sink(sink).await;
        assert!(transcript.starts_with("configure terminal\r\n"));
        assert!(transcript.contains("% Invalid input"));
        assert!(transcript.ends_with("end\r\nolt#"));
        assert!(!transcript.contains("never-sent"));
        assert_eq!(driver.current_privilege(), Some("privilege_exec"));
    }

    #[tokio::test]
    async fn test_early_close_is_failure() {
        let mock = Builder::new()
            .read(b"olt#")
            .write(b"configure terminal\n")
            .read(b"configure terminal\r\nolt(config)#")
            .write(b"vlan 100\n")
            .read(b"vlan 100\r\nConnection reset\r\n")
            .build();
        let mut driver = attached(mock).await;
        let dir = tempfile::tempdir().unwrap();
        let mut sink = OutputSink::create(dir.path(), &device()).await.unwrap();

        let payload = CommandPayload::new("vlan 100\nname data\n");
        let err = push_payload(&mut driver, &payload, &mut sink).await.unwrap_err();
        assert!(matches!(err, Error::Channel(ChannelError::Closed)));
        assert!(read_sink(sink).await.contains("Connection reset"));
    }

    #[tokio::test]
    async fn test_unknown_platform() {
        let transport = ManagedSshTransport::new(Arc::new(PlatformRegistry::with_builtins()));
        let device = DeviceRecord::new("olt1", 22, "admin", "pw", DeviceType::new("zte_zxan")).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut sink = OutputSink::create(dir.path(), &device).await.unwrap();

        let err = transport
            .execute(&device, &CommandPayload::new("vlan 100\n"), &mut sink)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Platform(PlatformError::UnknownPlatform { ref name }) if name == "zte_zxan"
        ));
    }
}
