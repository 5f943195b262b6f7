//! Driver that works with any platform definition.

use std::time::{Duration, Instant};

use bytes::Bytes;
use log::{debug, warn};
use regex::bytes::Regex;
use secrecy::ExposeSecret;

use super::Driver;
use super::config_session::GenericConfigSession;
use super::privilege::PrivilegeManager;
use super::response::Response;
use crate::channel::patterns::prompt_line;
use crate::channel::{PtyChannel, PtyConfig, SessionStream, combine_patterns};
use crate::error::{ChannelError, DriverError, Result};
use crate::platform::PlatformDefinition;
use crate::transport::{AuthMethod, SshConfig, SshTransport};

/// Automatic answers given while waiting for one prompt.
const MAX_AUTO_RESPONSES: usize = 8;

/// Output collected up to a prompt.
struct PromptRead {
    output: Bytes,
    /// `None` when the device closed the session instead of prompting.
    prompt: Option<String>,
}

/// Interactive driver for a managed device.
///
/// Owns the SSH session and the PTY channel on top of it, recognises the
/// platform's prompts and moves between its privilege levels.
pub struct GenericDriver {
    ssh_config: SshConfig,
    platform: PlatformDefinition,
    transport: Option<SshTransport>,
    channel: Option<PtyChannel>,
    privileges: PrivilegeManager,
    /// Any privilege level's prompt.
    prompt_pattern: Regex,
    /// A prompt or any question with an automatic answer.
    wait_pattern: Regex,
    /// How long to wait for each prompt.
    command_timeout: Duration,
}

impl GenericDriver {
    pub fn new(ssh_config: SshConfig, platform: PlatformDefinition) -> Result<Self> {
        let prompt_pattern = combine_patterns(platform.privilege_levels.values().map(|l| &l.pattern))
            .map_err(ChannelError::from)?;
        let wait_pattern = combine_patterns(
            std::iter::once(&prompt_pattern).chain(platform.auto_responses.iter().map(|r| &r.pattern)),
        )
        .map_err(ChannelError::from)?;

        Ok(Self {
            privileges: PrivilegeManager::new(platform.privilege_levels.clone()),
            command_timeout: ssh_config.timeout,
            ssh_config,
            platform,
            transport: None,
            channel: None,
            prompt_pattern,
            wait_pattern,
        })
    }

    pub fn platform(&self) -> &PlatformDefinition {
        &self.platform
    }

    pub fn privilege_manager(&self) -> &PrivilegeManager {
        &self.privileges
    }

    /// Per-prompt read timeout. Defaults to the connect timeout.
    pub fn set_command_timeout(&mut self, timeout: Duration) {
        self.command_timeout = timeout;
        if let Some(channel) = self.channel.as_mut() {
            channel.set_timeout(timeout);
        }
    }

    /// Whether the device ended the session (e.g. after `exit`).
    pub fn session_ended(&self) -> bool {
        self.channel.as_ref().is_some_and(PtyChannel::is_closed)
    }

    /// Enter configuration mode. The returned guard borrows the driver until
    /// it is finished or detached.
    pub async fn config_session(&mut self) -> Result<GenericConfigSession<'_>> {
        GenericConfigSession::new(self).await
    }

    /// Take over an already established shell stream: wait for the first
    /// prompt, learn the privilege level and run the platform's on-open
    /// commands.
    pub(crate) async fn attach(&mut self, stream: impl SessionStream + 'static) -> Result<()> {
        if self.channel.is_some() {
            return Err(DriverError::AlreadyConnected.into());
        }
        let config = PtyConfig {
            timeout: self.command_timeout,
            ..PtyConfig::default()
        };
        self.channel = Some(PtyChannel::new(stream, config));

        let read = self.read_until_prompt().await?;
        let prompt = read.prompt.ok_or(ChannelError::Closed)?;
        match self.privileges.observe_prompt(&prompt) {
            Some(level) => debug!("{} initial privilege {}", self.ssh_config.socket_addr(), level),
            None => warn!(
                "{} initial prompt '{}' matches no privilege level",
                self.ssh_config.socket_addr(),
                prompt
            ),
        }

        for command in self.platform.on_open_commands.clone() {
            let response = self.send_command(&command).await?;
            if let Some(failure) = &response.failure_message {
                warn!("on-open command '{}' failed: {}", command, failure);
            }
        }
        Ok(())
    }

    fn channel_mut(&mut self) -> Result<&mut PtyChannel> {
        Ok(self.channel.as_mut().ok_or(DriverError::NotConnected)?)
    }

    /// Read until a prompt, answering known questions on the way.
    async fn read_until_prompt(&mut self) -> Result<PromptRead> {
        let channel = self.channel.as_mut().ok_or(DriverError::NotConnected)?;
        let mut output = Vec::new();

        for _ in 0..=MAX_AUTO_RESPONSES {
            let read = channel.read_until_default(&self.wait_pattern).await?;
            output.extend_from_slice(&read.data);

            if !read.pattern_matched {
                return Ok(PromptRead {
                    output: Bytes::from(output),
                    prompt: None,
                });
            }
            if self.prompt_pattern.is_match(&read.data) {
                return Ok(PromptRead {
                    prompt: Some(prompt_line(&read.data)),
                    output: Bytes::from(output),
                });
            }

            match self
                .platform
                .auto_responses
                .iter()
                .find(|r| r.pattern.is_match(&read.data))
            {
                Some(auto) => {
                    debug!("answering '{}' with '{}'", prompt_line(&read.data), auto.reply);
                    channel.send(&auto.reply).await?;
                }
                None => break,
            }
        }

        Err(ChannelError::PatternTimeout(channel.timeout()).into())
    }

    /// Move to the `target` privilege level, returning everything the device
    /// printed on the way (command echoes and prompts).
    pub(crate) async fn transition_to(&mut self, target: &str) -> Result<Bytes> {
        let current = self
            .privileges
            .current_name()
            .ok_or_else(|| DriverError::PrivilegeAcquisitionFailed {
                target: target.to_string(),
            })?
            .to_string();
        let path = self.privileges.find_path(&current, target)?;
        let mut transcript = Vec::new();

        for step in path.windows(2) {
            let (from, to) = (&step[0], &step[1]);
            let transition =
                self.privileges
                    .transition(from, to)
                    .ok_or_else(|| DriverError::NoPrivilegePath {
                        from: from.clone(),
                        to: to.clone(),
                    })?;

            self.channel_mut()?.send(&transition.command).await?;
            let read = match &transition.auth_prompt {
                Some(auth_prompt) => self.authenticate_escalation(auth_prompt).await?,
                None => self.read_until_prompt().await?,
            };
            transcript.extend_from_slice(&read.output);

            let prompt = read.prompt.ok_or(ChannelError::Closed)?;
            if self.privileges.observe_prompt(&prompt) != Some(to.as_str()) {
                return Err(DriverError::PrivilegeAcquisitionFailed { target: to.clone() }.into());
            }
        }
        Ok(Bytes::from(transcript))
    }

    /// Send the enable password when an escalation asks for it.
    async fn authenticate_escalation(&mut self, auth_prompt: &Regex) -> Result<PromptRead> {
        let channel = self.channel.as_mut().ok_or(DriverError::NotConnected)?;
        let pattern = combine_patterns([auth_prompt, &self.prompt_pattern]).map_err(ChannelError::from)?;
        let read = channel.read_until_default(&pattern).await?;

        if !read.pattern_matched {
            return Ok(PromptRead {
                output: read.data,
                prompt: None,
            });
        }
        if self.prompt_pattern.is_match(&read.data) {
            return Ok(PromptRead {
                prompt: Some(prompt_line(&read.data)),
                output: read.data,
            });
        }

        match &self.ssh_config.auth {
            AuthMethod::Password(password) => channel.send(password.expose_secret()).await?,
            AuthMethod::None => channel.send("").await?,
        }
        let after = self.read_until_prompt().await?;

        let mut output = read.data.to_vec();
        output.extend_from_slice(&after.output);
        Ok(PromptRead {
            output: Bytes::from(output),
            prompt: after.prompt,
        })
    }
}

impl Driver for GenericDriver {
    async fn open(&mut self) -> Result<()> {
        if self.transport.is_some() || self.channel.is_some() {
            return Err(DriverError::AlreadyConnected.into());
        }

        let transport = SshTransport::connect(&self.ssh_config).await?;
        let stream = transport.open_shell().await?;
        self.transport = Some(transport);
        self.attach(Box::pin(stream)).await
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut channel) = self.channel.take() {
            if !channel.is_closed() {
                for command in &self.platform.on_close_commands {
                    if let Err(e) = channel.send(command).await {
                        debug!("on-close command '{}' not sent: {}", command, e);
                        break;
                    }
                }
            }
            if let Err(e) = channel.shutdown().await {
                debug!("channel shutdown: {}", e);
            }
        }
        if let Some(transport) = self.transport.take() {
            transport.close().await?;
        }
        Ok(())
    }

    async fn send_command(&mut self, command: &str) -> Result<Response> {
        let start = Instant::now();
        self.channel_mut()?.send(command).await?;
        let read = self.read_until_prompt().await?;

        let prompt = read.prompt.unwrap_or_default();
        if !prompt.is_empty() {
            self.privileges.observe_prompt(&prompt);
        }

        let response = Response::new(
            command,
            String::from_utf8_lossy(&read.output),
            prompt,
            start.elapsed(),
        );
        match self.platform.detect_failure(&response.result) {
            Some(marker) => Ok(response.with_failure(marker)),
            None => Ok(response),
        }
    }

    async fn acquire_privilege(&mut self, target: &str) -> Result<()> {
        self.transition_to(target).await.map(drop)
    }

    fn is_open(&self) -> bool {
        self.channel.is_some()
    }

    fn is_alive(&self) -> bool {
        self.channel.as_ref().is_some_and(|c| !c.is_closed())
            && self.transport.as_ref().is_none_or(SshTransport::is_alive)
    }

    fn current_privilege(&self) -> Option<&str> {
        self.privileges.current_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio_test::io::Builder;

    use crate::driver::DriverBuilder;
    use crate::platform::vendors;

    fn driver() -> GenericDriver {
        DriverBuilder::new("olt1")
            .username("admin")
            .password("enablepw")
            .platform(vendors::generic::platform())
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_attach_detects_privilege() {
        let mock = Builder::new().read(b"Welcome to OLT\r\nolt#").build();
        let mut driver = driver();
        driver.attach(mock).await.unwrap();
        assert!(driver.is_open());
        assert_eq!(driver.current_privilege(), Some("privilege_exec"));
    }

    #[tokio::test]
    async fn test_send_command_normalizes_and_detects_failure() {
        let mock = Builder::new()
            .read(b"olt#")
            .write(b"show vlan 10\n")
            .read(b"show vlan 10\r\nVLAN 10 active\r\nolt#")
            .write(b"shwo vlan\n")
            .read(b"shwo vlan\r\n% Invalid input detected at '^' marker.\r\nolt#")
            .build();
        let mut driver = driver();
        driver.attach(mock).await.unwrap();

        let ok = driver.send_command("show vlan 10").await.unwrap();
        assert_eq!(ok.result, "VLAN 10 active");
        assert_eq!(ok.prompt, "olt#");
        assert!(ok.is_success());

        let bad = driver.send_command("shwo vlan").await.unwrap();
        assert_eq!(bad.failure_message.as_deref(), Some("% Invalid input"));
    }

    #[tokio::test]
    async fn test_escalation_sends_password() {
        let mock = Builder::new()
            .read(b"olt>")
            .write(b"enable\n")
            .read(b"enable\r\nPassword: ")
            .write(b"enablepw\n")
            .read(b"\r\nolt#")
            .write(b"configure terminal\n")
            .read(b"configure terminal\r\nolt(config)#")
            .build();
        let mut driver = driver();
        driver.attach(mock).await.unwrap();
        assert_eq!(driver.current_privilege(), Some("exec"));

        driver.acquire_privilege("configuration").await.unwrap();
        assert_eq!(driver.current_privilege(), Some("configuration"));
    }

    #[tokio::test]
    async fn test_transition_transcript() {
        let mock = Builder::new()
            .read(b"olt>")
            .write(b"enable\n")
            .read(b"enable\r\nPassword: ")
            .write(b"enablepw\n")
            .read(b"\r\nolt#")
            .write(b"configure terminal\n")
            .read(b"configure terminal\r\nolt(config)#")
            .build();
        let mut driver = driver();
        driver.attach(mock).await.unwrap();

        let transcript = driver.transition_to("configuration").await.unwrap();
        assert_eq!(
            &transcript[..],
            b"enable\r\nPassword: \r\nolt#configure terminal\r\nolt(config)#"
        );
    }

    #[tokio::test]
    async fn test_auto_response_answers_question() {
        let mock = Builder::new()
            .read(b"olt#")
            .write(b"copy r s\n")
            .read(b"copy r s\r\nOverwrite startup config? [yes/no]: ")
            .write(b"y\n")
            .read(b"y\r\n[OK]\r\nolt#")
            .build();
        let mut driver = driver();
        driver.attach(mock).await.unwrap();

        let response = driver.send_command("copy r s").await.unwrap();
        assert!(response.raw_result.contains("[yes/no]"));
        assert!(response.raw_result.contains("[OK]"));
        assert_eq!(response.prompt, "olt#");
    }

    #[tokio::test]
    async fn test_session_closed_by_device() {
        let mock = Builder::new()
            .read(b"olt#")
            .write(b"exit\n")
            .read(b"exit\r\nBye\r\n")
            .build();
        let mut driver = driver();
        driver.attach(mock).await.unwrap();

        let response = driver.send_command("exit").await.unwrap();
        assert!(response.prompt.is_empty());
        assert!(driver.session_ended());
        assert!(!driver.is_alive());
    }

    #[tokio::test]
    async fn test_not_connected() {
        let mut driver = driver();
        let err = driver.send_command("show version").await.unwrap_err();
        assert!(matches!(err, crate::Error::Driver(DriverError::NotConnected)));
    }
}
