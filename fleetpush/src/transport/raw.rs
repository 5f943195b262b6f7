//! Raw password transport: an external `ssh` client driven by `sshpass`.
//!
//! The password reaches `sshpass` through the child's `SSHPASS` environment
//! variable (`sshpass -e`), so it never shows up in the process list. The
//! whole payload is written to the session's stdin and both output streams
//! go straight into the device's sink file.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use log::debug;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::config::HostKeyVerification;
use crate::device::{CommandPayload, DeviceRecord};
use crate::dispatch::{OutputSink, Transport};
use crate::error::{Result, TransportError};

/// Environment variable `sshpass -e` reads the password from.
pub const SSHPASS_ENV: &str = "SSHPASS";

/// Runs the payload through `sshpass -e ssh ... -T -- host`.
#[derive(Debug, Clone)]
pub struct RawSshTransport {
    sshpass_program: String,
    ssh_program: String,
    connect_timeout: Duration,
    host_key_verification: HostKeyVerification,
}

impl RawSshTransport {
    pub fn new() -> Self {
        Self {
            sshpass_program: "sshpass".to_string(),
            ssh_program: "ssh".to_string(),
            connect_timeout: Duration::from_secs(30),
            host_key_verification: HostKeyVerification::default(),
        }
    }

    /// Path or name of the `sshpass` binary.
    pub fn sshpass_program(mut self, program: impl Into<String>) -> Self {
        self.sshpass_program = program.into();
        self
    }

    /// Path or name of the `ssh` binary.
    pub fn ssh_program(mut self, program: impl Into<String>) -> Self {
        self.ssh_program = program.into();
        self
    }

    /// Value for `ssh -o ConnectTimeout` (whole seconds, at least 1).
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    /// Build the command for `device`. Nothing secret is placed in argv.
    pub fn command(&self, device: &DeviceRecord) -> Command {
        let mut command = Command::new(&self.sshpass_program);
        command.arg("-e").arg(&self.ssh_program);

        match self.host_key_verification {
            HostKeyVerification::Strict => {
                command.args(["-o", "StrictHostKeyChecking=yes"]);
            }
            HostKeyVerification::AcceptNew => {
                command.args(["-o", "StrictHostKeyChecking=accept-new"]);
            }
            HostKeyVerification::Disabled => {
                command.args([
                    "-o",
                    "StrictHostKeyChecking=no",
                    "-o",
                    "UserKnownHostsFile=/dev/null",
                ]);
            }
        }

        command
            .arg("-o")
            .arg(format!(
                "ConnectTimeout={}",
                self.connect_timeout.as_secs().max(1)
            ))
            .arg("-p")
            .arg(device.port().to_string())
            .arg("-T")
            .arg("-l")
            .arg(device.username())
            .arg("--")
            .arg(device.host())
            .env(SSHPASS_ENV, device.expose_password());

        command
    }

    fn exit_error(&self, device: &DeviceRecord, status: ExitStatus) -> TransportError {
        // sshpass reports its own failures through documented exit codes.
        match status.code() {
            Some(5) => TransportError::AuthenticationFailed {
                user: device.username().to_string(),
            },
            Some(6) => TransportError::HostKeyUnknown {
                host: device.host().to_string(),
                port: device.port(),
            },
            _ => TransportError::ProcessExit {
                program: self.sshpass_program.clone(),
                status: status.to_string(),
            },
        }
    }
}

impl Default for RawSshTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for RawSshTransport {
    async fn execute(
        &self,
        device: &DeviceRecord,
        payload: &CommandPayload,
        sink: &mut OutputSink,
    ) -> Result<()> {
        let mut command = self.command(device);
        command
            .stdin(std::process::Stdio::piped())
            .stdout(sink.stdio().await?)
            .stderr(sink.stdio().await?)
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|source| TransportError::Spawn {
            program: self.sshpass_program.clone(),
            source,
        })?;
        debug!("spawned {} for {}", self.sshpass_program, device.label());

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(payload.as_bytes()).await {
                Ok(()) => {}
                // The session ended before reading everything; the exit
                // status below says why.
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                    debug!("{} closed stdin early", device.label());
                }
                Err(e) => return Err(TransportError::Io(e).into()),
            }
            // Dropping stdin sends EOF, which ends the `-T` session.
        }

        let status = child.wait().await.map_err(TransportError::Io)?;
        if status.success() {
            Ok(())
        } else {
            Err(self.exit_error(device, status).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::ffi::OsStr;

    use crate::device::DeviceType;
    use crate::error::Error;

    fn device() -> DeviceRecord {
        DeviceRecord::new("10.0.0.7", 2222, "admin", "s3cr3t!", DeviceType::raw()).unwrap()
    }

    fn args(command: &Command) -> Vec<String> {
        command
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_password_only_in_env() {
        let transport = RawSshTransport::new();
        let command = transport.command(&device());

        assert_eq!(command.as_std().get_program(), OsStr::new("sshpass"));
        let args = args(&command);
        assert!(args.iter().all(|a| !a.contains("s3cr3t")), "{args:?}");
        assert_eq!(&args[..2], ["-e", "ssh"]);
        assert_eq!(
            &args[args.len() - 7..],
            ["-p", "2222", "-T", "-l", "admin", "--", "10.0.0.7"]
        );

        let env: Vec<_> = command.as_std().get_envs().collect();
        assert_eq!(env, vec![(OsStr::new(SSHPASS_ENV), Some(OsStr::new("s3cr3t!")))]);
    }

    #[test]
    fn test_host_key_options() {
        let strict = RawSshTransport::new().host_key_verification(HostKeyVerification::Strict);
        assert!(args(&strict.command(&device())).contains(&"StrictHostKeyChecking=yes".to_string()));

        let tofu = RawSshTransport::new();
        assert!(
            args(&tofu.command(&device())).contains(&"StrictHostKeyChecking=accept-new".to_string())
        );

        let off = RawSshTransport::new().host_key_verification(HostKeyVerification::Disabled);
        let off_args = args(&off.command(&device()));
        assert!(off_args.contains(&"StrictHostKeyChecking=no".to_string()));
        assert!(off_args.contains(&"UserKnownHostsFile=/dev/null".to_string()));
    }

    #[test]
    fn test_connect_timeout_floor() {
        let transport = RawSshTransport::new().connect_timeout(Duration::from_millis(200));
        assert!(args(&transport.command(&device())).contains(&"ConnectTimeout=1".to_string()));
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = OutputSink::create(dir.path(), &device()).await.unwrap();
        let transport = RawSshTransport::new().sshpass_program("/nonexistent/sshpass");

        let err = transport
            .execute(&device(), &CommandPayload::new("show version\n"), &mut sink)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::Spawn { .. })), "{err}");
        sink.finish().await.unwrap();
    }

    /// `sh -e <script>` stands in for `sshpass -e ssh`: the script sees the
    /// ssh arguments and the SSHPASS variable exactly as ssh would.
    #[cfg(unix)]
    async fn run_fake_ssh(script: &str) -> (Result<()>, String) {
        let dir = tempfile::tempdir().unwrap();
        let script_path = dir.path().join("fake-ssh.sh");
        std::fs::write(&script_path, script).unwrap();

        let transport = RawSshTransport::new()
            .sshpass_program("/bin/sh")
            .ssh_program(script_path.to_string_lossy());
        let device = device();
        let mut sink = OutputSink::create(dir.path(), &device).await.unwrap();

        let result = transport
            .execute(&device, &CommandPayload::new("conf t\nvlan 100\nend\n"), &mut sink)
            .await;
        let path = sink.finish().await.unwrap();
        (result, std::fs::read_to_string(path).unwrap())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_payload_and_both_streams_reach_sink() {
        let (result, output) = run_fake_ssh(
            "echo \"password=$SSHPASS\"\necho \"args=$*\"\ncat\necho to-stderr >&2\n",
        )
        .await;

        result.unwrap();
        assert!(output.contains("password=s3cr3t!"));
        assert!(output.contains("-p 2222 -T -l admin -- 10.0.0.7"));
        assert!(output.contains("conf t\nvlan 100\nend\n"));
        assert!(output.ends_with("to-stderr\n"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_auth_failure_exit_code() {
        let (result, output) = run_fake_ssh("echo 'Permission denied' >&2\nexit 5\n").await;
        assert!(matches!(
            result,
            Err(Error::Transport(TransportError::AuthenticationFailed { ref user })) if user == "admin"
        ));
        assert_eq!(output, "Permission denied\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_other_exit_code() {
        let (result, _) = run_fake_ssh("exit 255\n").await;
        assert!(matches!(
            result,
            Err(Error::Transport(TransportError::ProcessExit { .. }))
        ));
    }
}
