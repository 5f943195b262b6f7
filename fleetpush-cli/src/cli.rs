//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use fleetpush::dispatch::DEFAULT_OUTPUT_DIR;
use fleetpush::templates;
use fleetpush::{CommandPayload, HostKeyVerification};

#[derive(Parser)]
#[command(name = "fleetpush", version)]
#[command(about = "Push a command script to every device in an inventory over SSH")]
pub struct Cli {
    /// Device inventory (YAML)
    #[arg(short, long, default_value = "dispositivos.yaml")]
    pub inventory: PathBuf,

    /// Directory for per-device output files and ssh_executions.log
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    pub log_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Maximum devices in flight (0 = unlimited)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Per-device session timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// SSH connect timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub connect_timeout: u64,

    /// Host key checking: strict, accept-new or disabled
    #[arg(long, default_value = "accept-new")]
    pub host_keys: HostKeyVerification,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send the contents of a command file
    Run {
        /// Command file, one CLI line per line
        #[arg(short, long)]
        commands: PathBuf,
    },

    /// Configure a GPON flow profile and its VLAN translation
    Flow {
        /// Profile name
        #[arg(long)]
        name: String,

        /// Internet service VLAN
        #[arg(long)]
        internet_vlan: u16,

        /// Management (iphost) VLAN
        #[arg(long)]
        management_vlan: u16,
    },

    /// Create a VLAN and allow it on an uplink trunk
    VlanUplink {
        #[arg(long)]
        vlan: u16,

        /// Uplink interface, e.g. 10giga-ethernet0/1
        #[arg(long)]
        interface: String,
    },
}

impl Commands {
    /// The payload this command sends.
    pub fn payload(&self) -> fleetpush::Result<CommandPayload> {
        Ok(match self {
            Self::Run { commands } => CommandPayload::from_path(commands)?,
            Self::Flow {
                name,
                internet_vlan,
                management_vlan,
            } => templates::flow_profile(name, *internet_vlan, *management_vlan),
            Self::VlanUplink { vlan, interface } => templates::vlan_uplink(*vlan, interface),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flow() {
        let cli = Cli::try_parse_from([
            "fleetpush",
            "--workers",
            "8",
            "--host-keys",
            "strict",
            "flow",
            "--name",
            "FTTH",
            "--internet-vlan",
            "100",
            "--management-vlan",
            "200",
        ])
        .unwrap();

        assert_eq!(cli.workers, Some(8));
        assert_eq!(cli.host_keys, HostKeyVerification::Strict);
        assert_eq!(cli.inventory, PathBuf::from("dispositivos.yaml"));
        let payload = cli.command.payload().unwrap();
        assert!(payload.lines().any(|l| l == "gpon profile flow FTTH"));
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from([
            "fleetpush",
            "vlan-uplink",
            "--vlan",
            "300",
            "--interface",
            "10giga-ethernet0/1",
        ])
        .unwrap();
        assert_eq!(cli.log_dir, PathBuf::from("log/sshpass"));
        assert_eq!(cli.host_keys, HostKeyVerification::AcceptNew);
        assert_eq!(cli.connect_timeout, 30);
        assert!(cli.workers.is_none());

        let bad = ["fleetpush", "--host-keys", "maybe", "run", "--commands", "x.txt"];
        assert!(Cli::try_parse_from(bad).is_err());
    }

    #[test]
    fn test_run_missing_file() {
        let cli = Cli::try_parse_from(["fleetpush", "run", "--commands", "/nonexistent/cmds.txt"])
            .unwrap();
        assert!(matches!(cli.command.payload(), Err(fleetpush::Error::Config(_))));
    }
}
