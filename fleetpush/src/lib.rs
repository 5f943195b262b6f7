//! # fleetpush
//!
//! Push one command script to a fleet of OLTs and switches over SSH,
//! concurrently, with one output file per device.
//!
//! Each device is reached in one of two ways, chosen by its inventory
//! `device_type`:
//!
//! - `ssh`: the system `ssh` client under `sshpass`, with the script piped
//!   to the remote shell in one go.
//! - anything else: an interactive session driven line by line through the
//!   named platform's prompts and configuration mode (russh).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use fleetpush::{
//!     CommandPayload, DispatchConfig, DispatchEngine, EventLog, Inventory, PlatformRegistry,
//!     RunSummary,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), fleetpush::Error> {
//!     let inventory = Inventory::from_path("dispositivos.yaml")?;
//!     let payload = CommandPayload::new("conf t\nvlan 100\nend\ncopy r s\n");
//!
//!     let engine = DispatchEngine::from_config(
//!         &DispatchConfig::default().with_workers(16),
//!         Arc::new(PlatformRegistry::with_builtins()),
//!         EventLog::facade(),
//!     );
//!     let outcomes = engine.dispatch_inventory(&inventory, &payload).await?;
//!     println!("{}", RunSummary::from_outcomes(&outcomes));
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod device;
pub mod dispatch;
pub mod driver;
pub mod error;
pub mod inventory;
pub mod logging;
pub mod platform;
pub mod templates;
pub mod transport;

pub use device::{CommandPayload, DeviceRecord, DeviceType};
pub use dispatch::{
    DispatchConfig, DispatchEngine, ExecutionOutcome, ManagedSshTransport, OutputSink,
    RunSummary, SessionRunner, Transport, TransportStrategy,
};
pub use driver::{Driver, DriverBuilder, GenericDriver, Response};
pub use error::{Error, Result};
pub use inventory::Inventory;
pub use logging::{EventLog, EventSink};
pub use platform::{PlatformDefinition, PlatformRegistry, PrivilegeLevel};
pub use transport::{HostKeyVerification, RawSshTransport};
