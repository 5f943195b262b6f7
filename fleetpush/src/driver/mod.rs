//! Interactive driver for managed devices.
//!
//! The driver keeps a PTY shell open, recognises the platform's prompts,
//! moves between privilege levels and sends commands one at a time.

mod builder;
pub mod config_session;
mod generic;
mod privilege;
pub(crate) mod response;

pub use builder::DriverBuilder;
pub use config_session::GenericConfigSession;
pub use generic::GenericDriver;
pub use privilege::{PrivilegeManager, Transition};
pub use response::Response;

use std::future::Future;

use crate::error::Result;

/// Operations every device driver provides.
pub trait Driver: Send {
    /// Connect, wait for the first prompt and run the on-open commands.
    fn open(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Disconnect. Safe to call on a driver that is not open.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Send one command and wait for the next prompt.
    fn send_command(&mut self, command: &str) -> impl Future<Output = Result<Response>> + Send;

    /// Move to the named privilege level.
    fn acquire_privilege(&mut self, privilege: &str) -> impl Future<Output = Result<()>> + Send;

    fn is_open(&self) -> bool;

    /// Open, and neither the device nor the SSH session has hung up.
    fn is_alive(&self) -> bool;

    fn current_privilege(&self) -> Option<&str>;
}
