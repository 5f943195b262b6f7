//! SSH transports.
//!
//! Two ways of reaching a device live here: [`SshTransport`], an in-process
//! russh session used by the managed driver, and [`RawSshTransport`], which
//! drives an external `ssh` client through `sshpass`.

pub mod config;
mod raw;
mod ssh;

pub use config::{AuthMethod, HostKeyVerification, SshConfig};
pub use raw::{RawSshTransport, SSHPASS_ENV};
pub use ssh::SshTransport;
