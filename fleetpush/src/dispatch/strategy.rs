//! Transport selection.

use std::fmt;
use std::future::Future;

use super::sink::OutputSink;
use crate::device::{CommandPayload, DeviceRecord, DeviceType};
use crate::error::Result;

/// Delivers a payload to one device, writing whatever the device says into
/// `sink`.
///
/// Implementations must leave everything received so far in the sink when
/// they fail, and must stop all work when the returned future is dropped.
pub trait Transport: Send + Sync + 'static {
    fn execute(
        &self,
        device: &DeviceRecord,
        payload: &CommandPayload,
        sink: &mut OutputSink,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// How a device is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportStrategy {
    /// External `ssh` under `sshpass`, payload on stdin.
    RawPassword,

    /// Interactive managed-device session for the named platform.
    Managed { platform: String },
}

impl TransportStrategy {
    /// `"ssh"` selects the raw transport; every other tag names a platform.
    pub fn select(device_type: &DeviceType) -> Self {
        if device_type.is_raw() {
            Self::RawPassword
        } else {
            Self::Managed {
                platform: device_type.as_str().to_string(),
            }
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Self::RawPassword)
    }
}

impl fmt::Display for TransportStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RawPassword => f.write_str("raw-password-ssh"),
            Self::Managed { platform } => write!(f, "managed-device-ssh ({platform})"),
        }
    }
}
