//! Per-device results and run summaries.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::strategy::TransportStrategy;
use crate::device::DeviceRecord;
use crate::error::Result;

/// What happened to one device during a run.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub device: Arc<DeviceRecord>,
    pub transport: TransportStrategy,
    pub success: bool,
    /// Human-readable reason when `success` is false.
    pub error: Option<String>,
    pub elapsed: Duration,
    /// Sink file holding the device's output, complete or partial.
    pub output_path: PathBuf,
}

impl ExecutionOutcome {
    pub(crate) fn from_result(
        device: Arc<DeviceRecord>,
        transport: TransportStrategy,
        result: Result<()>,
        elapsed: Duration,
        output_path: PathBuf,
    ) -> Self {
        Self {
            device,
            transport,
            success: result.is_ok(),
            error: result.err().map(|e| e.to_string()),
            elapsed,
            output_path,
        }
    }

    pub fn host(&self) -> &str {
        self.device.host()
    }
}

/// Totals for a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// `host:port` of every failed device, in inventory order.
    pub failed_devices: Vec<String>,
}

impl RunSummary {
    pub fn from_outcomes(outcomes: &[ExecutionOutcome]) -> Self {
        let failed_devices: Vec<String> = outcomes
            .iter()
            .filter(|o| !o.success)
            .map(|o| o.device.label())
            .collect();
        Self {
            total: outcomes.len(),
            succeeded: outcomes.len() - failed_devices.len(),
            failed: failed_devices.len(),
            failed_devices,
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} devices: {} succeeded, {} failed",
            self.total, self.succeeded, self.failed
        )?;
        if !self.failed_devices.is_empty() {
            write!(f, " ({})", self.failed_devices.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceType;
    use crate::error::{Error, TransportError};

    fn outcome(host: &str, result: Result<()>) -> ExecutionOutcome {
        let device = Arc::new(DeviceRecord::new(host, 22, "admin", "pw", DeviceType::raw()).unwrap());
        ExecutionOutcome::from_result(
            device,
            TransportStrategy::RawPassword,
            result,
            Duration::from_millis(5),
            PathBuf::from("out.log"),
        )
    }

    #[test]
    fn test_failed_outcome_keeps_message() {
        let failed = outcome(
            "olt1",
            Err(Error::Transport(TransportError::AuthenticationFailed {
                user: "admin".to_string(),
            })),
        );
        assert!(!failed.success);
        assert!(failed.error.as_deref().unwrap().contains("Authentication failed"));
        assert_eq!(failed.host(), "olt1");
    }

    #[test]
    fn test_summary() {
        let outcomes = vec![
            outcome("olt1", Ok(())),
            outcome("olt2", Err(Error::Transport(TransportError::Timeout(Duration::from_secs(1))))),
            outcome("olt3", Ok(())),
        ];
        let summary = RunSummary::from_outcomes(&outcomes);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed_devices, vec!["olt2:22"]);
        assert!(!summary.all_succeeded());
        assert_eq!(summary.to_string(), "3 devices: 2 succeeded, 1 failed (olt2:22)");
    }
}
