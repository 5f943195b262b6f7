//! One payload against one device.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::outcome::ExecutionOutcome;
use super::sink::OutputSink;
use super::strategy::{Transport, TransportStrategy};
use crate::device::{CommandPayload, DeviceRecord};
use crate::error::{Result, TransportError};
use crate::logging::EventLog;

/// Runs a payload on a single device through the transport its type selects.
///
/// Never fails: every error, including an unwritable sink directory or a
/// timeout, ends up in the returned [`ExecutionOutcome`].
pub struct SessionRunner<R, M> {
    raw: R,
    managed: M,
    output_dir: PathBuf,
    device_timeout: Option<Duration>,
    log: EventLog,
}

impl<R: Transport, M: Transport> SessionRunner<R, M> {
    pub fn new(raw: R, managed: M, output_dir: impl Into<PathBuf>, log: EventLog) -> Self {
        Self {
            raw,
            managed,
            output_dir: output_dir.into(),
            device_timeout: None,
            log,
        }
    }

    /// Abort a device's session after `timeout`.
    pub fn with_device_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.device_timeout = timeout;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub async fn run(&self, device: Arc<DeviceRecord>, payload: CommandPayload) -> ExecutionOutcome {
        let strategy = TransportStrategy::select(device.device_type());
        let started = Instant::now();
        self.log.info(format!(
            "Executing {} command lines on {} via {}",
            payload.line_count(),
            device.label(),
            strategy
        ));

        let result = self.execute(&device, &payload, &strategy).await;
        let output_path = OutputSink::path_for(&self.output_dir, &device);
        let outcome =
            ExecutionOutcome::from_result(device, strategy, result, started.elapsed(), output_path);

        match &outcome.error {
            None => self.log.info(format!(
                "Completed {} in {:.2?}, output saved to {}",
                outcome.device.label(),
                outcome.elapsed,
                outcome.output_path.display()
            )),
            Some(error) => self.log.error(format!(
                "Failed {} via {} after {:.2?}: {}",
                outcome.device.label(),
                outcome.transport,
                outcome.elapsed,
                error
            )),
        }
        outcome
    }

    /// Outcome for a device whose session never reported back.
    pub(crate) fn abandoned(&self, device: &Arc<DeviceRecord>, reason: &str) -> ExecutionOutcome {
        let outcome = ExecutionOutcome {
            device: Arc::clone(device),
            transport: TransportStrategy::select(device.device_type()),
            success: false,
            error: Some(reason.to_string()),
            elapsed: Duration::ZERO,
            output_path: OutputSink::path_for(&self.output_dir, device),
        };
        self.log
            .error(format!("Failed {}: {}", device.label(), reason));
        outcome
    }

    async fn execute(
        &self,
        device: &DeviceRecord,
        payload: &CommandPayload,
        strategy: &TransportStrategy,
    ) -> Result<()> {
        let mut sink = OutputSink::create(&self.output_dir, device).await?;

        let session = async {
            match strategy {
                TransportStrategy::RawPassword => self.raw.execute(device, payload, &mut sink).await,
                TransportStrategy::Managed { .. } => {
                    self.managed.execute(device, payload, &mut sink).await
                }
            }
        };
        // Dropping the session future on timeout kills the ssh child or the
        // russh connection.
        let result = match self.device_timeout {
            Some(limit) => tokio::time::timeout(limit, session)
                .await
                .unwrap_or_else(|_| Err(TransportError::Timeout(limit).into())),
            None => session.await,
        };

        let finished = sink.finish().await;
        result.and(finished.map(drop))
    }
}
