//! Concurrent fan-out of one payload to many devices.
//!
//! ```text
//! DispatchEngine ──spawn per device──► SessionRunner ──► TransportStrategy
//!        │                                  │              ├─ RawSshTransport
//!        └──── outcomes, input order ◄──────┘              └─ ManagedSshTransport
//! ```

mod config;
mod managed;
mod outcome;
mod runner;
mod sink;
mod strategy;

pub use config::{DEFAULT_OUTPUT_DIR, DispatchConfig};
pub use managed::ManagedSshTransport;
pub use outcome::{ExecutionOutcome, RunSummary};
pub use runner::SessionRunner;
pub use sink::OutputSink;
pub use strategy::{Transport, TransportStrategy};

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::device::{CommandPayload, DeviceRecord};
use crate::error::{ConfigError, Result};
use crate::inventory::Inventory;
use crate::logging::EventLog;
use crate::platform::PlatformRegistry;
use crate::transport::RawSshTransport;

/// Runs a [`SessionRunner`] for every device at once, optionally bounded by
/// a worker limit, and collects one outcome per device.
pub struct DispatchEngine<R = RawSshTransport, M = ManagedSshTransport> {
    runner: Arc<SessionRunner<R, M>>,
    workers: Option<Arc<Semaphore>>,
    log: EventLog,
}

impl DispatchEngine {
    /// Engine with the real transports.
    pub fn from_config(
        config: &DispatchConfig,
        registry: Arc<PlatformRegistry>,
        log: EventLog,
    ) -> Self {
        let runner = SessionRunner::new(
            config.raw_transport(),
            config.managed_transport(registry),
            config.output_dir.clone(),
            log.clone(),
        )
        .with_device_timeout(config.device_timeout);
        Self::new(runner, config.worker_limit(), log)
    }
}

impl<R: Transport, M: Transport> DispatchEngine<R, M> {
    /// `workers` of `None` runs every device at once.
    pub fn new(runner: SessionRunner<R, M>, workers: Option<usize>, log: EventLog) -> Self {
        Self {
            runner: Arc::new(runner),
            workers: workers.map(|n| Arc::new(Semaphore::new(n))),
            log,
        }
    }

    /// Send `payload` to every device and wait for all of them.
    ///
    /// Outcomes come back in the order of `devices`, exactly one each. A
    /// session that panics becomes a failed outcome for its device. A device
    /// whose output file is already taken by an earlier entry is not run.
    pub async fn dispatch_all(
        &self,
        devices: &[Arc<DeviceRecord>],
        payload: &CommandPayload,
    ) -> Vec<ExecutionOutcome> {
        if devices.is_empty() {
            self.log.warn("No devices to dispatch to");
            return Vec::new();
        }
        self.log.info(format!(
            "Dispatching {} command lines to {} devices",
            payload.line_count(),
            devices.len()
        ));

        let mut slots: Vec<Option<ExecutionOutcome>> = devices.iter().map(|_| None).collect();
        let mut claimed: HashMap<PathBuf, usize> = HashMap::new();
        let mut tasks = JoinSet::new();
        for (index, device) in devices.iter().enumerate() {
            let path = OutputSink::path_for(self.runner.output_dir(), device);
            if let Some(&first) = claimed.get(&path) {
                let reason = format!(
                    "duplicate of device #{first}: output file {} already in use",
                    path.display()
                );
                slots[index] = Some(self.runner.abandoned(device, &reason));
                continue;
            }
            claimed.insert(path, index);

            let runner = Arc::clone(&self.runner);
            let workers = self.workers.clone();
            let device = Arc::clone(device);
            let payload = payload.clone();

            tasks.spawn(async move {
                let _permit = match workers {
                    Some(semaphore) => semaphore.acquire_owned().await.ok(),
                    None => None,
                };
                let outcome = AssertUnwindSafe(runner.run(Arc::clone(&device), payload))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| {
                        runner.abandoned(&device, &format!("session panicked: {}", panic_message(&*panic)))
                    });
                (index, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => self.log.error(format!("Dispatch task failed: {e}")),
            }
        }

        slots
            .into_iter()
            .zip(devices)
            .map(|(slot, device)| {
                slot.unwrap_or_else(|| self.runner.abandoned(device, "session did not complete"))
            })
            .collect()
    }

    /// Validate the payload, dispatch it to the whole inventory and log the
    /// run summary.
    pub async fn dispatch_inventory(
        &self,
        inventory: &Inventory,
        payload: &CommandPayload,
    ) -> Result<Vec<ExecutionOutcome>> {
        if payload.is_blank() {
            return Err(ConfigError::EmptyPayload.into());
        }

        let outcomes = self.dispatch_all(inventory.devices(), payload).await;
        let summary = RunSummary::from_outcomes(&outcomes);
        if summary.all_succeeded() {
            self.log.info(format!("Run finished: {summary}"));
        } else {
            self.log.warn(format!("Run finished: {summary}"));
        }
        Ok(outcomes)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(&*boxed), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(&*boxed), "bang");
        let boxed: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(&*boxed), "unknown panic");
    }
}
