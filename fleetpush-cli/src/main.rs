mod cli;

use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::{LevelFilter, error};
use serde::Serialize;

use cli::Cli;
use fleetpush::{
    DispatchConfig, DispatchEngine, Error, EventLog, ExecutionOutcome, Inventory,
    PlatformRegistry, RunSummary,
};

/// Run log written next to the per-device output files.
const RUN_LOG_FILE: &str = "ssh_executions.log";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::from_str(&cli.log_level).unwrap_or(LevelFilter::Info))
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> fleetpush::Result<ExitCode> {
    let payload = cli.command.payload()?;
    let inventory = Inventory::from_path(&cli.inventory)?;

    let log_path = cli.log_dir.join(RUN_LOG_FILE);
    let log = EventLog::with_file(&log_path).map_err(|source| Error::Sink {
        path: log_path.clone(),
        source,
    })?;

    let mut config = DispatchConfig::default()
        .with_output_dir(&cli.log_dir)
        .with_connect_timeout(Duration::from_secs(cli.connect_timeout))
        .with_host_key_verification(cli.host_keys);
    if let Some(workers) = cli.workers {
        config = config.with_workers(workers);
    }
    if let Some(secs) = cli.timeout {
        config = config.with_device_timeout(Duration::from_secs(secs));
    }

    let engine =
        DispatchEngine::from_config(&config, Arc::new(PlatformRegistry::with_builtins()), log.clone());
    let outcomes = engine.dispatch_inventory(&inventory, &payload).await;
    log.flush();
    let outcomes = outcomes?;

    let summary = RunSummary::from_outcomes(&outcomes);
    print_report(&outcomes, &summary, cli.json);

    Ok(if summary.all_succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

#[derive(Serialize)]
struct Report<'a> {
    summary: &'a RunSummary,
    devices: Vec<DeviceReport>,
}

#[derive(Serialize)]
struct DeviceReport {
    host: String,
    port: u16,
    transport: String,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    elapsed_ms: u128,
    output: String,
}

impl From<&ExecutionOutcome> for DeviceReport {
    fn from(outcome: &ExecutionOutcome) -> Self {
        Self {
            host: outcome.device.host().to_string(),
            port: outcome.device.port(),
            transport: outcome.transport.to_string(),
            success: outcome.success,
            error: outcome.error.clone(),
            elapsed_ms: outcome.elapsed.as_millis(),
            output: outcome.output_path.display().to_string(),
        }
    }
}

fn print_report(outcomes: &[ExecutionOutcome], summary: &RunSummary, json: bool) {
    if json {
        let report = Report {
            summary,
            devices: outcomes.iter().map(DeviceReport::from).collect(),
        };
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{text}"),
            Err(e) => error!("Failed to encode report: {}", e),
        }
        return;
    }

    for outcome in outcomes {
        let status = if outcome.success { "OK  " } else { "FAIL" };
        println!(
            "{} {:<24} {:<28} {:>8.2?}  {}",
            status,
            outcome.device.label(),
            outcome.transport.to_string(),
            outcome.elapsed,
            outcome
                .error
                .clone()
                .unwrap_or_else(|| outcome.output_path.display().to_string())
        );
    }
    println!("{summary}");
}
