//! Turnstile CLI.
//!
//! Runs one station with the given shape, then prints one line per actor and
//! one line per resource. Ctrl-C ends the run window early; the station still
//! stops, joins and reports normally.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{Level, info};

use turnstile::logging::{self, LogConfig};
use turnstile::thread::config::{
    DEFAULT_ACTOR_COUNT, DEFAULT_RESOURCE_COUNT, DEFAULT_RUN_DURATION, DEFAULT_SERVICE_DURATION,
};
use turnstile::{ServiceEvent, Station, StationConfig, StationError, StationReport, WaitStrategy};

#[derive(Parser)]
#[command(name = "turnstile")]
#[command(about = "Run a bounded shared-resource station and count every use")]
struct Cli {
    /// Number of actor threads
    #[arg(long, default_value_t = DEFAULT_ACTOR_COUNT)]
    actors: usize,

    /// Number of shared resources
    #[arg(long, default_value_t = DEFAULT_RESOURCE_COUNT)]
    resources: usize,

    /// How long the station stays open, in seconds
    #[arg(long, default_value_t = DEFAULT_RUN_DURATION.as_secs())]
    run_secs: u64,

    /// How long one service holds a resource, in milliseconds
    #[arg(long, default_value_t = DEFAULT_SERVICE_DURATION.as_millis() as u64)]
    service_ms: u64,

    /// Kind label printed for actors
    #[arg(long, default_value = "Car")]
    actor_label: String,

    /// Kind label printed for resources
    #[arg(long, default_value = "Pump")]
    resource_label: String,

    /// Spin-poll for turns instead of waiting on notifications
    #[arg(long)]
    poll: bool,

    /// Record a service journal (written with --output)
    #[arg(long)]
    journal: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Write the JSON report, and the journal if recorded, to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short)]
    verbose: bool,

    /// Also append logs to this file
    #[arg(long)]
    log_file: Option<String>,
}

impl Cli {
    fn station_config(&self) -> StationConfig {
        StationConfig {
            actor_count: self.actors,
            resource_count: self.resources,
            run_duration: Duration::from_secs(self.run_secs),
            service_duration: Duration::from_millis(self.service_ms),
            wait_strategy: if self.poll {
                WaitStrategy::polling()
            } else {
                WaitStrategy::Notify
            },
            actor_label: self.actor_label.clone(),
            resource_label: self.resource_label.clone(),
            record_journal: self.journal,
        }
    }

    fn log_config(&self) -> LogConfig {
        LogConfig {
            level: if self.verbose { Level::DEBUG } else { Level::WARN },
            ..Default::default()
        }
    }
}

#[derive(Serialize)]
struct RunRecord<'a> {
    report: &'a StationReport,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    journal: &'a [ServiceEvent],
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.log_file {
        Some(path) => logging::init_with_file(cli.log_config(), path)
            .with_context(|| format!("failed to open log file {}", path))?,
        None => logging::init(cli.log_config()),
    }

    let config = cli.station_config();
    println!(
        "Station: {} {} actors, {} {} resources, {}ms service time, and {}s total run time",
        config.actor_count,
        config.actor_label,
        config.resource_count,
        config.resource_label,
        config.service_duration.as_millis(),
        config.run_duration.as_secs()
    );

    let run_duration = config.run_duration;
    let mut station = Station::configure(config)?;

    let stop = station.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, closing the station");
            stop.raise();
        }
    });

    let (report, journal) = tokio::task::spawn_blocking(
        move || -> Result<(StationReport, Vec<ServiceEvent>), StationError> {
            station.start()?;
            station.run_for(run_duration)?;
            station.stop_and_join()?;
            let report = station.report()?;
            let journal = station.journal()?.to_vec();
            station.teardown()?;
            Ok((report, journal))
        },
    )
    .await??;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report);
    }

    if let Some(path) = &cli.output {
        let record = RunRecord {
            report: &report,
            journal: &journal,
        };
        let json = serde_json::to_string_pretty(&record)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
    }

    Ok(())
}
