//! Campwatch: periodically scans campsite availability calendars and reports
//! sites bookable for a qualifying stay.
//!
//! - `--once`: a single batch, then exit
//! - otherwise: a batch every `schedule.interval_secs` until Ctrl-C

mod config;
mod schedule;

use std::path::PathBuf;

use anyhow::Result;
use campwatch_logging::{cw_error, cw_info, LogDestination};
use clap::Parser;
use log::LevelFilter;

use crate::schedule::{run_on_schedule, BatchJob};

#[derive(Parser)]
#[command(name = "campwatch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Watches campsite availability calendars for qualifying stays", long_about = None)]
struct Cli {
    /// RON configuration file
    #[arg(short, long, default_value = "campwatch.ron")]
    config: PathBuf,

    /// Run a single batch and exit
    #[arg(long)]
    once: bool,

    /// Also write the log to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let destination = match &cli.log_file {
        Some(path) => LogDestination::Both(path.clone()),
        None => LogDestination::Terminal,
    };
    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    campwatch_logging::init(destination, level);

    let config = config::load(&cli.config)?;
    cw_info!("Loaded configuration from {}", cli.config.display());

    if cli.once {
        let job = BatchJob::from_config(&config, None)?;
        let digest = job.run().await;
        cw_info!(
            "Single batch done: {} sites with qualifying stays",
            digest.sites().count()
        );
        return Ok(());
    }

    let every = config.interval();
    let job = BatchJob::from_config(&config, Some(every))?;
    cw_info!("Scanning every {:?}", every);
    run_on_schedule(&job, every, shutdown_signal()).await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        cw_error!("Cannot listen for Ctrl-C: {}", err);
        std::future::pending::<()>().await;
    }
}
