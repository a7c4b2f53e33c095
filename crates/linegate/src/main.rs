//! Linegate launcher.
//!
//! `run` drives the gate loop: reference tables in, decoded payloads from
//! the feed, audit rows and actuator signals out. `lookup` resolves a
//! single identifier with no side effects, for line-side debugging.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use linegate::acquire::ScanFeed;
use linegate::actuator::ActuatorNotifier;
use linegate::classify;
use linegate::pipeline::{Pipeline, SCAN_COOLDOWN};
use linegate_logging::LogConfig;
use linegate_protocol::{DecisionTag, ScanEvent};
use linegate_reference::ReferenceIndex;
use linegate_sinks::AuditSink;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "linegate", about = "Line-side quality gate for scanned units")]
struct Cli {
    /// Enable verbose logging (debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the gate loop against a decoder feed
    Run(RunArgs),

    /// Resolve one device id against the reference tables (no side effects)
    Lookup(LookupArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Device reference table (CSV)
    #[arg(long, env = "LINEGATE_DEVICES")]
    devices: PathBuf,

    /// Batch quality reference table (CSV)
    #[arg(long, env = "LINEGATE_BATCHES")]
    batches: PathBuf,

    /// Accepted audit stream (default: ~/.linegate/audit/accepted_log.csv)
    #[arg(long, env = "LINEGATE_ACCEPTED_LOG")]
    accepted_log: Option<PathBuf>,

    /// Rejected audit stream (default: ~/.linegate/audit/rejected_log.csv)
    #[arg(long, env = "LINEGATE_REJECTED_LOG")]
    rejected_log: Option<PathBuf>,

    /// Actuator endpoint; omit to run without accept/reject signalling
    #[arg(long, env = "LINEGATE_ACTUATOR_URL")]
    actuator_url: Option<reqwest::Url>,

    /// Accept decoded payloads on this TCP address instead of stdin
    #[arg(long, env = "LINEGATE_LISTEN")]
    listen: Option<String>,

    /// Debounce cooldown in seconds
    #[arg(long, env = "LINEGATE_COOLDOWN_SECS", default_value_t = SCAN_COOLDOWN.as_secs())]
    cooldown_secs: u64,
}

#[derive(Args, Debug)]
struct LookupArgs {
    /// Device id to resolve
    device_id: String,

    /// Device reference table (CSV)
    #[arg(long, env = "LINEGATE_DEVICES")]
    devices: PathBuf,

    /// Batch quality reference table (CSV)
    #[arg(long, env = "LINEGATE_BATCHES")]
    batches: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _log_guard = match linegate_logging::init_logging(LogConfig {
        app_name: "linegate",
        verbose: cli.verbose,
    }) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("Failed to initialize logging: {err:#}");
            None
        }
    };

    let result = match cli.command {
        Commands::Run(args) => run(args).await,
        Commands::Lookup(args) => lookup(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            eprintln!("ERROR: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: RunArgs) -> Result<()> {
    let index = ReferenceIndex::load(&args.devices, &args.batches)
        .context("Failed to load reference tables")?;
    info!(
        "Loaded {} device records and {} quality parameters",
        index.device_count(),
        index.batch_count()
    );

    let (accepted, rejected) = audit_paths(&args);
    let sink = AuditSink::new(accepted, rejected);

    let notifier = match &args.actuator_url {
        Some(url) => Some(
            ActuatorNotifier::new(url.clone()).context("Failed to build actuator client")?,
        ),
        None => {
            warn!("No actuator endpoint configured; accept/reject signals disabled");
            None
        }
    };

    let mut feed = match &args.listen {
        Some(addr) => ScanFeed::listen(addr).await?,
        None => ScanFeed::stdin(),
    };

    let mut pipeline = Pipeline::new(
        Arc::new(index),
        Arc::new(sink),
        notifier,
        Duration::from_secs(args.cooldown_secs),
    );

    info!("Waiting for scans (send 'q' to quit)");
    loop {
        tokio::select! {
            scan = feed.next_scan() => {
                match scan {
                    // Side effects run detached; the outcome handles are
                    // dropped so the next frame is never held up.
                    Some(code) => drop(pipeline.submit(&ScanEvent::new(code))),
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received");
                break;
            }
        }
    }

    info!("Exiting");
    Ok(())
}

fn lookup(args: LookupArgs) -> Result<()> {
    let index = ReferenceIndex::load(&args.devices, &args.batches)
        .context("Failed to load reference tables")?;
    let decision = classify::classify(&args.device_id, &index);

    match decision.tag {
        DecisionTag::Unresolved => {
            println!("{}: no matching device record", args.device_id);
        }
        tag => {
            println!("{}: {}", args.device_id, tag);
            if let Some(batch_id) = decision
                .device
                .as_ref()
                .and_then(|device| device.batch_id.as_deref())
            {
                println!("  batch: {}", batch_id);
            }
            if let Some(status) = decision.status.as_deref() {
                println!("  RoHS: {}", status);
            }
        }
    }
    Ok(())
}

fn audit_paths(args: &RunArgs) -> (PathBuf, PathBuf) {
    let audit_dir = linegate_logging::audit_dir();
    let accepted = args
        .accepted_log
        .clone()
        .unwrap_or_else(|| audit_dir.join("accepted_log.csv"));
    let rejected = args
        .rejected_log
        .clone()
        .unwrap_or_else(|| audit_dir.join("rejected_log.csv"));
    (accepted, rejected)
}
