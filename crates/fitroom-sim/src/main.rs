//! Fitroom simulation binary.
//!
//! # Usage
//!
//! ```bash
//! # Prompt for everything
//! fitroom
//!
//! # Fully specified, reproducible start order and dwell times
//! fitroom --slots 2 --blue 3 --green 3 --seed 42
//!
//! # Give up on entry after 500ms
//! fitroom --slots 1 --blue 4 --green 4 --timeout-ms 500
//! ```
//!
//! Exits with status 2 when the configuration is rejected before any worker
//! starts, 1 when a run fails.

use std::{
    io::{self, Write},
    process::ExitCode,
    sync::Arc,
    time::Duration,
};

use clap::Parser;
use fitroom_core::{RoomObserver, WaitPolicy};
use fitroom_sim::{
    ConsoleRenderer, DwellRange, RunReport, SeededEnv, SimError, Simulation,
    prompt::{self, GivenValues},
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Fitting room synchronization simulation
#[derive(Parser, Debug)]
#[command(name = "fitroom")]
#[command(about = "Two-category fitting room synchronization simulation")]
#[command(version)]
struct Args {
    /// Number of slots inside the fitting room (prompted if omitted)
    #[arg(short, long, allow_negative_numbers = true)]
    slots: Option<i64>,

    /// Number of blue workers (prompted if omitted)
    #[arg(short, long, allow_negative_numbers = true)]
    blue: Option<i64>,

    /// Number of green workers (prompted if omitted)
    #[arg(short, long, allow_negative_numbers = true)]
    green: Option<i64>,

    /// Seed for start order and dwell times
    #[arg(long)]
    seed: Option<u64>,

    /// Shortest stay in the room, in milliseconds
    #[arg(long, default_value = "50")]
    dwell_min_ms: u64,

    /// Longest stay in the room (exclusive), in milliseconds
    #[arg(long, default_value = "100")]
    dwell_max_ms: u64,

    /// Give up on entry after this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_configuration() => {
            tracing::error!("configuration rejected: {}", e);
            ExitCode::from(2)
        },
        Err(e) => {
            tracing::error!("run failed: {}", e);
            ExitCode::FAILURE
        },
    }
}

fn run(args: &Args) -> Result<(), SimError> {
    let mut stdout = io::stdout();
    writeln!(stdout, "### OS Process Synchronization ###\n")?;

    let given = GivenValues { slots: args.slots, blue: args.blue, green: args.green };
    let config = prompt::collect_config(given, &mut io::stdin().lock(), &mut stdout)?;
    writeln!(stdout)?;

    let dwell = DwellRange::new(
        Duration::from_millis(args.dwell_min_ms),
        Duration::from_millis(args.dwell_max_ms),
    )?;
    let wait_policy = match args.timeout_ms {
        Some(ms) => WaitPolicy::Timeout(Duration::from_millis(ms)),
        None => WaitPolicy::Unbounded,
    };

    let renderer: Arc<dyn RoomObserver> = Arc::new(ConsoleRenderer::stdout());
    let sim = Simulation::from_config(config)
        .with_observer(renderer)
        .with_wait_policy(wait_policy)
        .with_dwell(dwell);

    let report = match args.seed {
        Some(seed) => sim.with_env(SeededEnv::with_seed(seed)).run(),
        None => sim.run(),
    }?;
    summarize(&report);

    Ok(())
}

fn summarize(report: &RunReport) {
    if report.total_timed_out() > 0 {
        tracing::warn!(
            "{} of {} workers gave up waiting",
            report.total_timed_out(),
            report.total_timed_out() + report.total_admitted()
        );
    } else {
        tracing::info!("all {} workers left the room", report.total_admitted());
    }
}
