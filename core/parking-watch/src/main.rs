//! parking-watch: cron-invoked parking availability check.
//!
//! Each invocation checks one date at one lot, notifies on the transition into
//! availability, appends one line to the run log and exits.
//!
//! ## Exit codes
//!
//! - `0`: check completed, or skipped because another run holds the lock
//! - `1`: fetch failed or something unexpected went wrong
//! - `2`: invalid input
//!
//! ## Usage
//!
//! ```bash
//! parking-watch --target-date 2026-02-28 --location palisades
//! ```

mod logging;

use clap::Parser;
use watch_core::{Location, LogLevel, Orchestrator, RunReport, StorageConfig, WatchConfig};

#[derive(Parser)]
#[command(name = "parking-watch")]
#[command(about = "Check parking availability for one date and notify when it opens up")]
#[command(version)]
struct Cli {
    /// Target date in YYYY-MM-DD format
    #[arg(long, value_name = "YYYY-MM-DD")]
    target_date: String,

    /// Parking location to monitor (case-insensitive)
    #[arg(long, value_name = "ALPINE|PALISADES", default_value = "ALPINE", value_parser = parse_location)]
    location: Location,
}

fn parse_location(value: &str) -> Result<Location, String> {
    value.parse().map_err(|e: watch_core::ParseError| e.to_string())
}

fn main() {
    let cli = Cli::parse();

    let storage = match StorageConfig::from_env() {
        Ok(storage) => storage,
        Err(err) => {
            let _logging_guard = logging::init(None);
            tracing::error!(error = %err, "Failed to resolve storage directory");
            eprintln!("[ERROR] unexpected: {}", err);
            std::process::exit(1);
        }
    };

    let logging_guard = logging::init(Some(&storage));
    let config = WatchConfig::load(&storage);
    tracing::debug!(
        root = %storage.root().display(),
        webdriver = %config.webdriver_url,
        "Starting check"
    );

    let report = Orchestrator::production(storage, &config).run(&cli.target_date, cli.location);
    print_report(&report);

    drop(logging_guard);
    std::process::exit(report.exit.code());
}

fn print_report(report: &RunReport) {
    match report.level {
        LogLevel::Result => println!("[RESULT] {}", report.message),
        LogLevel::Skip => println!("[SKIP] Skipped! ({})", report.message),
        LogLevel::Error => eprintln!("[ERROR] {}", report.message),
    }
}
