//! Event Channel scenario runner
//!
//! Command-line front end for the event-channel library. It loads a TOML
//! scenario and replays it against a live channel:
//! - Subscribes and unsubscribes built-in listeners (free functions and
//!   methods bound to named tallies)
//! - Triggers readings and records which listeners ran, in order
//! - Reports the dispatch trace and final tally state (TXT/JSON)

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

mod callbacks;
mod config;
mod report;
mod runner;
mod state;

use config::OutputFormat;
use report::Report;
use runner::Scenario;

/// Event Channel - replay subscribe/trigger scenarios
#[derive(Parser, Debug)]
#[command(name = "event-channel-cli")]
#[command(about = "Replay event channel scenarios and report dispatch order", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the scenario file (.toml)
    #[arg(short, long, value_name = "FILE")]
    scenario: PathBuf,

    /// Report format (overrides the scenario's [output] format)
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Output file for the report (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Report listener counts after every step
    #[arg(long)]
    show_registry: bool,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("Event Channel CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using event-channel library v{}", event_channel::VERSION);

    log::info!("Loading scenario from: {:?}", args.scenario);
    let config = config::load_config(&args.scenario)?;
    let scenario = Scenario::from_config(&config)
        .with_context(|| format!("Invalid scenario: {:?}", args.scenario))?;
    log::info!("Running {}", scenario);

    let outcome = scenario.run();
    let show_registry = args.show_registry || config.output.show_registry;
    let report = Report::new(&scenario, outcome, show_registry);

    let format = args.format.unwrap_or(config.output.format);
    let rendered = report.render(format)?;

    match &args.output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write report: {:?}", path))?;
            log::info!("Report written to {:?}", path);
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "event-channel-cli",
            "--scenario",
            "ticks.toml",
            "--format",
            "json",
            "-vv",
        ])
        .unwrap();
        assert_eq!(args.scenario, PathBuf::from("ticks.toml"));
        assert_eq!(args.format, Some(OutputFormat::Json));
        assert_eq!(args.verbose, 2);
        assert!(!args.quiet);
    }

    #[test]
    fn test_bundled_scenario_runs() {
        let config = config::parse_config(include_str!("../scenarios/readings.toml")).unwrap();
        let scenario = Scenario::from_config(&config).unwrap();
        let outcome = scenario.run();
        assert!(outcome.steps.iter().any(|step| step.trigger.is_some()));
        assert_eq!(outcome.tallies.len(), 2);
    }
}
