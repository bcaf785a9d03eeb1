#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Measures how much of England's ancient woodland lies inside national
//! and local nature reserves.
//!
//! Uses `indicatif-log-bridge` (via [`woodland_cli_utils::init_logger`]) so
//! log lines and the per-reserve progress bars share the terminal.

mod config;
mod pipeline;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use woodland_cli_utils::IndicatifProgress;
use woodland_coverage_models::Granularity;
use woodland_overlap::ScanStrategy;
use woodland_overlap::progress::ProgressCallback as _;

use pipeline::PipelineError;

#[derive(Parser)]
#[command(
    name = "woodland_cli",
    about = "Ancient woodland nature reserve coverage"
)]
struct Cli {
    /// Run configuration file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Overrides `[scan] strategy` from the config (`brute-force` or `r-tree`)
    #[arg(long, value_parser = parse_strategy)]
    strategy: Option<ScanStrategy>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Overlap with National Nature Reserves
    National,
    /// Overlap with Local Nature Reserves
    Local,
    /// Aggregate existing national and local record files
    Summary,
    /// National, local, then summary
    All,
}

fn parse_strategy(s: &str) -> Result<ScanStrategy, String> {
    s.parse::<ScanStrategy>()
        .map_err(|e| format!("{e}: expected `brute-force` or `r-tree`"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = woodland_cli_utils::init_logger();
    let cli = Cli::parse();

    let config = config::load_config(&cli.config)?;
    let strategy = cli.strategy.unwrap_or(config.scan.strategy);

    match cli.command {
        Commands::National | Commands::Local => {
            let granularity = if matches!(cli.command, Commands::National) {
                Granularity::National
            } else {
                Granularity::Local
            };
            let progress = IndicatifProgress::reserves_bar(&multi, granularity.as_ref());
            pipeline::run_granularity(&config, granularity, strategy, progress)?;
        }
        Commands::Summary => {
            pipeline::run_summary(&config)?;
        }
        Commands::All => {
            let steps = IndicatifProgress::steps_bar(&multi, "Coverage", 3);
            let parcels = pipeline::load_parcels(&config)?;

            for granularity in [Granularity::National, Granularity::Local] {
                steps.set_message(format!("Coverage: {granularity}"));
                let progress = IndicatifProgress::reserves_bar(&multi, granularity.as_ref());
                pipeline::scan_granularity(&config, granularity, &parcels, strategy, progress)?;
                steps.inc(1);
            }

            steps.set_message("Coverage: summary".to_string());
            let summary = pipeline::run_summary(&config)?;
            steps.inc(1);
            steps.finish(format!(
                "Coverage: {:.2}% within nature reserves",
                summary.coverage_percent()
            ));
        }
    }

    Ok(())
}
