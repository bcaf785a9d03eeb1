//! Granularity runs and the cross-run summary.
//!
//! Each granularity run loads the woodland and reserve datasets, scans them
//! and writes one record file. The summary reads those files back, so it can
//! be re-run without repeating the scans.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use woodland_coverage_models::{Granularity, SummaryRecord};
use woodland_dataset::DatasetError;
use woodland_dataset::load::{load_reserves, load_woodland};
use woodland_dataset::records::{
    read_records_from_path, write_records_to_path, write_summary_to_path,
};
use woodland_overlap::aggregate::summarize_runs;
use woodland_overlap::progress::ProgressCallback;
use woodland_overlap::{
    AggregateError, OverlapEngine, OverlapError, OverlapRun, ScanStrategy, WoodlandParcel,
};
use woodland_projection::OsgbReprojector;

use crate::config::RunConfig;

/// Errors that can occur while running the analysis.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The run configuration could not be read or parsed.
    #[error(
        "Invalid configuration{}: {message}",
        .path.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default()
    )]
    Config {
        /// Config file, if one was read.
        path: Option<PathBuf>,
        message: String,
    },

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Overlap(#[from] OverlapError),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

/// Loads and filters the woodland dataset named in `config`.
///
/// # Errors
///
/// Returns [`PipelineError::Dataset`] if the file can't be loaded.
pub fn load_parcels(config: &RunConfig) -> Result<Vec<WoodlandParcel>, PipelineError> {
    Ok(load_woodland(&config.woodland.path, &config.woodland.fields)?)
}

/// Runs one granularity from scratch and writes its record file.
///
/// # Errors
///
/// Returns [`PipelineError`] if loading, scanning or writing fails.
pub fn run_granularity(
    config: &RunConfig,
    granularity: Granularity,
    strategy: ScanStrategy,
    progress: Arc<dyn ProgressCallback>,
) -> Result<OverlapRun, PipelineError> {
    let parcels = load_parcels(config)?;
    scan_granularity(config, granularity, &parcels, strategy, progress)
}

/// Scans already-loaded `parcels` against one granularity's reserves and
/// writes its record file.
///
/// # Errors
///
/// Returns [`PipelineError`] if loading reserves, scanning or writing fails.
pub fn scan_granularity(
    config: &RunConfig,
    granularity: Granularity,
    parcels: &[WoodlandParcel],
    strategy: ScanStrategy,
    progress: Arc<dyn ProgressCallback>,
) -> Result<OverlapRun, PipelineError> {
    let run = config.run(granularity);
    let start = Instant::now();

    log::info!("Starting {granularity} run");
    let reserves = load_reserves(&run.reserves, &run.id_field, run.name_field(granularity))?;

    let reprojector = OsgbReprojector::new();
    let result = OverlapEngine::new(&reprojector)
        .with_strategy(strategy)
        .with_progress(progress)
        .compute_overlaps(parcels, &reserves)?;

    write_records_to_path(&run.output, &result.records, run.schema)?;

    let overlapping = result
        .records
        .iter()
        .filter(|record| record.area_within_km2 > 0.0)
        .count();
    log::info!(
        "{granularity} run complete in {:.1}s: {overlapping} of {} ancient woodland areas overlap a reserve",
        start.elapsed().as_secs_f64(),
        result.records.len(),
    );

    Ok(result)
}

/// Aggregates the local and national record files into the summary.
///
/// Local records are read first, so a parcel's total area is taken from
/// the local file when both have it.
///
/// # Errors
///
/// Returns [`PipelineError`] if a record file can't be read (or was
/// written with the minimal schema), the total area is zero, or the
/// summary can't be written.
pub fn run_summary(config: &RunConfig) -> Result<SummaryRecord, PipelineError> {
    let local = read_records_from_path(&config.local.output)?;
    let national = read_records_from_path(&config.national.output)?;

    let summary = summarize_runs([local.as_slice(), national.as_slice()])?;
    write_summary_to_path(&config.summary.output, &summary)?;

    log::info!(
        "{:.2}% of ancient woodland lies within nature reserves",
        summary.coverage_percent()
    );

    Ok(summary)
}
