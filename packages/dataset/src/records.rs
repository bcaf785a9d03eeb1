//! Per-run CSV record files and the JSON summary.
//!
//! Column names follow the published outputs (`OBJECTID`, `name`,
//! `area_in_nature_reserve`, `total_area`). Areas are written at full
//! precision; rounding is left to whoever reads the file.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use woodland_coverage_models::{FeatureId, OverlapRecord, RecordSchema, SummaryRecord};

use crate::DatasetError;

/// A record without the `total_area` column.
#[derive(Serialize)]
struct MinimalRow<'a> {
    #[serde(rename = "OBJECTID")]
    id: &'a FeatureId,
    name: &'a str,
    #[serde(rename = "area_in_nature_reserve")]
    area_within_km2: f64,
}

/// A record as read back, with `total_area` optional.
///
/// The id is read verbatim: letting `csv` guess its type would turn text
/// ids such as `1.5` or `true` into the wrong kind of value.
#[derive(Deserialize)]
struct RecordRow {
    #[serde(rename = "OBJECTID")]
    id: String,
    name: String,
    #[serde(rename = "area_in_nature_reserve")]
    area_within_km2: f64,
    #[serde(rename = "total_area", default)]
    total_area_km2: Option<f64>,
}

/// Writes records as CSV with a header row.
///
/// # Errors
///
/// Returns [`DatasetError::Csv`] if serialization or the underlying
/// writer fails.
pub fn write_records<W: Write>(
    writer: W,
    records: &[OverlapRecord],
    schema: RecordSchema,
) -> Result<(), DatasetError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for record in records {
        match schema {
            RecordSchema::Full => csv_writer.serialize(record)?,
            RecordSchema::Minimal => csv_writer.serialize(MinimalRow {
                id: &record.id,
                name: &record.name,
                area_within_km2: record.area_within_km2,
            })?,
        }
    }

    // An empty run still gets a header so the file can be read back.
    if records.is_empty() {
        match schema {
            RecordSchema::Full => csv_writer.write_record([
                "OBJECTID",
                "name",
                "area_in_nature_reserve",
                "total_area",
            ])?,
            RecordSchema::Minimal => {
                csv_writer.write_record(["OBJECTID", "name", "area_in_nature_reserve"])?;
            }
        }
    }

    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Writes records to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`DatasetError`] if the file can't be created or written.
pub fn write_records_to_path(
    path: &Path,
    records: &[OverlapRecord],
    schema: RecordSchema,
) -> Result<(), DatasetError> {
    let file = create_file(path)?;
    write_records(file, records, schema)?;
    log::info!(
        "Wrote {} records ({schema} schema) to {}",
        records.len(),
        path.display()
    );
    Ok(())
}

/// Reads records back from CSV.
///
/// `source` names the input in error messages.
///
/// # Errors
///
/// Returns [`DatasetError::MissingTotalArea`] if any row lacks a total
/// area (minimal schema), or [`DatasetError::Csv`] for malformed input.
pub fn read_records<R: Read>(reader: R, source: &str) -> Result<Vec<OverlapRecord>, DatasetError> {
    let mut csv_reader = csv::Reader::from_reader(reader);

    csv_reader
        .deserialize::<RecordRow>()
        .map(|row| {
            let row = row?;
            let total_area_km2 = row.total_area_km2.ok_or_else(|| DatasetError::MissingTotalArea {
                path: source.to_string(),
            })?;
            Ok(OverlapRecord {
                id: parse_id(row.id),
                name: row.name,
                area_within_km2: row.area_within_km2,
                total_area_km2,
            })
        })
        .collect()
}

/// Reads records from a CSV file. See [`read_records`].
///
/// # Errors
///
/// Returns [`DatasetError::Io`] if the file can't be opened, otherwise as
/// [`read_records`].
pub fn read_records_from_path(path: &Path) -> Result<Vec<OverlapRecord>, DatasetError> {
    let file = File::open(path).map_err(|e| DatasetError::io(path, e))?;
    let records = read_records(file, &path.display().to_string())?;
    log::info!("Read {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Writes the summary as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`DatasetError::Json`] if serialization or writing fails.
pub fn write_summary<W: Write>(writer: W, summary: &SummaryRecord) -> Result<(), DatasetError> {
    serde_json::to_writer_pretty(writer, summary)?;
    Ok(())
}

/// Writes the summary to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`DatasetError`] if the file can't be created or written.
pub fn write_summary_to_path(path: &Path, summary: &SummaryRecord) -> Result<(), DatasetError> {
    let file = create_file(path)?;
    write_summary(file, summary)?;
    log::info!("Wrote summary to {}", path.display());
    Ok(())
}

/// Integer-looking ids become [`FeatureId::Number`], anything else stays text.
fn parse_id(raw: String) -> FeatureId {
    raw.parse::<i64>()
        .map_or_else(|_| FeatureId::Text(raw), FeatureId::Number)
}

fn create_file(path: &Path) -> Result<File, DatasetError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| DatasetError::io(parent, e))?;
    }
    File::create(path).map_err(|e| DatasetError::io(path, e))
}
