//! TOML run configuration.
//!
//! Paths are used as given; relative paths resolve against the working
//! directory, not the config file.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use woodland_coverage_models::{Granularity, RecordSchema};
use woodland_overlap::ScanStrategy;
use woodland_overlap::filter::WoodlandFields;

use crate::PipelineError;

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "woodland.toml";

/// Everything one invocation needs.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    pub woodland: WoodlandSource,
    pub national: ReserveRun,
    pub local: ReserveRun,
    pub summary: SummaryOutput,
    #[serde(default)]
    pub scan: ScanConfig,
}

/// The ancient woodland dataset.
#[derive(Debug, Clone, Deserialize)]
pub struct WoodlandSource {
    pub path: PathBuf,
    #[serde(default)]
    pub fields: WoodlandFields,
}

/// One granularity's reserve input and record output.
#[derive(Debug, Clone, Deserialize)]
pub struct ReserveRun {
    pub reserves: PathBuf,
    pub output: PathBuf,
    #[serde(default)]
    pub schema: RecordSchema,
    #[serde(default = "default_id_field")]
    pub id_field: String,
    /// Reserve name property; defaults per granularity when absent.
    #[serde(default)]
    pub name_field: Option<String>,
}

impl ReserveRun {
    /// The reserve name property, falling back to the Natural England
    /// column for `granularity`.
    #[must_use]
    pub fn name_field(&self, granularity: Granularity) -> &str {
        self.name_field
            .as_deref()
            .unwrap_or_else(|| default_name_field(granularity))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummaryOutput {
    pub output: PathBuf,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ScanConfig {
    #[serde(default)]
    pub strategy: ScanStrategy,
}

impl RunConfig {
    /// The reserve run for `granularity`.
    #[must_use]
    pub const fn run(&self, granularity: Granularity) -> &ReserveRun {
        match granularity {
            Granularity::National => &self.national,
            Granularity::Local => &self.local,
        }
    }
}

fn default_id_field() -> String {
    "OBJECTID".to_string()
}

const fn default_name_field(granularity: Granularity) -> &'static str {
    match granularity {
        Granularity::National => "NNR_NAME",
        Granularity::Local => "LNR_NAME",
    }
}

/// Parses a [`RunConfig`] from a TOML string.
///
/// `path` names the source in errors, if it came from a file.
///
/// # Errors
///
/// Returns [`PipelineError::Config`] if the TOML is malformed or missing
/// required sections.
pub fn parse_config(toml_str: &str, path: Option<&Path>) -> Result<RunConfig, PipelineError> {
    toml::de::from_str(toml_str).map_err(|e| PipelineError::Config {
        path: path.map(Path::to_path_buf),
        message: e.to_string(),
    })
}

/// Reads and parses a [`RunConfig`] file.
///
/// # Errors
///
/// Returns [`PipelineError::Config`] if the file can't be read or parsed.
pub fn load_config(path: &Path) -> Result<RunConfig, PipelineError> {
    let toml_str = std::fs::read_to_string(path).map_err(|e| PipelineError::Config {
        path: Some(path.to_path_buf()),
        message: e.to_string(),
    })?;
    let config = parse_config(&toml_str, Some(path))?;
    log::debug!("Loaded run configuration from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[woodland]
path = "data/Ancient_Woodland_England.geojson"

[national]
reserves = "data/National_Nature_Reserves_England.geojson"
output = "output/ancient_woodland_national.csv"

[local]
reserves = "data/Local_Nature_Reserves_England.json"
output = "output/ancient_woodland_local.csv"
schema = "minimal"
name_field = "NAME"

[summary]
output = "output/summary.json"
"#;

    #[test]
    fn fills_in_defaults() {
        let config = parse_config(MINIMAL, None).unwrap();

        assert_eq!(config.woodland.fields, WoodlandFields::default());
        assert_eq!(config.national.schema, RecordSchema::Full);
        assert_eq!(config.national.id_field, "OBJECTID");
        assert_eq!(config.national.name_field(Granularity::National), "NNR_NAME");
        assert_eq!(config.scan.strategy, ScanStrategy::BruteForce);
    }

    #[test]
    fn explicit_values_win() {
        let config = parse_config(MINIMAL, None).unwrap();

        assert_eq!(config.local.schema, RecordSchema::Minimal);
        assert_eq!(config.local.name_field(Granularity::Local), "NAME");
        assert_eq!(
            config.run(Granularity::Local).reserves,
            PathBuf::from("data/Local_Nature_Reserves_England.json")
        );
    }

    #[test]
    fn parses_scan_strategy_and_field_overrides() {
        let toml_str = format!(
            "{MINIMAL}\n[scan]\nstrategy = \"r-tree\"\n\n[woodland.fields]\nstatus = \"THEME\"\n"
        );
        let config = parse_config(&toml_str, None).unwrap();

        assert_eq!(config.scan.strategy, ScanStrategy::RTree);
        assert_eq!(config.woodland.fields.status, "THEME");
        assert_eq!(config.woodland.fields.name, "NAME");
    }

    #[test]
    fn missing_section_is_an_error() {
        let err = parse_config("[woodland]\npath = \"a.geojson\"\n", None).unwrap_err();
        assert!(matches!(err, PipelineError::Config { path: None, .. }));
    }
}
