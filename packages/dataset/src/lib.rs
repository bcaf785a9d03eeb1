#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! File formats around the overlap core.
//!
//! [`load`] reads Natural England GeoJSON exports into [`RawFeature`]s and
//! [`records`] writes (and re-reads) the per-run CSV files and the JSON
//! summary.
//!
//! [`RawFeature`]: woodland_overlap::RawFeature

pub mod load;
pub mod records;

use std::path::PathBuf;

use thiserror::Error;
use woodland_coverage_models::FeatureId;
use woodland_overlap::OverlapError;

/// Errors that can occur while loading or writing datasets.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Reading or writing a file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid GeoJSON.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The document parsed but is not a `FeatureCollection`.
    #[error("Expected a FeatureCollection, found {found}")]
    NotFeatureCollection {
        /// The GeoJSON object type found instead.
        found: &'static str,
    },

    /// A feature has no usable identifier.
    #[error("Feature #{index} has no '{field}' property and no feature id")]
    MissingIdentifier {
        /// Position of the feature in the collection.
        index: usize,
        /// Identifier property that was looked up.
        field: String,
    },

    /// A feature has a null geometry.
    #[error("Feature {id} has no geometry")]
    MissingGeometry {
        /// Offending feature.
        id: FeatureId,
    },

    /// A feature's geometry is not a polygon or multi-polygon.
    #[error("Feature {id} has unsupported geometry type {kind}")]
    UnsupportedGeometry {
        /// Offending feature.
        id: FeatureId,
        /// Geometry type found.
        kind: &'static str,
    },

    /// A record file lacks the `total_area` column needed for the summary.
    #[error("{path} has no total_area column; write it with the full schema")]
    MissingTotalArea {
        /// Offending record file.
        path: String,
    },

    /// CSV reading or writing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Building parcels or reserves from the features failed.
    #[error(transparent)]
    Overlap(#[from] OverlapError),
}

impl DatasetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
