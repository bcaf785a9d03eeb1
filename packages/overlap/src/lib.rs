#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Woodland/reserve overlap computation.
//!
//! The pipeline for one granularity run is:
//!
//! 1. [`filter::filter_woodland`] drops replanted (`PAWS`) parcels and
//!    normalizes blank names.
//! 2. [`engine::OverlapEngine::compute_overlaps`] measures each parcel's own
//!    area and its intersection with every reserve whose bounding box
//!    overlaps it, in square kilometres on the British National Grid.
//!
//! [`aggregate`] then joins the national and local runs into a single
//! coverage ratio, counting each woodland identifier's area once.

pub mod aggregate;
pub mod engine;
pub mod filter;
pub mod parcel;
pub mod progress;

pub use engine::{OverlapEngine, OverlapRun, ScanStats, ScanStrategy, compute_overlaps};
pub use parcel::{BoundingBox, RawFeature, ReservePolygon, WoodlandParcel};

use thiserror::Error;
use woodland_coverage_models::FeatureId;
use woodland_projection::ProjectionError;

/// Errors that can occur while building parcels or computing overlaps.
#[derive(Debug, Error)]
pub enum OverlapError {
    /// Geometry is empty or has a degenerate ring.
    #[error("Malformed geometry for feature {id}: {reason}")]
    MalformedGeometry {
        /// Offending feature.
        id: FeatureId,
        /// What is wrong with it.
        reason: String,
    },

    /// A vertex of the feature could not be reprojected.
    #[error("Failed to reproject feature {id}: {source}")]
    Reprojection {
        /// Offending feature.
        id: FeatureId,
        /// Underlying projection failure.
        #[source]
        source: ProjectionError,
    },
}

/// Errors that can occur while aggregating run results.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// No woodland area at all, so the coverage ratio is undefined.
    #[error(
        "Total woodland area is {area_total} km^2; inputs are empty or mis-joined, refusing to compute a coverage ratio"
    )]
    ZeroTotalArea {
        /// The offending total.
        area_total: f64,
    },
}
