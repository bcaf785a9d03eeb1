#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared types for the ancient woodland reserve coverage pipeline.
//!
//! These types are produced by the overlap engine, written by the dataset
//! crate, and read back again by the cross-run summary. They carry no
//! geometry so they can be shared without pulling in the `geo` stack.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Sentinel display name for parcels whose name attribute is blank.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Stable identifier of a feature within one dataset.
///
/// Source datasets use integer `OBJECTID`s, but GeoJSON allows string ids
/// too, so both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureId {
    /// Integer identifier (e.g. an `ArcGIS` `OBJECTID`).
    Number(i64),
    /// Free-form string identifier.
    Text(String),
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for FeatureId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for FeatureId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FeatureId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl FeatureId {
    /// Builds an identifier from a float, which is how some exports encode
    /// integer ids (`1.0`). Fractional values keep their textual form.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite()
            && value.fract() == 0.0
            && value >= i64::MIN as f64
            && value <= i64::MAX as f64
        {
            Self::Number(value as i64)
        } else {
            Self::Text(value.to_string())
        }
    }
}

/// Classification of an ancient woodland parcel.
///
/// Parsed from the Natural England `STATUS` code. Codes outside the known
/// set are kept verbatim in [`WoodlandStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum WoodlandStatus {
    /// Ancient & Semi-Natural Woodland.
    #[strum(serialize = "ASNW")]
    AncientSemiNatural,
    /// Restored Ancient Woodland Site.
    #[strum(serialize = "RAWS")]
    Restored,
    /// Plantation on Ancient Woodland Site. Not ancient woodland.
    #[strum(serialize = "PAWS")]
    ReplantedOnAncientSite,
    /// Any status code not listed above.
    #[strum(default)]
    Other(String),
}

impl WoodlandStatus {
    /// Parses a status code, trimming surrounding whitespace.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        let code = code.trim();
        code.parse()
            .unwrap_or_else(|_| Self::Other(code.to_string()))
    }

    /// Returns the source status code.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::AncientSemiNatural => "ASNW",
            Self::Restored => "RAWS",
            Self::ReplantedOnAncientSite => "PAWS",
            Self::Other(code) => code,
        }
    }

    /// Whether parcels with this status count as ancient woodland.
    #[must_use]
    pub const fn is_ancient(&self) -> bool {
        !matches!(self, Self::ReplantedOnAncientSite)
    }
}

impl fmt::Display for WoodlandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Administrative scope of a reserve dataset.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Granularity {
    /// National Nature Reserves.
    National,
    /// Local Nature Reserves.
    Local,
}

/// Column layout of a written overlap record file.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecordSchema {
    /// `OBJECTID`, `name`, `area_in_nature_reserve`, `total_area`.
    #[default]
    Full,
    /// `OBJECTID`, `name`, `area_in_nature_reserve`. Cannot feed the summary.
    Minimal,
}

/// Overlap result for one retained woodland parcel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlapRecord {
    /// Woodland parcel identifier.
    #[serde(rename = "OBJECTID")]
    pub id: FeatureId,
    /// Display name, never blank.
    pub name: String,
    /// Area inside nature reserves, in square kilometres.
    #[serde(rename = "area_in_nature_reserve")]
    pub area_within_km2: f64,
    /// Total parcel area, in square kilometres.
    #[serde(rename = "total_area")]
    pub total_area_km2: f64,
}

/// Cross-run coverage summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    /// Area of all distinct woodland parcels, in square kilometres.
    pub area_total: f64,
    /// Area inside reserves summed over every run, in square kilometres.
    pub area_within: f64,
    /// `area_within / area_total`.
    #[serde(rename = "ancient_woodland_within_nature_reserves")]
    pub coverage_ratio: f64,
}

impl SummaryRecord {
    /// Coverage expressed as a percentage.
    #[must_use]
    pub fn coverage_percent(&self) -> f64 {
        self.coverage_ratio * 100.0
    }
}
