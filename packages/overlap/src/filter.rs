//! Classifies raw woodland features and builds [`WoodlandParcel`]s.
//!
//! Natural England tags plantations on ancient woodland sites (`PAWS`)
//! under the same theme as genuine ancient woodland. They are commercial
//! plantations and are dropped here. Reserve features never pass through
//! this module.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use woodland_coverage_models::{UNKNOWN_NAME, WoodlandStatus};

use crate::OverlapError;
use crate::parcel::{RawFeature, WoodlandParcel};

/// Property names used to read woodland attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WoodlandFields {
    /// Identifier property (falls back to the GeoJSON feature `id`).
    pub id: String,
    /// Display name property.
    pub name: String,
    /// Status classification property.
    pub status: String,
}

impl Default for WoodlandFields {
    fn default() -> Self {
        Self {
            id: "OBJECTID".to_string(),
            name: "NAME".to_string(),
            status: "STATUS".to_string(),
        }
    }
}

/// Replaces a missing or blank name with [`UNKNOWN_NAME`].
#[must_use]
pub fn normalize_name(raw: Option<&str>) -> String {
    match raw {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        _ => UNKNOWN_NAME.to_string(),
    }
}

/// Turns one raw feature into a parcel, or `None` if it is not ancient
/// woodland.
///
/// # Errors
///
/// Returns [`OverlapError::MalformedGeometry`] if a retained feature has
/// an invalid geometry.
pub fn filter_feature(
    feature: RawFeature,
    fields: &WoodlandFields,
) -> Result<Option<WoodlandParcel>, OverlapError> {
    let status = WoodlandStatus::from_code(feature.property_str(&fields.status).unwrap_or(""));
    if !status.is_ancient() {
        log::debug!("Discarding {} woodland {}", status, feature.id);
        return Ok(None);
    }

    let name = normalize_name(feature.property_str(&fields.name));

    WoodlandParcel::new(feature.id, name, status, feature.geometry).map(Some)
}

/// Filters a whole woodland collection, preserving load order.
///
/// Logs the distinct status codes seen and how many parcels were dropped.
///
/// # Errors
///
/// Returns the first [`OverlapError`] raised by [`filter_feature`].
pub fn filter_woodland(
    features: Vec<RawFeature>,
    fields: &WoodlandFields,
) -> Result<Vec<WoodlandParcel>, OverlapError> {
    let total = features.len();
    let mut status_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut parcels = Vec::with_capacity(total);

    for feature in features {
        let code = feature.property_str(&fields.status).unwrap_or("").trim();
        *status_counts.entry(code.to_string()).or_default() += 1;

        if let Some(parcel) = filter_feature(feature, fields)? {
            if let WoodlandStatus::Other(code) = &parcel.status {
                log::debug!("Woodland {} has unrecognised status {code:?}", parcel.id);
            }
            parcels.push(parcel);
        }
    }

    for (code, count) in &status_counts {
        log::info!("Woodland status {code:?}: {count} features");
    }
    for (code, count) in unrecognised_statuses(&status_counts) {
        log::warn!(
            "Unrecognised woodland status {code:?} on {count} features; kept as ancient woodland"
        );
    }
    log::info!(
        "{} ancient woodland areas retained, {} discarded",
        parcels.len(),
        total - parcels.len()
    );

    Ok(parcels)
}

/// Status codes in `status_counts` that are neither known ancient codes nor
/// the replanted code, with their counts.
#[must_use]
pub fn unrecognised_statuses(status_counts: &BTreeMap<String, usize>) -> Vec<(&str, usize)> {
    status_counts
        .iter()
        .filter(|(code, _)| matches!(WoodlandStatus::from_code(code), WoodlandStatus::Other(_)))
        .map(|(code, count)| (code.as_str(), *count))
        .collect()
}
