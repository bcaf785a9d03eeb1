//! Input features, woodland parcels, reserve polygons and their bounding
//! boxes.

use geo::{BoundingRect, CoordsIter, MultiPolygon, Polygon};
use rstar::AABB;
use serde_json::{Map, Value};
use woodland_coverage_models::{FeatureId, WoodlandStatus};

use crate::OverlapError;

/// One feature as delivered by the loader: identifier, attributes and a
/// WGS84 polygonal geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFeature {
    pub id: FeatureId,
    pub properties: Map<String, Value>,
    pub geometry: MultiPolygon<f64>,
}

impl RawFeature {
    /// Looks up a property by exact key, falling back to a
    /// case-insensitive match (exports disagree on `NAME` vs `name`).
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key).or_else(|| {
            self.properties
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v)
        })
    }

    /// Looks up a string property. Non-string values yield `None`.
    #[must_use]
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.property(key).and_then(Value::as_str)
    }
}

/// Axis-aligned extents in the geometry's native coordinate system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Computes the extents of a multi-polygon, or `None` if it has no
    /// coordinates.
    #[must_use]
    pub fn of(geometry: &MultiPolygon<f64>) -> Option<Self> {
        geometry.bounding_rect().map(|rect| Self {
            min_x: rect.min().x,
            min_y: rect.min().y,
            max_x: rect.max().x,
            max_y: rect.max().y,
        })
    }

    /// Whether the two boxes share at least one point. Touching edges count.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    /// The same box as an `rstar` envelope.
    #[must_use]
    pub fn to_aabb(&self) -> AABB<[f64; 2]> {
        AABB::from_corners([self.min_x, self.min_y], [self.max_x, self.max_y])
    }
}

/// A retained ancient woodland parcel.
///
/// Immutable once built; overlap accumulation happens in the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct WoodlandParcel {
    pub id: FeatureId,
    pub name: String,
    pub status: WoodlandStatus,
    pub geometry: MultiPolygon<f64>,
    pub bbox: BoundingBox,
}

impl WoodlandParcel {
    /// Builds a parcel, validating the geometry and deriving its box.
    ///
    /// # Errors
    ///
    /// Returns [`OverlapError::MalformedGeometry`] if the geometry is empty,
    /// has a ring with fewer than four positions, or contains non-finite
    /// coordinates.
    pub fn new(
        id: FeatureId,
        name: String,
        status: WoodlandStatus,
        geometry: MultiPolygon<f64>,
    ) -> Result<Self, OverlapError> {
        let bbox = validate_geometry(&id, &geometry)?;
        Ok(Self {
            id,
            name,
            status,
            geometry,
            bbox,
        })
    }
}

/// A nature reserve polygon. Read-only once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservePolygon {
    pub id: FeatureId,
    pub name: Option<String>,
    pub geometry: MultiPolygon<f64>,
    pub bbox: BoundingBox,
}

impl ReservePolygon {
    /// Builds a reserve, validating the geometry and deriving its box.
    ///
    /// # Errors
    ///
    /// Returns [`OverlapError::MalformedGeometry`] under the same conditions
    /// as [`WoodlandParcel::new`].
    pub fn new(
        id: FeatureId,
        name: Option<String>,
        geometry: MultiPolygon<f64>,
    ) -> Result<Self, OverlapError> {
        let bbox = validate_geometry(&id, &geometry)?;
        Ok(Self {
            id,
            name,
            geometry,
            bbox,
        })
    }

    /// Builds a reserve from a loaded feature. Reserves are never filtered.
    ///
    /// # Errors
    ///
    /// See [`ReservePolygon::new`].
    pub fn from_feature(feature: RawFeature, name_field: &str) -> Result<Self, OverlapError> {
        let name = feature
            .property_str(name_field)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string);
        Self::new(feature.id, name, feature.geometry)
    }
}

fn validate_geometry(
    id: &FeatureId,
    geometry: &MultiPolygon<f64>,
) -> Result<BoundingBox, OverlapError> {
    let malformed = |reason: String| OverlapError::MalformedGeometry {
        id: id.clone(),
        reason,
    };

    if geometry.0.is_empty() {
        return Err(malformed("no polygons".to_string()));
    }

    for (index, polygon) in geometry.0.iter().enumerate() {
        check_rings(polygon).map_err(|reason| malformed(format!("polygon {index}: {reason}")))?;
    }

    if geometry.coords_iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Err(malformed("non-finite coordinate".to_string()));
    }

    BoundingBox::of(geometry).ok_or_else(|| malformed("no coordinates".to_string()))
}

/// Rings are closed by `geo` on construction, so a valid ring has at least
/// four positions (a triangle plus the closing vertex).
fn check_rings(polygon: &Polygon<f64>) -> Result<(), String> {
    let exterior = polygon.exterior().0.len();
    if exterior < 4 {
        return Err(format!("exterior ring has {exterior} positions"));
    }
    for (index, ring) in polygon.interiors().iter().enumerate() {
        let len = ring.0.len();
        if len < 4 {
            return Err(format!("interior ring {index} has {len} positions"));
        }
    }
    Ok(())
}
