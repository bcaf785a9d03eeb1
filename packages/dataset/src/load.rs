//! Loads GeoJSON `FeatureCollection`s into [`RawFeature`]s.
//!
//! Every feature must carry an identifier and a `Polygon` or
//! `MultiPolygon` geometry. A collection with anything else in it is
//! rejected as a whole: a mixed dataset can't be reasoned about safely.

use std::path::Path;

use geo::MultiPolygon;
use geojson::{Feature, GeoJson, feature::Id};
use serde_json::Value;
use woodland_coverage_models::FeatureId;
use woodland_overlap::filter::{WoodlandFields, filter_woodland};
use woodland_overlap::{RawFeature, ReservePolygon, WoodlandParcel};

use crate::DatasetError;

/// Parses a GeoJSON document into features.
///
/// The identifier is read from the `id_field` property, falling back to
/// the feature's own `id` member.
///
/// # Errors
///
/// Returns [`DatasetError`] if the document is not a valid
/// `FeatureCollection`, or any feature lacks an identifier or a polygonal
/// geometry.
pub fn parse_feature_collection(
    json: &str,
    id_field: &str,
) -> Result<Vec<RawFeature>, DatasetError> {
    let collection = match json.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => collection,
        GeoJson::Feature(_) => return Err(DatasetError::NotFeatureCollection { found: "Feature" }),
        GeoJson::Geometry(_) => {
            return Err(DatasetError::NotFeatureCollection { found: "Geometry" });
        }
    };

    collection
        .features
        .into_iter()
        .enumerate()
        .map(|(index, feature)| convert_feature(index, feature, id_field))
        .collect()
}

/// Reads and parses a GeoJSON file. See [`parse_feature_collection`].
///
/// # Errors
///
/// Returns [`DatasetError::Io`] if the file can't be read, otherwise as
/// [`parse_feature_collection`].
pub fn load_feature_collection(
    path: &Path,
    id_field: &str,
) -> Result<Vec<RawFeature>, DatasetError> {
    log::info!("Loading features from {}", path.display());
    let json = std::fs::read_to_string(path).map_err(|e| DatasetError::io(path, e))?;
    let features = parse_feature_collection(&json, id_field)?;
    log::info!("Loaded {} features from {}", features.len(), path.display());
    Ok(features)
}

/// Loads a woodland file and keeps only ancient woodland parcels.
///
/// # Errors
///
/// Returns [`DatasetError`] if loading fails or a retained parcel has a
/// malformed geometry.
pub fn load_woodland(
    path: &Path,
    fields: &WoodlandFields,
) -> Result<Vec<WoodlandParcel>, DatasetError> {
    let features = load_feature_collection(path, &fields.id)?;
    Ok(filter_woodland(features, fields)?)
}

/// Loads a reserve file. Reserves are not filtered.
///
/// # Errors
///
/// Returns [`DatasetError`] if loading fails or a reserve has a malformed
/// geometry.
pub fn load_reserves(
    path: &Path,
    id_field: &str,
    name_field: &str,
) -> Result<Vec<ReservePolygon>, DatasetError> {
    let reserves = load_feature_collection(path, id_field)?
        .into_iter()
        .map(|feature| ReservePolygon::from_feature(feature, name_field))
        .collect::<Result<Vec<_>, _>>()?;
    log::info!("Found {} nature reserves", reserves.len());
    Ok(reserves)
}

fn convert_feature(
    index: usize,
    feature: Feature,
    id_field: &str,
) -> Result<RawFeature, DatasetError> {
    let properties = feature.properties.unwrap_or_default();

    let id = properties
        .get(id_field)
        .and_then(feature_id_from_value)
        .or_else(|| feature.id.map(feature_id_from_geojson))
        .ok_or_else(|| DatasetError::MissingIdentifier {
            index,
            field: id_field.to_string(),
        })?;

    let Some(geometry) = feature.geometry else {
        return Err(DatasetError::MissingGeometry { id });
    };

    let geometry = match geo::Geometry::<f64>::try_from(geometry)? {
        geo::Geometry::Polygon(polygon) => MultiPolygon(vec![polygon]),
        geo::Geometry::MultiPolygon(multi_polygon) => multi_polygon,
        other => {
            return Err(DatasetError::UnsupportedGeometry {
                id,
                kind: geometry_kind(&other),
            });
        }
    };

    Ok(RawFeature {
        id,
        properties,
        geometry,
    })
}

fn feature_id_from_value(value: &Value) -> Option<FeatureId> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(FeatureId::Number)
            .or_else(|| n.as_f64().map(FeatureId::from_f64)),
        Value::String(s) if !s.trim().is_empty() => Some(FeatureId::Text(s.clone())),
        _ => None,
    }
}

fn feature_id_from_geojson(id: Id) -> FeatureId {
    match id {
        Id::String(s) => FeatureId::Text(s),
        Id::Number(n) => n
            .as_i64()
            .map(FeatureId::Number)
            .or_else(|| n.as_f64().map(FeatureId::from_f64))
            .unwrap_or_else(|| FeatureId::Text(n.to_string())),
    }
}

const fn geometry_kind(geometry: &geo::Geometry<f64>) -> &'static str {
    match geometry {
        geo::Geometry::Point(_) => "Point",
        geo::Geometry::Line(_) => "Line",
        geo::Geometry::LineString(_) => "LineString",
        geo::Geometry::Polygon(_) => "Polygon",
        geo::Geometry::MultiPoint(_) => "MultiPoint",
        geo::Geometry::MultiLineString(_) => "MultiLineString",
        geo::Geometry::MultiPolygon(_) => "MultiPolygon",
        geo::Geometry::GeometryCollection(_) => "GeometryCollection",
        geo::Geometry::Rect(_) => "Rect",
        geo::Geometry::Triangle(_) => "Triangle",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn square() -> Value {
        json!({
            "type": "Polygon",
            "coordinates": [[
                [-1.0, 52.0], [-0.99, 52.0], [-0.99, 52.01], [-1.0, 52.01], [-1.0, 52.0]
            ]]
        })
    }

    fn collection(features: Vec<Value>) -> String {
        json!({
            "type": "FeatureCollection",
            "name": "Fixture",
            "features": features,
        })
        .to_string()
    }

    #[test]
    fn parses_polygon_and_multipolygon_features() {
        let json = collection(vec![
            json!({
                "type": "Feature",
                "properties": {"OBJECTID": 1, "NAME": "Long wood"},
                "geometry": square(),
            }),
            json!({
                "type": "Feature",
                "properties": {"OBJECTID": 2},
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [square()["coordinates"].clone()],
                },
            }),
        ]);

        let features = parse_feature_collection(&json, "OBJECTID").unwrap();

        assert_eq!(features.len(), 2);
        assert_eq!(features[0].id, FeatureId::Number(1));
        assert_eq!(features[0].property_str("NAME"), Some("Long wood"));
        assert_eq!(features[1].geometry.0.len(), 1);
        assert_eq!(features[1].geometry.0[0].exterior().0.len(), 5);
    }

    #[test]
    fn falls_back_to_feature_id() {
        let json = collection(vec![json!({
            "type": "Feature",
            "id": "nnr-7",
            "properties": {},
            "geometry": square(),
        })]);

        let features = parse_feature_collection(&json, "OBJECTID").unwrap();
        assert_eq!(features[0].id, FeatureId::Text("nnr-7".to_string()));
    }

    #[test]
    fn float_object_ids_become_integers() {
        let json = collection(vec![json!({
            "type": "Feature",
            "properties": {"OBJECTID": 12.0},
            "geometry": square(),
        })]);

        let features = parse_feature_collection(&json, "OBJECTID").unwrap();
        assert_eq!(features[0].id, FeatureId::Number(12));
    }

    #[test]
    fn rejects_features_without_identifier() {
        let json = collection(vec![json!({
            "type": "Feature",
            "properties": {"NAME": "Anonymous"},
            "geometry": square(),
        })]);

        let err = parse_feature_collection(&json, "OBJECTID").unwrap_err();
        assert!(matches!(err, DatasetError::MissingIdentifier { index: 0, .. }));
    }

    #[test]
    fn rejects_point_geometry() {
        let json = collection(vec![json!({
            "type": "Feature",
            "properties": {"OBJECTID": 3},
            "geometry": {"type": "Point", "coordinates": [-1.0, 52.0]},
        })]);

        let err = parse_feature_collection(&json, "OBJECTID").unwrap_err();
        assert!(matches!(
            err,
            DatasetError::UnsupportedGeometry { kind: "Point", .. }
        ));
    }

    #[test]
    fn rejects_null_geometry() {
        let json = collection(vec![json!({
            "type": "Feature",
            "properties": {"OBJECTID": 4},
            "geometry": null,
        })]);

        let err = parse_feature_collection(&json, "OBJECTID").unwrap_err();
        assert!(matches!(err, DatasetError::MissingGeometry { .. }));
    }

    #[test]
    fn rejects_bare_geometry_documents() {
        let err = parse_feature_collection(&square().to_string(), "OBJECTID").unwrap_err();
        assert!(matches!(
            err,
            DatasetError::NotFeatureCollection { found: "Geometry" }
        ));
    }

    #[test]
    fn rejects_non_geojson() {
        let err = parse_feature_collection("{\"type\": \"Banana\"}", "OBJECTID").unwrap_err();
        assert!(matches!(err, DatasetError::GeoJson(_)));
    }

    #[test]
    fn loads_and_filters_woodland_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("woodland.geojson");
        let json = collection(vec![
            json!({
                "type": "Feature",
                "properties": {"OBJECTID": 1, "NAME": "", "STATUS": "ASNW"},
                "geometry": square(),
            }),
            json!({
                "type": "Feature",
                "properties": {"OBJECTID": 2, "NAME": "Pines", "STATUS": "PAWS"},
                "geometry": square(),
            }),
        ]);
        std::fs::write(&path, json).unwrap();

        let parcels = load_woodland(&path, &WoodlandFields::default()).unwrap();

        assert_eq!(parcels.len(), 1);
        assert_eq!(parcels[0].name, "Unknown");
    }

    #[test]
    fn missing_file_reports_its_path() {
        let err = load_reserves(Path::new("/nonexistent/reserves.json"), "OBJECTID", "NNR_NAME")
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/reserves.json"));
    }
}
