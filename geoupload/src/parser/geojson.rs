//! Extraction du polygone depuis un fichier GeoJSON

use geojson::{Feature, GeoJson, Value};
use tracing::debug;

use crate::types::{ExtractedPolygon, Ring};
use crate::UploadError;

const FORMAT: &str = "GeoJSON";

/// Parse un document GeoJSON et retourne l'anneau extérieur du premier polygone
///
/// Accepte une `FeatureCollection` (première feature de type Polygon) ou une
/// `Feature` isolée. Les trous sont ignorés.
pub fn parse(text: &str) -> Result<ExtractedPolygon, UploadError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| UploadError::invalid_format(FORMAT, e.to_string()))?;

    let geojson =
        GeoJson::from_json_value(value).map_err(|e| UploadError::invalid_format(FORMAT, e.to_string()))?;

    match geojson {
        GeoJson::FeatureCollection(collection) => {
            let feature_count = collection.features.len();
            let polygon = collection
                .features
                .iter()
                .find_map(polygon_of)
                .ok_or(UploadError::NoPolygonFeature { format: FORMAT })?;

            debug!(features = feature_count, "Polygon found in FeatureCollection");

            Ok(ExtractedPolygon {
                ring: outer_ring(polygon)?,
                feature_count,
            })
        }
        GeoJson::Feature(feature) => {
            let polygon = match feature.geometry.as_ref().map(|g| &g.value) {
                Some(Value::Polygon(rings)) => rings,
                Some(other) => {
                    return Err(UploadError::UnsupportedGeometryType(
                        geometry_type_name(other).to_string(),
                    ))
                }
                None => return Err(UploadError::UnsupportedGeometryType("null".to_string())),
            };

            Ok(ExtractedPolygon {
                ring: outer_ring(polygon)?,
                feature_count: 1,
            })
        }
        GeoJson::Geometry(_) => Err(UploadError::invalid_format(
            FORMAT,
            "Expected a Feature or a FeatureCollection",
        )),
    }
}

/// Retourne les anneaux si la feature est un Polygon
fn polygon_of(feature: &Feature) -> Option<&Vec<Vec<Vec<f64>>>> {
    match feature.geometry.as_ref().map(|g| &g.value) {
        Some(Value::Polygon(rings)) => Some(rings),
        _ => None,
    }
}

/// Convertit `coordinates[0]` en anneau `[lon, lat]`
fn outer_ring(rings: &[Vec<Vec<f64>>]) -> Result<Ring, UploadError> {
    let outer = rings
        .first()
        .filter(|ring| !ring.is_empty())
        .ok_or_else(|| UploadError::invalid_coordinates("The polygon outer ring is empty"))?;

    let ring = outer
        .iter()
        .enumerate()
        .map(|(i, position)| match position.as_slice() {
            [lon, lat, ..] => Ok([*lon, *lat]),
            _ => Err(UploadError::invalid_coordinates(format!(
                "Position {} has fewer than 2 values",
                i
            ))),
        })
        .collect::<Result<Ring, _>>()?;

    if ring.len() < 3 {
        return Err(UploadError::InsufficientCoordinates { found: ring.len() });
    }

    Ok(ring)
}

fn geometry_type_name(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = r#"[[[-103.35,20.66],[-103.34,20.66],[-103.34,20.67],[-103.35,20.67],[-103.35,20.66]]]"#;

    #[test]
    fn test_feature_collection_skips_linestring() {
        let text = format!(
            r#"{{"type":"FeatureCollection","features":[
                {{"type":"Feature","properties":{{}},"geometry":{{"type":"LineString","coordinates":[[0,0],[1,1]]}}}},
                {{"type":"Feature","properties":{{}},"geometry":{{"type":"Polygon","coordinates":{}}}}}
            ]}}"#,
            SQUARE
        );

        let result = parse(&text).unwrap();
        assert_eq!(result.feature_count, 2);
        assert_eq!(result.ring.len(), 5);
        assert_eq!(result.ring[0], [-103.35, 20.66]);
        assert_eq!(result.ring[2], [-103.34, 20.67]);
    }

    #[test]
    fn test_first_polygon_wins() {
        let text = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":null,"geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}},
            {"type":"Feature","properties":null,"geometry":{"type":"Polygon","coordinates":[[[5,5],[6,5],[6,6],[5,5]]]}}
        ]}"#;

        let result = parse(text).unwrap();
        assert_eq!(result.ring[0], [0.0, 0.0]);
    }

    #[test]
    fn test_holes_and_altitude_dropped() {
        let text = r#"{"type":"Feature","properties":{},"geometry":{"type":"Polygon","coordinates":[
            [[0,0,10],[4,0,10],[4,4,10],[0,4,10],[0,0,10]],
            [[1,1],[2,1],[2,2],[1,1]]
        ]}}"#;

        let result = parse(text).unwrap();
        assert_eq!(result.feature_count, 1);
        assert_eq!(result.ring.len(), 5);
        assert_eq!(result.ring[1], [4.0, 0.0]);
    }

    #[test]
    fn test_no_polygon_feature() {
        let text = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{},"geometry":{"type":"Point","coordinates":[0,0]}}
        ]}"#;
        assert_eq!(
            parse(text).unwrap_err(),
            UploadError::NoPolygonFeature { format: "GeoJSON" }
        );
    }

    #[test]
    fn test_single_feature_wrong_type() {
        let text = r#"{"type":"Feature","properties":{},"geometry":{"type":"MultiPolygon","coordinates":[]}}"#;
        assert_eq!(
            parse(text).unwrap_err(),
            UploadError::UnsupportedGeometryType("MultiPolygon".into())
        );
    }

    #[test]
    fn test_invalid_json() {
        let err = parse("{not json").unwrap_err();
        assert!(matches!(err, UploadError::InvalidFormat { format: "GeoJSON", .. }));
    }

    #[test]
    fn test_empty_ring() {
        let text = r#"{"type":"Feature","properties":{},"geometry":{"type":"Polygon","coordinates":[]}}"#;
        assert!(matches!(
            parse(text).unwrap_err(),
            UploadError::InvalidCoordinates(_)
        ));

        let text = r#"{"type":"Feature","properties":{},"geometry":{"type":"Polygon","coordinates":[[]]}}"#;
        assert!(matches!(
            parse(text).unwrap_err(),
            UploadError::InvalidCoordinates(_)
        ));
    }

    #[test]
    fn test_bare_geometry_rejected() {
        let text = format!(r#"{{"type":"Polygon","coordinates":{}}}"#, SQUARE);
        assert!(matches!(
            parse(&text).unwrap_err(),
            UploadError::InvalidFormat { .. }
        ));
    }
}
