//! Schéma strict des prédios renvoyés par la couche cadastrale

use crate::error::ResolveError;
use geo::Polygon;
use geojson::{feature::Id, GeoJson};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Attributs cadastraux d'un prédio
///
/// Tout attribut inconnu ou obligatoire manquant rejette la réponse entière.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParcelAttributes {
    /// Clave catastral
    #[serde(rename = "CLAVE")]
    pub cadastral_key: String,

    /// Nombre de propriétaires
    #[serde(rename = "NUM_PROP")]
    pub owner_count: u32,

    /// Superficie du terrain (m²)
    #[serde(rename = "SUP_TERR")]
    pub land_area: f64,

    /// Superficie construite (m²)
    #[serde(rename = "SUP_CONST")]
    pub built_area: f64,

    #[serde(rename = "ZONIFICACION")]
    pub zoning: String,

    #[serde(rename = "USO_SUELO")]
    pub land_use: String,

    #[serde(rename = "MUN_ID")]
    pub municipality_id: u32,

    #[serde(rename = "MUNICIPIO")]
    pub municipality: String,

    #[serde(rename = "CALLE", default)]
    pub street: Option<String>,

    #[serde(rename = "NUM_EXT", default, deserialize_with = "string_or_number")]
    pub exterior_number: Option<String>,

    #[serde(rename = "COLONIA", default)]
    pub neighborhood: Option<String>,

    #[serde(rename = "LOCALIDAD", default)]
    pub locality: Option<String>,

    #[serde(rename = "CP", default, deserialize_with = "string_or_number")]
    pub postal_code: Option<String>,
}

/// Certaines couches publient `NUM_EXT` et `CP` en numérique
fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected a string or a number, got {}",
            other
        ))),
    }
}

/// Prédio validé
#[derive(Debug, Clone)]
pub struct ParcelFeature {
    /// Identifiant WFS (`couche.n`)
    pub id: String,
    /// Géométrie en projection locale (premier polygone d'un MultiPolygon)
    pub geometry: Polygon,
    pub attributes: ParcelAttributes,
}

/// Valide une réponse WFS GetFeature et extrait les prédios
pub fn parse_parcels(response: &Value) -> Result<Vec<ParcelFeature>, ResolveError> {
    let geojson = GeoJson::from_json_value(response.clone())
        .map_err(|e| ResolveError::invalid_shape(e.to_string()))?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        GeoJson::Feature(_) => {
            return Err(ResolveError::invalid_shape("expected a FeatureCollection, got a Feature"))
        }
        GeoJson::Geometry(_) => {
            return Err(ResolveError::invalid_shape("expected a FeatureCollection, got a Geometry"))
        }
    };

    collection
        .features
        .into_iter()
        .enumerate()
        .map(|(index, feature)| {
            let id = match feature.id {
                Some(Id::String(s)) => s,
                Some(Id::Number(n)) => n.to_string(),
                None => {
                    return Err(ResolveError::invalid_shape(format!(
                        "feature #{} has no id",
                        index
                    )))
                }
            };

            let geometry = feature
                .geometry
                .ok_or_else(|| ResolveError::invalid_shape(format!("feature {} has no geometry", id)))?;
            let geometry = first_polygon(geometry.value)
                .map_err(|reason| ResolveError::invalid_shape(format!("feature {}: {}", id, reason)))?;

            let properties = Value::Object(feature.properties.unwrap_or_default());
            let attributes: ParcelAttributes = serde_json::from_value(properties)
                .map_err(|e| ResolveError::invalid_shape(format!("feature {}: {}", id, e)))?;

            Ok(ParcelFeature {
                id,
                geometry,
                attributes,
            })
        })
        .collect()
}

fn first_polygon(value: geojson::Value) -> Result<Polygon, String> {
    let kind = match &value {
        geojson::Value::Polygon(_) | geojson::Value::MultiPolygon(_) => None,
        geojson::Value::Point(_) => Some("Point"),
        geojson::Value::MultiPoint(_) => Some("MultiPoint"),
        geojson::Value::LineString(_) => Some("LineString"),
        geojson::Value::MultiLineString(_) => Some("MultiLineString"),
        geojson::Value::GeometryCollection(_) => Some("GeometryCollection"),
    };
    if let Some(kind) = kind {
        return Err(format!("unexpected geometry type {}", kind));
    }

    match geo::Geometry::<f64>::try_from(value).map_err(|e| e.to_string())? {
        geo::Geometry::MultiPolygon(mp) => mp
            .0
            .into_iter()
            .next()
            .ok_or_else(|| "empty MultiPolygon".to_string()),
        geo::Geometry::Polygon(p) => Ok(p),
        _ => Err("unexpected geometry conversion".to_string()),
    }
}
