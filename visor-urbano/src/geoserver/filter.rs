//! Filtres CQL pour les requêtes WFS/WMS

use crate::error::ResolveError;
use crate::projection::ProjectedPoint;
use geo::{Geometry, Polygon};
use geozero::wkt::WktWriter;
use geozero::GeozeroGeometry;
use regex::Regex;
use std::sync::OnceLock;

static FEATURE_ID: OnceLock<Option<Regex>> = OnceLock::new();

/// Vrai si l'identifiant peut être inséré tel quel dans un filtre CQL
pub fn is_safe_feature_id(id: &str) -> bool {
    FEATURE_ID
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(id))
}

/// `IN ('<id>')`
pub fn feature_id_filter(id: &str) -> Result<String, ResolveError> {
    if !is_safe_feature_id(id) {
        return Err(ResolveError::UnsafeFeatureId(id.to_string()));
    }
    Ok(format!("IN ('{}')", id))
}

/// `CONTAINS(<geom>, POINT(<x> <y>))` en unités projetées
pub fn point_filter(geometry_column: &str, point: &ProjectedPoint) -> String {
    format!("CONTAINS({}, POINT({} {}))", geometry_column, point.x, point.y)
}

/// `INTERSECTS(<geom>, <WKT>)`, polygone en projection locale
pub fn intersects_filter(geometry_column: &str, polygon: &Polygon) -> Result<String, ResolveError> {
    Ok(format!("INTERSECTS({}, {})", geometry_column, polygon_wkt(polygon)?))
}

/// Encode un polygone en WKT
pub fn polygon_wkt(polygon: &Polygon) -> Result<String, ResolveError> {
    let geometry = Geometry::Polygon(polygon.clone());
    let mut wkt = Vec::new();
    {
        let mut writer = WktWriter::new(&mut wkt);
        geometry
            .process_geom(&mut writer)
            .map_err(|e| ResolveError::Wkt(e.to_string()))?;
    }
    String::from_utf8(wkt).map_err(|e| ResolveError::Wkt(e.to_string()))
}
