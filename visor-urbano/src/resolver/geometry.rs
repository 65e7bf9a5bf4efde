//! Calculs géométriques : surface, emprise, simplification

use crate::error::ProjectionError;
use crate::projection::{GeographicPoint, Transformer};
use geo::{BoundingRect, ChamberlainDuquetteArea, Coord, LineString, Polygon, Rect, Simplify};
use serde::{Deserialize, Serialize};

/// Seuil de bascule m² → hectares
const HECTARE_THRESHOLD: f64 = 10_000.0;

/// Emprise WGS84
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn contains(&self, point: GeographicPoint) -> bool {
        (self.min_lon..=self.max_lon).contains(&point.lon)
            && (self.min_lat..=self.max_lat).contains(&point.lat)
    }
}

/// Polygone WGS84 depuis un anneau de points (fermé si besoin)
pub fn polygon_from_ring(ring: &[GeographicPoint]) -> Polygon {
    let coords: Vec<Coord> = ring.iter().map(|p| Coord::from(*p)).collect();
    Polygon::new(LineString::new(coords), vec![])
}

/// Contour extérieur en paires `[x, y]`
pub fn exterior_pairs(polygon: &Polygon) -> Vec<[f64; 2]> {
    polygon.exterior().coords().map(|c| [c.x, c.y]).collect()
}

/// Douglas-Peucker en unités projetées ; garde l'original s'il dégénère
pub fn simplify(polygon: &Polygon, tolerance: f64) -> Polygon {
    if tolerance <= 0.0 {
        return polygon.clone();
    }

    let simplified = polygon.simplify(&tolerance);
    if simplified.exterior().0.len() < 4 {
        return polygon.clone();
    }
    simplified
}

/// Surface en m² (Chamberlain-Duquette sur le polygone WGS84)
pub fn area_m2(wgs84: &Polygon) -> f64 {
    wgs84.chamberlain_duquette_unsigned_area()
}

/// Formate une surface : `1,234.56 m²` ou `12.35 ha`
pub fn format_area(m2: f64) -> String {
    if m2 >= HECTARE_THRESHOLD {
        format!("{} ha", group_thousands(m2 / HECTARE_THRESHOLD))
    } else {
        format!("{} m²", group_thousands(m2))
    }
}

/// Deux décimales, milliers séparés par des virgules
fn group_thousands(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut out = String::with_capacity(formatted.len() + int_part.len() / 3 + 1);
    if value < 0.0 {
        out.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.push('.');
    out.push_str(frac_part);
    out
}

/// Emprise du polygone élargie de `buffer` (unités projetées)
pub fn buffered_envelope(local: &Polygon, buffer: f64) -> Option<Rect> {
    let rect = local.bounding_rect()?;
    Some(Rect::new(
        Coord {
            x: rect.min().x - buffer,
            y: rect.min().y - buffer,
        },
        Coord {
            x: rect.max().x + buffer,
            y: rect.max().y + buffer,
        },
    ))
}

/// Reprojette les 4 coins d'une emprise et retourne leur enveloppe
pub fn envelope_to_wgs84(rect: &Rect, to_wgs84: &Transformer<'_>) -> Result<BoundingBox, ProjectionError> {
    let corners = [
        rect.min(),
        Coord {
            x: rect.max().x,
            y: rect.min().y,
        },
        rect.max(),
        Coord {
            x: rect.min().x,
            y: rect.max().y,
        },
    ];

    let mut bbox = BoundingBox {
        min_lon: f64::INFINITY,
        min_lat: f64::INFINITY,
        max_lon: f64::NEG_INFINITY,
        max_lat: f64::NEG_INFINITY,
    };
    for corner in corners {
        let c = to_wgs84.transform_coord(corner)?;
        bbox.min_lon = bbox.min_lon.min(c.x);
        bbox.min_lat = bbox.min_lat.min(c.y);
        bbox.max_lon = bbox.max_lon.max(c.x);
        bbox.max_lat = bbox.max_lat.max(c.y);
    }
    Ok(bbox)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::ProjectionRegistry;
    use geo::polygon;

    #[test]
    fn test_format_area() {
        assert_eq!(format_area(0.0), "0.00 m²");
        assert_eq!(format_area(999.5), "999.50 m²");
        assert_eq!(format_area(1234.564), "1,234.56 m²");
        assert_eq!(format_area(9_999.99), "9,999.99 m²");
        assert_eq!(format_area(12_345.0), "1.23 ha");
        assert_eq!(format_area(123_456_789.0), "12,345.68 ha");
    }

    #[test]
    fn test_area_of_utm_square() {
        let registry = ProjectionRegistry::with_defaults(32613, 3857).unwrap();
        let to_wgs84 = registry.transformer(32613, 4326).unwrap();

        // Carré de 100 m de côté en UTM 13N
        let square = polygon![
            (x: 672_000.0, y: 2_287_000.0),
            (x: 672_100.0, y: 2_287_000.0),
            (x: 672_100.0, y: 2_287_100.0),
            (x: 672_000.0, y: 2_287_100.0),
            (x: 672_000.0, y: 2_287_000.0),
        ];
        let wgs = to_wgs84.transform_polygon(&square).unwrap();
        let area = area_m2(&wgs);
        // Modèle sphérique : écart de l'ordre de 0.5 %
        assert!((area - 10_000.0).abs() < 150.0, "area={}", area);
    }

    #[test]
    fn test_buffered_envelope() {
        let poly = polygon![
            (x: 10.0, y: 20.0),
            (x: 30.0, y: 20.0),
            (x: 30.0, y: 40.0),
            (x: 10.0, y: 20.0),
        ];
        let rect = buffered_envelope(&poly, 50.0).unwrap();
        assert_eq!(rect.min(), Coord { x: -40.0, y: -30.0 });
        assert_eq!(rect.max(), Coord { x: 80.0, y: 90.0 });
    }

    #[test]
    fn test_envelope_to_wgs84_contains_polygon() {
        let registry = ProjectionRegistry::with_defaults(32613, 3857).unwrap();
        let to_wgs84 = registry.transformer(32613, 4326).unwrap();

        let rect = Rect::new((672_000.0, 2_287_000.0), (672_100.0, 2_287_100.0));
        let bbox = envelope_to_wgs84(&rect, &to_wgs84).unwrap();
        let center = registry
            .to_geographic_from(672_050.0, 2_287_050.0, 32613)
            .unwrap();
        assert!(bbox.contains(center));
        assert!(bbox.max_lon - bbox.min_lon < 0.01);
    }

    #[test]
    fn test_simplify_keeps_degenerate() {
        let tiny = polygon![
            (x: 0.0, y: 0.0),
            (x: 0.1, y: 0.0),
            (x: 0.1, y: 0.1),
            (x: 0.0, y: 0.0),
        ];
        assert_eq!(simplify(&tiny, 10.0), tiny);
        assert_eq!(simplify(&tiny, 0.0), tiny);
    }

    #[test]
    fn test_simplify_removes_collinear() {
        let poly = polygon![
            (x: 0.0, y: 0.0),
            (x: 50.0, y: 0.01),
            (x: 100.0, y: 0.0),
            (x: 100.0, y: 100.0),
            (x: 0.0, y: 100.0),
            (x: 0.0, y: 0.0),
        ];
        let simplified = simplify(&poly, 0.5);
        assert_eq!(simplified.exterior().0.len(), 5);
    }
}
