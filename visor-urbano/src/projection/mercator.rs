//! Projection Web Mercator (EPSG:3857)
//!
//! Projection de la vue cartographique: les clics arrivent dans ce système.

use super::ellipsoid::Ellipsoid;
use super::GeographicPoint;

/// Latitude maximale représentable : `atan(sinh(π))`, l'emprise carrée
pub const MAX_LAT: f64 = 85.051_128_779_806_59;

/// Convertit coordonnées géographiques vers Web Mercator
///
/// `None` au-delà de [`MAX_LAT`].
pub fn geographic_to_web_mercator(point: GeographicPoint) -> Option<(f64, f64)> {
    if point.lat.abs() > MAX_LAT {
        return None;
    }

    // Modèle sphérique avec le rayon équatorial
    let r = Ellipsoid::WGS84.a;
    let lat = point.lat.to_radians();

    let x = r * point.lon.to_radians();
    let y = r * (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln();

    Some((x, y))
}

/// Convertit Web Mercator vers coordonnées géographiques
pub fn web_mercator_to_geographic(x: f64, y: f64) -> GeographicPoint {
    let r = Ellipsoid::WGS84.a;

    let lon = x / r;
    let lat = 2.0 * (y / r).exp().atan() - std::f64::consts::FRAC_PI_2;

    GeographicPoint::new(lon.to_degrees(), lat.to_degrees())
}
