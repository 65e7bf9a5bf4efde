//! Projection UTM (Universal Transverse Mercator) sur WGS84
//!
//! Mercator transverse par la série de Krüger en `n` (ordre 6).
//!
//! Zones EPSG:32601–32660 (nord) et EPSG:32701–32760 (sud).
//! Guadalajara et sa zone métropolitaine sont en zone 13N (EPSG:32613).

use super::ellipsoid::Ellipsoid;
use super::GeographicPoint;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// Facteur d'échelle sur le méridien central
const K0: f64 = 0.9996;
/// False easting
const X0: f64 = 500000.0;
/// False northing hémisphère sud
const Y0_SOUTH: f64 = 10000000.0;

/// Zone UTM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtmZone {
    pub zone: u8,
    pub south: bool,
}

impl UtmZone {
    /// Déduit la zone depuis un code EPSG WGS84/UTM
    pub fn from_epsg(epsg: u32) -> Option<Self> {
        match epsg {
            32601..=32660 => Some(Self {
                zone: (epsg - 32600) as u8,
                south: false,
            }),
            32701..=32760 => Some(Self {
                zone: (epsg - 32700) as u8,
                south: true,
            }),
            _ => None,
        }
    }

    /// Longitude du méridien central (radians)
    fn central_meridian(&self) -> f64 {
        ((self.zone as f64 - 1.0) * 6.0 - 180.0 + 3.0).to_radians()
    }

    fn false_northing(&self) -> f64 {
        if self.south {
            Y0_SOUTH
        } else {
            0.0
        }
    }
}

/// Écart maximal au méridien central accepté (degrés)
///
/// Au-delà, la série de Krüger n'est plus garantie au millimètre.
pub const MAX_MERIDIAN_OFFSET: f64 = 30.0;

/// Coefficients α (direct) et β (inverse) de la série de Krüger à l'ordre 6
fn krueger_coefficients(n: f64) -> ([f64; 6], [f64; 6]) {
    let n2 = n * n;
    let n3 = n2 * n;
    let n4 = n3 * n;
    let n5 = n4 * n;
    let n6 = n5 * n;

    let alpha = [
        n / 2.0 - 2.0 * n2 / 3.0 + 5.0 * n3 / 16.0 + 41.0 * n4 / 180.0 - 127.0 * n5 / 288.0
            + 7891.0 * n6 / 37800.0,
        13.0 * n2 / 48.0 - 3.0 * n3 / 5.0 + 557.0 * n4 / 1440.0 + 281.0 * n5 / 630.0
            - 1983433.0 * n6 / 1935360.0,
        61.0 * n3 / 240.0 - 103.0 * n4 / 140.0 + 15061.0 * n5 / 26880.0 + 167603.0 * n6 / 181440.0,
        49561.0 * n4 / 161280.0 - 179.0 * n5 / 168.0 + 6601661.0 * n6 / 7257600.0,
        34729.0 * n5 / 80640.0 - 3418889.0 * n6 / 1995840.0,
        212378941.0 * n6 / 319334400.0,
    ];

    let beta = [
        n / 2.0 - 2.0 * n2 / 3.0 + 37.0 * n3 / 96.0 - n4 / 360.0 - 81.0 * n5 / 512.0
            + 96199.0 * n6 / 604800.0,
        n2 / 48.0 + n3 / 15.0 - 437.0 * n4 / 1440.0 + 46.0 * n5 / 105.0 - 1118711.0 * n6 / 3870720.0,
        17.0 * n3 / 480.0 - 37.0 * n4 / 840.0 - 209.0 * n5 / 4480.0 + 5569.0 * n6 / 90720.0,
        4397.0 * n4 / 161280.0 - 11.0 * n5 / 504.0 - 830251.0 * n6 / 7257600.0,
        4583.0 * n5 / 161280.0 - 108847.0 * n6 / 3991680.0,
        20648693.0 * n6 / 638668800.0,
    ];

    (alpha, beta)
}

/// Convertit des coordonnées géographiques WGS84 vers UTM
///
/// `None` si le point est à plus de [`MAX_MERIDIAN_OFFSET`] du méridien
/// central de la zone.
pub fn geographic_to_utm(point: GeographicPoint, zone: UtmZone) -> Option<(f64, f64)> {
    let ell = Ellipsoid::WGS84;
    let e = ell.e();
    let (alpha, _) = krueger_coefficients(ell.n());
    let k0a = K0 * ell.rectifying_radius();

    let lam = normalize_longitude(point.lon.to_radians() - zone.central_meridian());
    if lam.abs() > MAX_MERIDIAN_OFFSET.to_radians() {
        return None;
    }

    // Latitude conforme
    let sin_phi = point.lat.to_radians().sin();
    let tau = (sin_phi.atanh() - e * (e * sin_phi).atanh()).sinh();

    let xi_p = tau.atan2(lam.cos());
    let eta_p = (lam.sin() / (1.0 + tau * tau).sqrt()).atanh();

    let mut xi = xi_p;
    let mut eta = eta_p;
    for (j, a) in alpha.iter().enumerate() {
        let k = 2.0 * (j + 1) as f64;
        xi += a * (k * xi_p).sin() * (k * eta_p).cosh();
        eta += a * (k * xi_p).cos() * (k * eta_p).sinh();
    }

    Some((X0 + k0a * eta, zone.false_northing() + k0a * xi))
}

/// Convertit UTM vers coordonnées géographiques WGS84
pub fn utm_to_geographic(x: f64, y: f64, zone: UtmZone) -> GeographicPoint {
    let ell = Ellipsoid::WGS84;
    let e = ell.e();
    let (_, beta) = krueger_coefficients(ell.n());
    let k0a = K0 * ell.rectifying_radius();

    let xi = (y - zone.false_northing()) / k0a;
    let eta = (x - X0) / k0a;

    let mut xi_p = xi;
    let mut eta_p = eta;
    for (j, b) in beta.iter().enumerate() {
        let k = 2.0 * (j + 1) as f64;
        xi_p -= b * (k * xi).sin() * (k * eta).cosh();
        eta_p -= b * (k * xi).cos() * (k * eta).sinh();
    }

    let chi = (xi_p.sin() / eta_p.cosh()).asin();
    let lam = eta_p.sinh().atan2(xi_p.cos());

    GeographicPoint::new(
        normalize_longitude(zone.central_meridian() + lam).to_degrees(),
        conformal_to_geodetic(chi, e).to_degrees(),
    )
}

/// Latitude géodésique depuis la latitude conforme (itération de point fixe)
fn conformal_to_geodetic(chi: f64, e: f64) -> f64 {
    let base = (FRAC_PI_4 + chi / 2.0).tan();
    let mut phi = chi;
    for _ in 0..30 {
        let s = e * phi.sin();
        let next = 2.0 * (base * ((1.0 + s) / (1.0 - s)).powf(e / 2.0)).atan() - FRAC_PI_2;
        if (next - phi).abs() < 1e-15 {
            return next;
        }
        phi = next;
    }
    phi
}

/// Ramène une longitude (ou un écart) dans ]-π, π]
fn normalize_longitude(lam: f64) -> f64 {
    let wrapped = (lam + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped == -PI {
        PI
    } else {
        wrapped
    }
}
