//! Projection Lambert conique conforme du Mexique (EPSG:6372)
//!
//! Mexico ITRF2008 / LCC, grille nationale de l'INEGI.
//! Lambert Conformal Conic avec 2 parallèles standards sur GRS80.

use super::ellipsoid::Ellipsoid;
use super::GeographicPoint;

/// Paramètres LCC 2SP
struct LccParams {
    /// Longitude origine
    lon0: f64,
    /// Latitude origine
    lat0: f64,
    /// Premier parallèle standard
    lat1: f64,
    /// Deuxième parallèle standard
    lat2: f64,
    /// False easting
    x0: f64,
    /// False northing
    y0: f64,
}

impl LccParams {
    fn mexico_itrf2008() -> Self {
        Self {
            lon0: (-102.0_f64).to_radians(),
            lat0: 12.0_f64.to_radians(),
            lat1: 17.5_f64.to_radians(),
            lat2: 29.5_f64.to_radians(),
            x0: 2500000.0,
            y0: 0.0,
        }
    }
}

/// Constantes dérivées de la projection
struct Cone {
    /// Exposant de la projection
    n: f64,
    /// a·F
    af: f64,
    /// Rayon à l'origine
    r0: f64,
}

fn m(lat: f64, e2: f64) -> f64 {
    lat.cos() / (1.0 - e2 * lat.sin().powi(2)).sqrt()
}

/// Fonction t de Snyder (inverse de l'exponentielle de la latitude isométrique)
fn t(lat: f64, e: f64) -> f64 {
    let sin_lat = lat.sin();
    (std::f64::consts::FRAC_PI_4 - lat / 2.0).tan()
        / ((1.0 - e * sin_lat) / (1.0 + e * sin_lat)).powf(e / 2.0)
}

fn cone(params: &LccParams, ell: Ellipsoid) -> Cone {
    let e = ell.e();
    let e2 = ell.e2();

    let m1 = m(params.lat1, e2);
    let m2 = m(params.lat2, e2);
    let t1 = t(params.lat1, e);
    let t2 = t(params.lat2, e);

    let n = (m1.ln() - m2.ln()) / (t1.ln() - t2.ln());
    let af = ell.a * m1 / (n * t1.powf(n));
    let r0 = af * t(params.lat0, e).powf(n);

    Cone { n, af, r0 }
}

/// Convertit coordonnées géographiques vers EPSG:6372
pub fn geographic_to_mexico_lcc(point: GeographicPoint) -> (f64, f64) {
    let params = LccParams::mexico_itrf2008();
    let ell = Ellipsoid::GRS80;
    let c = cone(&params, ell);

    let r = c.af * t(point.lat.to_radians(), ell.e()).powf(c.n);
    let theta = c.n * (point.lon.to_radians() - params.lon0);

    let x = params.x0 + r * theta.sin();
    let y = params.y0 + c.r0 - r * theta.cos();

    (x, y)
}

/// Convertit EPSG:6372 vers coordonnées géographiques
pub fn mexico_lcc_to_geographic(x: f64, y: f64) -> GeographicPoint {
    let params = LccParams::mexico_itrf2008();
    let ell = Ellipsoid::GRS80;
    let e = ell.e();
    let c = cone(&params, ell);

    // Coordonnées centrées
    let dx = x - params.x0;
    let dy = c.r0 - (y - params.y0);

    let r = dx.hypot(dy).copysign(c.n);
    let theta = dx.atan2(dy);

    let tt = (r / c.af).powf(1.0 / c.n);

    // Latitude par itération
    let mut lat = std::f64::consts::FRAC_PI_2 - 2.0 * tt.atan();
    for _ in 0..15 {
        let sin_lat = lat.sin();
        let next = std::f64::consts::FRAC_PI_2
            - 2.0 * (tt * ((1.0 - e * sin_lat) / (1.0 + e * sin_lat)).powf(e / 2.0)).atan();

        if (next - lat).abs() < 1e-12 {
            lat = next;
            break;
        }
        lat = next;
    }

    let lon = theta / c.n + params.lon0;

    GeographicPoint::new(lon.to_degrees(), lat.to_degrees())
}
