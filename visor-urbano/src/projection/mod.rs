//! Transformation de coordonnées en Rust pur
//!
//! Projections intégrées :
//! - WGS84 géographique (EPSG:4326), toujours enregistrée
//! - Web Mercator (EPSG:3857), projection de la carte
//! - Mexico ITRF2008 / LCC (EPSG:6372), grille nationale INEGI
//! - UTM WGS84 nord (EPSG:32601–32660) et sud (EPSG:32701–32760)
//!
//! Avec la feature `reproject`, tout autre code EPSG est délégué à PROJ.
//!
//! Les points sont typés : [`GeographicPoint`] (degrés) et [`ProjectedPoint`]
//! (unités projetées + EPSG). Passer de l'un à l'autre exige le registre.

mod ellipsoid;
mod lambert;
mod mercator;
#[cfg(feature = "reproject")]
mod proj_backend;
mod transformer;
mod utm;

pub use transformer::Transformer;
pub use utm::UtmZone;

use crate::error::ProjectionError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// WGS84 géographique
pub const WGS84_EPSG: u32 = 4326;
/// Web Mercator
pub const WEB_MERCATOR_EPSG: u32 = 3857;
/// Mexico ITRF2008 / LCC
pub const MEXICO_LCC_EPSG: u32 = 6372;

/// Point WGS84 en degrés
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeographicPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeographicPoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Vrai si le point est fini et dans les bornes WGS84
    pub fn is_valid(&self) -> bool {
        self.lon.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lon)
            && (-90.0..=90.0).contains(&self.lat)
    }

    /// Paire `[lon, lat]` pour les anneaux sérialisés
    pub fn to_pair(self) -> [f64; 2] {
        [self.lon, self.lat]
    }

    pub fn from_pair(pair: [f64; 2]) -> Self {
        Self::new(pair[0], pair[1])
    }

    /// Parse la valeur du paramètre `point` : `"lon lat"`
    pub fn parse_query_value(value: &str) -> Option<Self> {
        let mut parts = value.split_whitespace();
        let lon = parts.next()?.parse::<f64>().ok()?;
        let lat = parts.next()?.parse::<f64>().ok()?;
        if parts.next().is_some() {
            return None;
        }
        let point = Self::new(lon, lat);
        point.is_valid().then_some(point)
    }

    /// Valeur du paramètre `point` : `"lon lat"`
    pub fn to_query_value(self) -> String {
        format!("{} {}", self.lon, self.lat)
    }
}

impl fmt::Display for GeographicPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.lon, self.lat)
    }
}

impl From<GeographicPoint> for geo::Coord {
    fn from(p: GeographicPoint) -> Self {
        geo::Coord { x: p.lon, y: p.lat }
    }
}

/// Point dans un système projeté identifié par son EPSG
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    pub x: f64,
    pub y: f64,
    pub epsg: u32,
}

impl ProjectedPoint {
    pub fn new(x: f64, y: f64, epsg: u32) -> Self {
        Self { x, y, epsg }
    }

    pub fn coord(&self) -> geo::Coord {
        geo::Coord {
            x: self.x,
            y: self.y,
        }
    }
}

/// Définition d'une projection enregistrée
enum ProjectionDef {
    Geographic,
    WebMercator,
    MexicoLcc,
    Utm(UtmZone),
    #[cfg(feature = "reproject")]
    External(proj_backend::ProjProjection),
}

impl fmt::Debug for ProjectionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Geographic => write!(f, "Geographic"),
            Self::WebMercator => write!(f, "WebMercator"),
            Self::MexicoLcc => write!(f, "MexicoLcc"),
            Self::Utm(zone) => write!(f, "Utm({:?})", zone),
            #[cfg(feature = "reproject")]
            Self::External(p) => write!(f, "External(EPSG:{})", p.epsg()),
        }
    }
}

impl ProjectionDef {
    /// Définition intégrée pour un code EPSG
    fn builtin(epsg: u32) -> Option<Self> {
        match epsg {
            WGS84_EPSG => Some(Self::Geographic),
            WEB_MERCATOR_EPSG => Some(Self::WebMercator),
            MEXICO_LCC_EPSG => Some(Self::MexicoLcc),
            _ => UtmZone::from_epsg(epsg).map(Self::Utm),
        }
    }

    /// `InvalidCoordinate` hors du domaine de la projection
    fn forward(&self, point: GeographicPoint, epsg: u32) -> Result<(f64, f64), ProjectionError> {
        let xy = match self {
            Self::Geographic => Some((point.lon, point.lat)),
            Self::WebMercator => mercator::geographic_to_web_mercator(point),
            Self::MexicoLcc => Some(lambert::geographic_to_mexico_lcc(point)),
            Self::Utm(zone) => utm::geographic_to_utm(point, *zone),
            #[cfg(feature = "reproject")]
            Self::External(p) => Some(p.forward(point)?),
        };
        xy.ok_or(ProjectionError::InvalidCoordinate {
            x: point.lon,
            y: point.lat,
            epsg,
        })
    }

    fn inverse(&self, x: f64, y: f64) -> Result<GeographicPoint, ProjectionError> {
        let point = match self {
            Self::Geographic => GeographicPoint::new(x, y),
            Self::WebMercator => mercator::web_mercator_to_geographic(x, y),
            Self::MexicoLcc => lambert::mexico_lcc_to_geographic(x, y),
            Self::Utm(zone) => utm::utm_to_geographic(x, y, *zone),
            #[cfg(feature = "reproject")]
            Self::External(p) => p.inverse(x, y)?,
        };
        Ok(point)
    }
}

/// Registre des projections utilisables
///
/// EPSG:4326 est toujours présent. Les autres codes doivent être
/// enregistrés avant usage via [`ProjectionRegistry::register`].
#[derive(Debug)]
pub struct ProjectionRegistry {
    defs: HashMap<u32, ProjectionDef>,
}

impl Default for ProjectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectionRegistry {
    /// Registre ne contenant que WGS84
    pub fn new() -> Self {
        let mut defs = HashMap::new();
        defs.insert(WGS84_EPSG, ProjectionDef::Geographic);
        Self { defs }
    }

    /// Registre avec la projection locale et la projection de la carte
    pub fn with_defaults(local_epsg: u32, map_epsg: u32) -> Result<Self, ProjectionError> {
        let mut registry = Self::new();
        registry.register(local_epsg)?;
        registry.register(map_epsg)?;
        Ok(registry)
    }

    /// Enregistre un code EPSG (idempotent)
    pub fn register(&mut self, epsg: u32) -> Result<(), ProjectionError> {
        if self.defs.contains_key(&epsg) {
            return Ok(());
        }

        let def = match ProjectionDef::builtin(epsg) {
            Some(def) => def,
            #[cfg(feature = "reproject")]
            None => ProjectionDef::External(proj_backend::ProjProjection::new(epsg)?),
            #[cfg(not(feature = "reproject"))]
            None => return Err(ProjectionError::Unsupported(epsg)),
        };

        tracing::debug!(epsg, definition = ?def, "Projection enregistrée");
        self.defs.insert(epsg, def);
        Ok(())
    }

    pub fn is_registered(&self, epsg: u32) -> bool {
        self.defs.contains_key(&epsg)
    }

    /// Codes enregistrés, triés
    pub fn registered(&self) -> Vec<u32> {
        let mut codes: Vec<u32> = self.defs.keys().copied().collect();
        codes.sort_unstable();
        codes
    }

    fn def(&self, epsg: u32) -> Result<&ProjectionDef, ProjectionError> {
        self.defs
            .get(&epsg)
            .ok_or(ProjectionError::Unregistered(epsg))
    }

    /// WGS84 → système cible
    pub fn to_projected(
        &self,
        point: GeographicPoint,
        target_epsg: u32,
    ) -> Result<ProjectedPoint, ProjectionError> {
        if !point.is_valid() {
            return Err(ProjectionError::InvalidCoordinate {
                x: point.lon,
                y: point.lat,
                epsg: WGS84_EPSG,
            });
        }

        let (x, y) = self.def(target_epsg)?.forward(point, target_epsg)?;
        if !x.is_finite() || !y.is_finite() {
            return Err(ProjectionError::InvalidCoordinate {
                x: point.lon,
                y: point.lat,
                epsg: WGS84_EPSG,
            });
        }

        Ok(ProjectedPoint::new(x, y, target_epsg))
    }

    /// Système source (porté par le point) → WGS84
    pub fn to_geographic(&self, point: ProjectedPoint) -> Result<GeographicPoint, ProjectionError> {
        let invalid = ProjectionError::InvalidCoordinate {
            x: point.x,
            y: point.y,
            epsg: point.epsg,
        };

        if !point.x.is_finite() || !point.y.is_finite() {
            return Err(invalid);
        }

        let geo = self.def(point.epsg)?.inverse(point.x, point.y)?;
        if !geo.is_valid() {
            return Err(invalid);
        }

        Ok(geo)
    }

    pub fn to_geographic_from(
        &self,
        x: f64,
        y: f64,
        source_epsg: u32,
    ) -> Result<GeographicPoint, ProjectionError> {
        self.to_geographic(ProjectedPoint::new(x, y, source_epsg))
    }

    /// Transformateur de géométries entre deux codes enregistrés
    pub fn transformer(&self, source_epsg: u32, target_epsg: u32) -> Result<Transformer<'_>, ProjectionError> {
        self.def(source_epsg)?;
        self.def(target_epsg)?;
        Ok(Transformer::new(self, source_epsg, target_epsg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUADALAJARA: GeographicPoint = GeographicPoint {
        lon: -103.35,
        lat: 20.66,
    };

    fn registry() -> ProjectionRegistry {
        let mut r = ProjectionRegistry::with_defaults(32613, WEB_MERCATOR_EPSG).unwrap();
        r.register(MEXICO_LCC_EPSG).unwrap();
        r
    }

    #[test]
    fn test_wgs84_always_registered() {
        let r = ProjectionRegistry::new();
        assert!(r.is_registered(WGS84_EPSG));
        assert_eq!(r.registered(), vec![4326]);
    }

    #[test]
    fn test_roundtrip_all_builtin() {
        let r = registry();
        for epsg in [32613, WEB_MERCATOR_EPSG, MEXICO_LCC_EPSG, WGS84_EPSG] {
            let projected = r.to_projected(GUADALAJARA, epsg).unwrap();
            assert_eq!(projected.epsg, epsg);

            let back = r.to_geographic(projected).unwrap();
            assert!((back.lon - GUADALAJARA.lon).abs() < 1e-6, "EPSG:{} lon={}", epsg, back.lon);
            assert!((back.lat - GUADALAJARA.lat).abs() < 1e-6, "EPSG:{} lat={}", epsg, back.lat);
        }
    }

    #[test]
    fn test_unregistered_code() {
        let r = ProjectionRegistry::new();
        let err = r.to_projected(GUADALAJARA, 32613).unwrap_err();
        assert_eq!(err, ProjectionError::Unregistered(32613));

        let err = r.to_geographic_from(672_200.0, 2_287_245.0, 32613).unwrap_err();
        assert_eq!(err, ProjectionError::Unregistered(32613));
    }

    #[cfg(not(feature = "reproject"))]
    #[test]
    fn test_unsupported_without_proj() {
        let mut r = ProjectionRegistry::new();
        assert_eq!(r.register(2154), Err(ProjectionError::Unsupported(2154)));
        assert_eq!(r.register(32600), Err(ProjectionError::Unsupported(32600)));
    }

    #[test]
    fn test_invalid_coordinates() {
        let r = registry();
        assert!(matches!(
            r.to_projected(GeographicPoint::new(-103.0, 95.0), 32613),
            Err(ProjectionError::InvalidCoordinate { .. })
        ));
        assert!(matches!(
            r.to_geographic_from(f64::NAN, 0.0, WEB_MERCATOR_EPSG),
            Err(ProjectionError::InvalidCoordinate { .. })
        ));
    }

    #[test]
    fn test_out_of_domain_rejected() {
        let r = registry();

        // Au-delà de l'emprise Web Mercator
        assert_eq!(
            r.to_projected(GeographicPoint::new(10.0, 89.0), WEB_MERCATOR_EPSG),
            Err(ProjectionError::InvalidCoordinate {
                x: 10.0,
                y: 89.0,
                epsg: WEB_MERCATOR_EPSG
            })
        );

        // Trop loin du méridien central de la zone 13N (-105°)
        assert!(matches!(
            r.to_projected(GeographicPoint::new(-60.0, 20.66), 32613),
            Err(ProjectionError::InvalidCoordinate { epsg: 32613, .. })
        ));
    }

    #[test]
    fn test_roundtrip_outside_utm_zone() {
        let r = registry();
        for lon in [-108.0, -102.0, -93.0] {
            let original = GeographicPoint::new(lon, 20.66);
            let back = r.to_geographic(r.to_projected(original, 32613).unwrap()).unwrap();
            assert!((back.lon - lon).abs() < 1e-9, "lon={}", back.lon);
            assert!((back.lat - 20.66).abs() < 1e-9, "lat={}", back.lat);
        }
    }

    #[test]
    fn test_register_idempotent() {
        let mut r = registry();
        r.register(32613).unwrap();
        assert_eq!(r.registered(), vec![3857, 4326, 6372, 32613]);
    }

    #[test]
    fn test_query_value() {
        let p = GeographicPoint::parse_query_value("-103.35 20.66").unwrap();
        assert_eq!(p, GUADALAJARA);
        assert_eq!(p.to_query_value(), "-103.35 20.66");

        assert!(GeographicPoint::parse_query_value("-103.35").is_none());
        assert!(GeographicPoint::parse_query_value("abc 20").is_none());
        assert!(GeographicPoint::parse_query_value("1 2 3").is_none());
        assert!(GeographicPoint::parse_query_value("200 20").is_none());
    }
}
