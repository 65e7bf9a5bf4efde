//! Projections externes via PROJ
//!
//! Disponible uniquement avec la feature `reproject`.

use super::GeographicPoint;
use crate::error::ProjectionError;
use proj::Proj;
use std::sync::Mutex;

/// Couple de transformations WGS84 ↔ EPSG:n
pub struct ProjProjection {
    epsg: u32,
    forward: Mutex<Proj>,
    inverse: Mutex<Proj>,
}

fn backend(e: impl std::fmt::Display) -> ProjectionError {
    ProjectionError::Backend(e.to_string())
}

impl ProjProjection {
    pub fn new(epsg: u32) -> Result<Self, ProjectionError> {
        let target = format!("EPSG:{}", epsg);

        // new_known_crs normalise l'ordre des axes (lon, lat)
        let forward = Proj::new_known_crs("EPSG:4326", &target, None).map_err(|e| {
            tracing::warn!(epsg, error = %e, "PROJ ne connaît pas ce code");
            ProjectionError::Unsupported(epsg)
        })?;
        let inverse =
            Proj::new_known_crs(&target, "EPSG:4326", None).map_err(|_| ProjectionError::Unsupported(epsg))?;

        Ok(Self {
            epsg,
            forward: Mutex::new(forward),
            inverse: Mutex::new(inverse),
        })
    }

    pub fn epsg(&self) -> u32 {
        self.epsg
    }

    pub fn forward(&self, point: GeographicPoint) -> Result<(f64, f64), ProjectionError> {
        let proj = self.forward.lock().map_err(backend)?;
        proj.convert((point.lon, point.lat)).map_err(backend)
    }

    pub fn inverse(&self, x: f64, y: f64) -> Result<GeographicPoint, ProjectionError> {
        let proj = self.inverse.lock().map_err(backend)?;
        let (lon, lat) = proj.convert((x, y)).map_err(backend)?;
        Ok(GeographicPoint::new(lon, lat))
    }
}
