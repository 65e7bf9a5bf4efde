//! Transformation de géométries entre deux projections enregistrées
//!
//! Passe toujours par WGS84 ; identité si source == cible.

use super::{GeographicPoint, ProjectedPoint, ProjectionRegistry, WGS84_EPSG};
use crate::error::ProjectionError;
use geo::{Coord, Geometry, MapCoords, Polygon};

/// Transformateur lié à un registre
#[derive(Debug, Clone, Copy)]
pub struct Transformer<'a> {
    registry: &'a ProjectionRegistry,
    source_epsg: u32,
    target_epsg: u32,
}

impl<'a> Transformer<'a> {
    pub(super) fn new(registry: &'a ProjectionRegistry, source_epsg: u32, target_epsg: u32) -> Self {
        Self {
            registry,
            source_epsg,
            target_epsg,
        }
    }

    pub fn source_epsg(&self) -> u32 {
        self.source_epsg
    }

    pub fn target_epsg(&self) -> u32 {
        self.target_epsg
    }

    pub fn is_identity(&self) -> bool {
        self.source_epsg == self.target_epsg
    }

    /// Transforme une coordonnée
    pub fn transform_coord(&self, coord: Coord) -> Result<Coord, ProjectionError> {
        if self.is_identity() {
            return Ok(coord);
        }

        let geo = if self.source_epsg == WGS84_EPSG {
            GeographicPoint::new(coord.x, coord.y)
        } else {
            self.registry
                .to_geographic(ProjectedPoint::new(coord.x, coord.y, self.source_epsg))?
        };

        let projected = self.registry.to_projected(geo, self.target_epsg)?;
        Ok(projected.coord())
    }

    /// Transforme un polygone (contour et trous)
    pub fn transform_polygon(&self, polygon: &Polygon) -> Result<Polygon, ProjectionError> {
        if self.is_identity() {
            return Ok(polygon.clone());
        }
        polygon.try_map_coords(|c| self.transform_coord(c))
    }

    /// Transforme une géométrie quelconque
    pub fn transform_geometry(&self, geom: &Geometry) -> Result<Geometry, ProjectionError> {
        if self.is_identity() {
            return Ok(geom.clone());
        }
        geom.try_map_coords(|c| self.transform_coord(c))
    }
}
