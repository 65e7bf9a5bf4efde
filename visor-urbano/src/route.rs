//! État de la page carte porté par la query string
//!
//! Paramètres : `point` (`"lon lat"` WGS84), `polygon` (jeton du polygone),
//! `address`, `municipality`. Le chargeur transforme cet état en requête de
//! prédio puis en [`PropertyView`].

use crate::error::ResolveError;
use crate::geoserver::filter::{intersects_filter, point_filter};
use crate::geoserver::ParcelSource;
use crate::projection::{GeographicPoint, WGS84_EPSG};
use crate::resolver::{geometry, resolve_property, PropertyView, ResolveContext};
use geoupload::codec;
use tracing::{debug, info, warn};
use url::form_urlencoded;

/// Paramètres de la route
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryState {
    pub point: Option<GeographicPoint>,
    /// Jeton du polygone (voir `geoupload::codec`)
    pub polygon: Option<String>,
    pub address: Option<String>,
    pub municipality: Option<String>,
}

impl QueryState {
    /// Parse une query string (avec ou sans `?` initial)
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut state = Self::default();

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "point" => {
                    state.point = GeographicPoint::parse_query_value(value);
                    if state.point.is_none() {
                        warn!(point = value, "Paramètre point invalide, ignoré");
                    }
                }
                "polygon" => state.polygon = Some(value.to_string()),
                "address" => state.address = Some(value.to_string()),
                "municipality" => state.municipality = Some(value.to_string()),
                other => debug!(param = other, "Paramètre inconnu ignoré"),
            }
        }
        state
    }

    /// Sérialise en query string (sans `?`)
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        if let Some(point) = self.point {
            serializer.append_pair("point", &point.to_query_value());
        }
        if let Some(polygon) = &self.polygon {
            serializer.append_pair("polygon", polygon);
        }
        if let Some(address) = &self.address {
            serializer.append_pair("address", address);
        }
        if let Some(municipality) = &self.municipality {
            serializer.append_pair("municipality", municipality);
        }
        serializer.finish()
    }

    /// Anneau décodé du paramètre `polygon` (au moins 3 sommets)
    pub fn polygon_ring(&self) -> Option<Vec<GeographicPoint>> {
        let ring = codec::decode(self.polygon.as_deref()?)?;
        if ring.len() < 3 {
            warn!(points = ring.len(), "Polygone de la query string trop court");
            return None;
        }
        Some(ring.into_iter().map(GeographicPoint::from_pair).collect())
    }

    /// Filtre CQL de la requête de prédio
    ///
    /// Polygone : `INTERSECTS` ; point : `CONTAINS`. `None` si la route
    /// ne porte ni l'un ni l'autre.
    pub fn parcel_filter(&self, ctx: &ResolveContext<'_>) -> Result<Option<String>, ResolveError> {
        if let Some(ring) = self.polygon_ring() {
            let local = ctx
                .registry
                .transformer(WGS84_EPSG, ctx.local_epsg)?
                .transform_polygon(&geometry::polygon_from_ring(&ring))?;
            return Ok(Some(intersects_filter(ctx.geometry_column, &local)?));
        }

        match self.point {
            Some(point) => {
                let projected = ctx.registry.to_projected(point, ctx.local_epsg)?;
                Ok(Some(point_filter(ctx.geometry_column, &projected)))
            }
            None => Ok(None),
        }
    }
}

/// Charge la propriété désignée par la route
///
/// Tout échec (filtre, requête, résolution) est journalisé et donne `None`.
pub async fn load_property<P: ParcelSource>(
    source: &P,
    ctx: &ResolveContext<'_>,
    query: &QueryState,
) -> Option<PropertyView> {
    let filter = match query.parcel_filter(ctx) {
        Ok(Some(filter)) => filter,
        Ok(None) => return None,
        Err(e) => {
            warn!(error = %e, "Filtre de prédio impossible à construire");
            return None;
        }
    };

    let response = match source.query_parcels(&filter).await {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, filter = %filter, "Requête de prédio en échec");
            return None;
        }
    };

    let ring = query.polygon_ring();
    match resolve_property(&response, ring.as_deref(), ctx) {
        Ok(view) => {
            info!(
                feature_id = view.feature_id.as_deref(),
                area = %view.area,
                "Propriété chargée"
            );
            Some(view)
        }
        Err(e) => {
            warn!(error = %e, "Résolution de la propriété en échec");
            None
        }
    }
}
