//! Résolution d'une propriété
//!
//! À partir de la réponse WFS de la couche cadastrale (et éventuellement d'un
//! polygone fourni par l'utilisateur), construit la [`PropertyView`] affichée
//! dans la fiche : adresse, surfaces, emprise, liens de téléchargement et
//! minicarte.

pub mod geometry;
pub mod parcel;

pub use geometry::BoundingBox;
pub use parcel::{parse_parcels, ParcelAttributes, ParcelFeature};

use crate::config::Config;
use crate::error::ResolveError;
use crate::geoserver::filter::{feature_id_filter, intersects_filter, is_safe_feature_id};
use crate::geoserver::{FeatureFilter, ServiceEndpoints};
use crate::projection::{GeographicPoint, ProjectionRegistry, WGS84_EPSG};
use geo::Polygon;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Paramètres de résolution
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    pub registry: &'a ProjectionRegistry,
    pub endpoints: &'a ServiceEndpoints,
    pub geometry_column: &'a str,
    /// EPSG de la couche cadastrale
    pub local_epsg: u32,
    /// Marge de la minicarte (mètres)
    pub buffer_meters: f64,
    /// Tolérance Douglas-Peucker (mètres)
    pub simplify_tolerance: f64,
}

impl<'a> ResolveContext<'a> {
    pub fn new(
        config: &'a Config,
        registry: &'a ProjectionRegistry,
        endpoints: &'a ServiceEndpoints,
    ) -> Self {
        Self {
            registry,
            endpoints,
            geometry_column: &config.geometry_column,
            local_epsg: config.local_epsg,
            buffer_meters: config.buffer_meters,
            simplify_tolerance: config.simplify_tolerance,
        }
    }
}

/// Propriété résolue, prête pour l'affichage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyView {
    pub address: String,
    /// Surface formatée (`1,234.56 m²`)
    pub area: String,
    pub area_m2: f64,
    pub area_built: String,
    /// Emprise élargie, en WGS84
    pub bounding_box: BoundingBox,
    /// Contour WGS84 `[lon, lat]`
    pub coordinates: Vec<[f64; 2]>,
    #[serde(rename = "downloadURL")]
    pub download_url: String,
    #[serde(rename = "minimapURL")]
    pub minimap_url: String,
    pub municipality: String,
    pub municipality_id: u32,
    pub neighborhood: String,
    pub postal_code: String,
    pub street: String,
    pub cadastral_key: String,
    /// Identifiant WFS du prédio retenu, absent si aucun prédio ne correspond
    pub feature_id: Option<String>,
}

/// Géométrie retenue pour la propriété
struct ResolvedShape {
    local: Polygon,
    wgs84: Polygon,
    coordinates: Vec<[f64; 2]>,
}

/// Résout une propriété depuis une réponse WFS et un polygone optionnel
///
/// Le polygone fourni (au moins 3 sommets) est prioritaire : il donne la
/// géométrie et impose un filtre spatial pour la minicarte. Les attributs
/// viennent du premier prédio renvoyé, ou sont à zéro s'il n'y en a aucun.
pub fn resolve_property(
    response: &Value,
    override_polygon: Option<&[GeographicPoint]>,
    ctx: &ResolveContext<'_>,
) -> Result<PropertyView, ResolveError> {
    let parcels = parse_parcels(response)?;
    let first = parcels.first();

    let override_polygon = match override_polygon {
        Some(ring) if ring.len() >= 3 => Some(ring),
        Some(ring) => {
            warn!(points = ring.len(), "Polygone fourni ignoré : moins de 3 sommets");
            None
        }
        None => None,
    };

    // Identifiant utilisable dans les filtres ; sans polygone fourni, la
    // minicarte en dépend
    let matched_id = match first {
        Some(parcel) if is_safe_feature_id(&parcel.id) => Some(parcel.id.as_str()),
        Some(parcel) if override_polygon.is_none() => {
            return Err(ResolveError::UnsafeFeatureId(parcel.id.clone()))
        }
        Some(parcel) => {
            warn!(feature_id = %parcel.id, "Identifiant de prédio non sûr, filtre spatial utilisé");
            None
        }
        None => None,
    };

    let shape = match override_polygon {
        Some(ring) => {
            let wgs84 = geometry::polygon_from_ring(ring);
            let local = ctx
                .registry
                .transformer(WGS84_EPSG, ctx.local_epsg)?
                .transform_polygon(&wgs84)?;
            ResolvedShape {
                local,
                wgs84,
                coordinates: ring.iter().map(|p| p.to_pair()).collect(),
            }
        }
        None => {
            let parcel = first.ok_or(ResolveError::EmptyGeometry)?;
            let local = geometry::simplify(&parcel.geometry, ctx.simplify_tolerance);
            let wgs84 = ctx
                .registry
                .transformer(ctx.local_epsg, WGS84_EPSG)?
                .transform_polygon(&local)?;
            let coordinates = geometry::exterior_pairs(&wgs84);
            ResolvedShape {
                local,
                wgs84,
                coordinates,
            }
        }
    };

    let envelope =
        geometry::buffered_envelope(&shape.local, ctx.buffer_meters).ok_or(ResolveError::EmptyGeometry)?;
    let bounding_box =
        geometry::envelope_to_wgs84(&envelope, &ctx.registry.transformer(ctx.local_epsg, WGS84_EPSG)?)?;

    let area_m2 = geometry::area_m2(&shape.wgs84);

    let (download_url, minimap_url) = match (override_polygon, matched_id) {
        (None, Some(id)) => (
            ctx.endpoints.download(FeatureFilter::Id(id)),
            ctx.endpoints.minimap(&feature_id_filter(id)?, &envelope),
        ),
        (Some(_), matched) => {
            let spatial = intersects_filter(ctx.geometry_column, &shape.local)?;
            let download = match matched {
                Some(id) => ctx.endpoints.download(FeatureFilter::Id(id)),
                None => ctx.endpoints.download(FeatureFilter::Cql(&spatial)),
            };
            (download, ctx.endpoints.minimap(&spatial, &envelope))
        }
        (None, None) => return Err(ResolveError::EmptyGeometry),
    };

    let attributes = first.map(|p| p.attributes.clone()).unwrap_or_default();

    debug!(
        feature_id = matched_id,
        overridden = override_polygon.is_some(),
        area_m2,
        "Propriété résolue"
    );

    Ok(PropertyView {
        address: format_address(&attributes),
        area: geometry::format_area(area_m2),
        area_m2,
        area_built: geometry::format_area(attributes.built_area),
        bounding_box,
        coordinates: shape.coordinates,
        download_url: download_url.to_string(),
        minimap_url: minimap_url.to_string(),
        municipality: attributes.municipality,
        municipality_id: attributes.municipality_id,
        neighborhood: attributes.neighborhood.unwrap_or_default(),
        postal_code: attributes.postal_code.unwrap_or_default(),
        street: attributes.street.unwrap_or_default(),
        cadastral_key: attributes.cadastral_key,
        feature_id: matched_id.map(str::to_string),
    })
}

/// `"{calle} {num_ext}, {colonia}, {localidad}, {cp}"`
pub fn format_address(attributes: &ParcelAttributes) -> String {
    let field = |v: &Option<String>| v.as_deref().unwrap_or("").to_string();
    format!(
        "{} {}, {}, {}, {}",
        field(&attributes.street),
        field(&attributes.exterior_number),
        field(&attributes.neighborhood),
        field(&attributes.locality),
        field(&attributes.postal_code),
    )
}
