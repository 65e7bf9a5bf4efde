//! # visor-urbano
//!
//! Cœur géospatial d'un visualiseur cadastral : projections, requêtes
//! GeoServer et résolution de propriétés.
//!
//! ## Features
//!
//! - Projections intégrées (WGS84, Web Mercator, UTM, Lambert conique Mexique)
//! - Filtres CQL et URLs WFS/WMS (prédios, téléchargement, minicarte, GetFeatureInfo)
//! - Résolution d'un prédio en vue propriété (adresse, surface, emprise)
//! - État d'interaction de la carte (outils, import, dessin, mesure)
//! - Feature `reproject` : tout code EPSG via PROJ
//!
//! ## Usage CLI
//!
//! ```bash
//! # Propriété sous un point
//! visor-urbano resolve --point "-103.35 20.66"
//!
//! # Polygone d'un fichier importé
//! visor-urbano parse ./predio.kml
//!
//! # Conversion de coordonnées
//! visor-urbano transform --point "-103.35 20.66" --epsg 32613
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod geoserver;
pub mod projection;
pub mod resolver;
pub mod route;

pub use config::{Config, LayerConfig};
pub use controller::{ClickOutcome, MapAction, MapController, MapInteractionState};
pub use error::{FetchError, ProjectionError, ResolveError};
pub use geoserver::{FeatureInfoSource, GeoServerClient, ParcelSource, ServiceEndpoints};
pub use projection::{GeographicPoint, ProjectedPoint, ProjectionRegistry};
pub use resolver::{resolve_property, PropertyView, ResolveContext};
pub use route::{load_property, QueryState};
