//! Types d'erreurs pour le crate visor-urbano

use thiserror::Error;

/// Erreurs de transformation de coordonnées
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProjectionError {
    /// EPSG connu mais pas encore enregistré
    #[error("EPSG:{0} is not registered, register it before use")]
    Unregistered(u32),

    /// EPSG inconnu (ni intégré, ni disponible via PROJ)
    #[error("EPSG:{0} is not supported")]
    Unsupported(u32),

    /// Coordonnée hors domaine ou non finie
    #[error("Invalid coordinate ({x}, {y}) for EPSG:{epsg}")]
    InvalidCoordinate { x: f64, y: f64, epsg: u32 },

    /// Erreur remontée par PROJ
    #[error("PROJ transformation failed: {0}")]
    Backend(String),
}

/// Erreurs de résolution d'une propriété
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Réponse du serveur cartographique non conforme au schéma cadastral
    #[error("Invalid parcel response: {0}")]
    InvalidParcelShape(String),

    /// Ni la réponse ni le polygone fourni ne donnent de géométrie
    #[error("No usable geometry in parcel response or override polygon")]
    EmptyGeometry,

    /// Identifiant de prédio inutilisable dans un filtre CQL
    #[error("Feature id {0:?} cannot be used in a CQL filter")]
    UnsafeFeatureId(String),

    /// Écriture WKT impossible
    #[error("Could not encode geometry as WKT: {0}")]
    Wkt(String),

    /// URL de service invalide
    #[error("Invalid map server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Transformation de coordonnées impossible
    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

impl ResolveError {
    pub fn invalid_shape(reason: impl Into<String>) -> Self {
        Self::InvalidParcelShape(reason.into())
    }
}

/// Erreurs d'appel au serveur cartographique (WFS/WMS)
#[derive(Debug, Error)]
pub enum FetchError {
    /// Client HTTP impossible à construire
    #[error("Could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Erreur réseau ou TLS
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Code HTTP d'erreur
    #[error("Map server answered {status} for {url}")]
    Status { url: String, status: u16 },

    /// Corps illisible
    #[error("Could not decode map server response: {0}")]
    Decode(String),

    /// Rapport d'exception OGC dans un corps 200
    #[error("Map server exception: {0}")]
    ServiceException(String),

    /// URL invalide dans la configuration
    #[error("Invalid map server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
