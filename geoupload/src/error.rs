//! Types d'erreurs pour le crate geoupload

use thiserror::Error;

use crate::types::UploadFailure;

/// Erreurs pouvant survenir lors de l'extraction d'un polygone
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UploadError {
    /// Format refusé (KMZ, Shapefile, extension inconnue)
    #[error("{}", unsupported_message(.extension))]
    UnsupportedFormat { extension: String },

    /// Contenu illisible (JSON ou XML mal formé)
    #[error("Invalid {format} file: {reason}")]
    InvalidFormat {
        format: &'static str,
        reason: String,
    },

    /// Aucun polygone dans le fichier
    #[error("No polygon found in {format} file")]
    NoPolygonFeature { format: &'static str },

    /// Feature dont la géométrie n'est pas un Polygon
    #[error("Unsupported geometry type: {0}")]
    UnsupportedGeometryType(String),

    /// Anneau vide ou position invalide
    #[error("Invalid polygon coordinates: {0}")]
    InvalidCoordinates(String),

    /// Moins de 3 paires valides
    #[error("Insufficient coordinates: found {found}, need at least 3")]
    InsufficientCoordinates { found: usize },

    /// `<Polygon>` présent mais élément intermédiaire manquant
    #[error("Invalid polygon structure: missing <{missing}>")]
    InvalidPolygonStructure { missing: &'static str },

    /// `<coordinates>` absent ou vide
    #[error("No coordinates found in polygon")]
    NoCoordinatesFound,
}

fn unsupported_message(extension: &str) -> &'static str {
    match extension {
        "kmz" => "KMZ files not fully supported",
        "zip" | "shp" => "Shapefile support not implemented",
        _ => "Unsupported file format",
    }
}

impl UploadError {
    /// Crée une erreur de format invalide avec contexte
    pub fn invalid_format(format: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            format,
            reason: reason.into(),
        }
    }

    /// Crée une erreur de coordonnées invalides
    pub fn invalid_coordinates(reason: impl Into<String>) -> Self {
        Self::InvalidCoordinates(reason.into())
    }

    /// Titre affiché à l'utilisateur
    pub fn message(&self) -> String {
        match self {
            Self::UnsupportedFormat { extension } => unsupported_message(extension).to_string(),
            Self::InvalidFormat { format, .. } => format!("Invalid {} file", format),
            Self::NoPolygonFeature { .. } => "No polygon found".to_string(),
            Self::UnsupportedGeometryType(kind) => format!("Unsupported geometry type: {}", kind),
            Self::InvalidCoordinates(_) => "Invalid polygon coordinates".to_string(),
            Self::InsufficientCoordinates { .. } => "Insufficient coordinates".to_string(),
            Self::InvalidPolygonStructure { .. } => "Invalid polygon structure".to_string(),
            Self::NoCoordinatesFound => "No coordinates found".to_string(),
        }
    }

    /// Détail affiché sous le titre
    pub fn details(&self) -> Option<String> {
        match self {
            Self::UnsupportedFormat { extension } => Some(match extension.as_str() {
                "kmz" => "Open the file in Google Earth or QGIS and export it as .kml".to_string(),
                "zip" | "shp" => {
                    "Convert the shapefile to GeoJSON (.geojson) or KML (.kml) and upload it again"
                        .to_string()
                }
                other => format!(
                    "Files with extension '.{}' cannot be read. Use .geojson, .json or .kml",
                    other
                ),
            }),
            Self::InvalidFormat { reason, .. } => Some(reason.clone()),
            Self::NoPolygonFeature { format } => Some(format!(
                "The {} file does not contain any Polygon geometry",
                format
            )),
            Self::UnsupportedGeometryType(_) => {
                Some("Only Polygon geometries can be used to select a property".to_string())
            }
            Self::InvalidCoordinates(reason) => Some(reason.clone()),
            Self::InsufficientCoordinates { found } => Some(format!(
                "A polygon needs at least 3 coordinate pairs, found {}",
                found
            )),
            Self::InvalidPolygonStructure { missing } => {
                Some(format!("The <Polygon> element has no <{}> element", missing))
            }
            Self::NoCoordinatesFound => {
                Some("The <LinearRing> element has no <coordinates> content".to_string())
            }
        }
    }

    /// Convertit en résultat affichable
    pub fn to_failure(&self) -> UploadFailure {
        UploadFailure {
            message: self.message(),
            details: self.details(),
        }
    }
}
