//! Types de données pour le crate geoupload

use bytes::Bytes;
use serde::Serialize;

/// Anneau extérieur d'un polygone: paires `[lon, lat]` ordonnées
///
/// Le système de coordonnées n'est pas porté par le type; pour les fichiers
/// téléversés il s'agit toujours de WGS84.
pub type Ring = Vec<[f64; 2]>;

/// Fichier reçu depuis le sélecteur de fichiers
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Nom du fichier tel que fourni par le navigateur
    pub name: String,

    /// Contenu brut
    pub content: Bytes,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Extension en minuscules (sans le point)
    pub fn extension(&self) -> String {
        match self.name.rsplit_once('.') {
            Some((_, ext)) => ext.to_ascii_lowercase(),
            None => String::new(),
        }
    }
}

/// Format détecté depuis l'extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    GeoJson,
    Kml,
    Kmz,
    Shapefile,
    Unknown,
}

impl FileFormat {
    /// Détermine le format (insensible à la casse)
    pub fn from_extension(extension: &str) -> Self {
        match extension.to_ascii_lowercase().as_str() {
            "geojson" | "json" => Self::GeoJson,
            "kml" => Self::Kml,
            "kmz" => Self::Kmz,
            "zip" | "shp" => Self::Shapefile,
            _ => Self::Unknown,
        }
    }
}

/// Polygone extrait avec succès
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSuccess {
    pub coordinates: Ring,
    pub polygon_base64: String,
    pub feature_count: usize,
    pub file_name: String,
}

/// Erreur affichable dans la boîte de dialogue
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadFailure {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Résultat d'un téléversement: succès ou erreur, jamais les deux
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UploadResult {
    Success(UploadSuccess),
    Error(UploadFailure),
}

impl UploadResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Retourne le succès, s'il y en a un
    pub fn success(&self) -> Option<&UploadSuccess> {
        match self {
            Self::Success(s) => Some(s),
            Self::Error(_) => None,
        }
    }

    /// Retourne l'erreur, s'il y en a une
    pub fn failure(&self) -> Option<&UploadFailure> {
        match self {
            Self::Success(_) => None,
            Self::Error(e) => Some(e),
        }
    }
}

/// Polygone extrait d'un fichier, avant encodage
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPolygon {
    /// Anneau extérieur
    pub ring: Ring,

    /// Nombre de features (GeoJSON) ou de `<Polygon>` (KML) dans le fichier
    pub feature_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_case_insensitive() {
        let file = UploadedFile::new("Predio.GeoJSON", Bytes::new());
        assert_eq!(file.extension(), "geojson");
        assert_eq!(FileFormat::from_extension(&file.extension()), FileFormat::GeoJson);
        assert_eq!(FileFormat::from_extension("KMZ"), FileFormat::Kmz);
        assert_eq!(FileFormat::from_extension("shp"), FileFormat::Shapefile);
    }

    #[test]
    fn test_no_extension() {
        let file = UploadedFile::new("README", Bytes::new());
        assert_eq!(file.extension(), "");
        assert_eq!(FileFormat::from_extension(""), FileFormat::Unknown);
    }

    #[test]
    fn test_serialize_failure_without_details() {
        let result = UploadResult::Error(UploadFailure {
            message: "No polygon found".into(),
            details: None,
        });
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"{"message":"No polygon found"}"#);
    }
}
