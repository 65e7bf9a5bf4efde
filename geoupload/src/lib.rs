//! # geoupload
//!
//! Extraction de polygones depuis les fichiers téléversés sur le visor
//! (GeoJSON, KML) et jeton base64 pour les transporter dans l'URL.
//!
//! ## Features
//!
//! - Dispatch par extension (insensible à la casse)
//! - GeoJSON: première feature Polygon d'une FeatureCollection, ou Feature isolée
//! - KML: premier `<Polygon>`, erreurs structurelles distinctes
//! - KMZ et Shapefile refusés avec un message d'aide
//! - Jeton URL-safe réversible (`codec`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use geoupload::{parse_uploaded_file, UploadedFile, UploadResult};
//!
//! let file = UploadedFile::new("predio.geojson", std::fs::read("predio.geojson")?);
//! match parse_uploaded_file(&file) {
//!     UploadResult::Success(s) => println!("?polygon={}", s.polygon_base64),
//!     UploadResult::Error(e) => eprintln!("{}: {:?}", e.message, e.details),
//! }
//! ```

pub mod codec;
pub mod error;
pub mod parser;
pub mod types;

pub use error::UploadError;
pub use types::{
    ExtractedPolygon, FileFormat, Ring, UploadFailure, UploadResult, UploadSuccess, UploadedFile,
};

use tracing::{info, warn};

/// Liste `accept` du sélecteur de fichiers
///
/// Plus large que ce qui est réellement lu: `.kmz`, `.shp` et `.zip` sont
/// acceptés par le sélecteur puis refusés avec un message d'aide.
pub const ACCEPTED_EXTENSIONS: &str = ".kml,.kmz,.geojson,.json,.shp,.zip";

/// Extrait le polygone d'un fichier téléversé.
///
/// # Returns
///
/// `UploadResult::Success` avec l'anneau `[lon, lat]`, le jeton base64, le
/// nombre de features et le nom du fichier, ou `UploadResult::Error` avec un
/// message et un détail affichables.
pub fn parse_uploaded_file(file: &UploadedFile) -> UploadResult {
    match extract_polygon(file) {
        Ok(extracted) => {
            let polygon_base64 = codec::encode(&extracted.ring);
            info!(
                file = %file.name,
                points = extracted.ring.len(),
                features = extracted.feature_count,
                "Polygon extracted from upload"
            );
            UploadResult::Success(UploadSuccess {
                coordinates: extracted.ring,
                polygon_base64,
                feature_count: extracted.feature_count,
                file_name: file.name.clone(),
            })
        }
        Err(e) => {
            warn!(file = %file.name, error = %e, "Upload rejected");
            UploadResult::Error(e.to_failure())
        }
    }
}

/// Extrait le polygone sans encodage, avec l'erreur typée
pub fn extract_polygon(file: &UploadedFile) -> Result<ExtractedPolygon, UploadError> {
    let extension = file.extension();

    match FileFormat::from_extension(&extension) {
        FileFormat::GeoJson => parser::geojson::parse(&parser::decode_text(&file.content)),
        FileFormat::Kml => parser::kml::parse(&parser::decode_text(&file.content)),
        FileFormat::Kmz | FileFormat::Shapefile | FileFormat::Unknown => {
            Err(UploadError::UnsupportedFormat { extension })
        }
    }
}
