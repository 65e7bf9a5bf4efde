//! Parsers par format de fichier

pub mod geojson;
pub mod kml;

use std::borrow::Cow;

use tracing::debug;

/// Décode le contenu texte d'un fichier téléversé
///
/// UTF-8 (validation SIMD) sans BOM en priorité, puis BOM UTF-16, puis
/// Windows-1252 pour les exports SIG anciens.
pub fn decode_text(data: &[u8]) -> Cow<'_, str> {
    if let Ok(text) = simdutf8::basic::from_utf8(data) {
        return Cow::Borrowed(text.strip_prefix('\u{feff}').unwrap_or(text));
    }

    let encoding = encoding_rs::Encoding::for_bom(data)
        .map(|(encoding, _)| encoding)
        .unwrap_or(encoding_rs::WINDOWS_1252);
    debug!(encoding = encoding.name(), "Upload is not UTF-8, decoding with fallback");

    // decode() retire le BOM si présent
    let (decoded, _, _) = encoding.decode(data);
    decoded
}
