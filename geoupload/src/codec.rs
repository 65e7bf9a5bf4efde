//! Jeton base64 pour transporter un polygone dans la query string
//!
//! `encode` sérialise l'anneau en JSON puis en base64 URL-safe sans padding.
//! `decode` accepte aussi l'alphabet standard (avec ou sans `=`) et ne
//! panique jamais: un jeton corrompu donne `None`.

use base64::alphabet;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use tracing::warn;

use crate::types::Ring;

const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);

const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// Encode un anneau en jeton
pub fn encode(ring: &[[f64; 2]]) -> String {
    // La sérialisation d'un tableau de f64 finis ne peut pas échouer
    let json = serde_json::to_vec(ring).unwrap_or_else(|_| b"[]".to_vec());
    URL_SAFE_NO_PAD.encode(json)
}

/// Décode un jeton; `None` si le jeton est invalide
pub fn decode(token: &str) -> Option<Ring> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }

    let bytes = match URL_SAFE_LENIENT
        .decode(token)
        .or_else(|_| STANDARD_LENIENT.decode(token))
    {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "Polygon token is not valid base64");
            return None;
        }
    };

    match serde_json::from_slice::<Ring>(&bytes) {
        Ok(ring) => Some(ring),
        Err(e) => {
            warn!(error = %e, "Polygon token does not contain a coordinate ring");
            None
        }
    }
}
