//! Extraction du polygone depuis un fichier KML
//!
//! Le document est entièrement lu en arbre (comme un DOM) avant la recherche:
//! une erreur XML n'importe où dans le fichier est rapportée comme
//! `InvalidFormat`, même après le premier `<Polygon>`.

use std::borrow::Cow;

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use crate::types::{ExtractedPolygon, Ring};
use crate::UploadError;

const FORMAT: &str = "KML";

/// Élément XML simplifié (nom local, texte concaténé, enfants)
#[derive(Debug, Default)]
struct Element {
    name: String,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn named(name: &[u8]) -> Self {
        Self {
            name: String::from_utf8_lossy(name).into_owned(),
            ..Default::default()
        }
    }

    /// Premier descendant portant ce nom (ordre du document)
    fn find(&self, name: &str) -> Option<&Element> {
        for child in &self.children {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// Nombre de descendants portant ce nom
    fn count(&self, name: &str) -> usize {
        self.children
            .iter()
            .map(|c| usize::from(c.name == name) + c.count(name))
            .sum()
    }
}

/// Parse un document KML et retourne l'anneau extérieur du premier `<Polygon>`
pub fn parse(text: &str) -> Result<ExtractedPolygon, UploadError> {
    let document = read_document(text)?;

    let polygon = document
        .find("Polygon")
        .ok_or(UploadError::NoPolygonFeature { format: FORMAT })?;
    let feature_count = document.count("Polygon");

    let outer = polygon
        .find("outerBoundaryIs")
        .ok_or(UploadError::InvalidPolygonStructure {
            missing: "outerBoundaryIs",
        })?;
    let linear_ring = outer
        .find("LinearRing")
        .ok_or(UploadError::InvalidPolygonStructure {
            missing: "LinearRing",
        })?;
    let coordinates = linear_ring
        .find("coordinates")
        .ok_or(UploadError::NoCoordinatesFound)?;

    let raw = coordinates.text.trim();
    if raw.is_empty() {
        return Err(UploadError::NoCoordinatesFound);
    }

    let ring = parse_coordinates(raw);
    if ring.len() < 3 {
        return Err(UploadError::InsufficientCoordinates { found: ring.len() });
    }

    debug!(polygons = feature_count, points = ring.len(), "Polygon found in KML");

    Ok(ExtractedPolygon {
        ring,
        feature_count,
    })
}

/// Parse le contenu de `<coordinates>`: tuples `lon,lat[,alt]` séparés par des blancs
///
/// Les tuples invalides sont ignorés, l'altitude est abandonnée.
pub fn parse_coordinates(raw: &str) -> Ring {
    raw.split_whitespace()
        .filter_map(|tuple| {
            let mut parts = tuple.split(',');
            let lon = parse_f64(parts.next()?)?;
            let lat = parse_f64(parts.next()?)?;
            Some([lon, lat])
        })
        .collect()
}

#[inline]
fn parse_f64(s: &str) -> Option<f64> {
    fast_float::parse::<f64, _>(s.trim())
        .ok()
        .filter(|v| v.is_finite())
}

/// Lit tout le document en arbre
fn read_document(text: &str) -> Result<Element, UploadError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    // stack[0] est une racine virtuelle
    let mut stack: Vec<Element> = vec![Element::default()];

    loop {
        let event = reader.read_event().map_err(|e| {
            UploadError::invalid_format(
                FORMAT,
                format!("XML error at position {}: {}", reader.buffer_position(), e),
            )
        })?;

        match event {
            Event::Start(e) => stack.push(Element::named(e.local_name().as_ref())),
            Event::Empty(e) => {
                let element = Element::named(e.local_name().as_ref());
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(element);
                }
            }
            Event::End(_) => {
                if stack.len() < 2 {
                    return Err(UploadError::invalid_format(FORMAT, "Unexpected closing tag"));
                }
                if let Some(element) = stack.pop() {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(element);
                    }
                }
            }
            Event::Text(t) => {
                let content = t
                    .unescape()
                    .map_err(|e| UploadError::invalid_format(FORMAT, e.to_string()))?;
                append_text(&mut stack, content);
            }
            Event::CData(c) => {
                let content = String::from_utf8_lossy(&c.into_inner()).into_owned();
                append_text(&mut stack, Cow::Owned(content));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.len() != 1 {
        let unclosed = stack.last().map(|e| e.name.clone()).unwrap_or_default();
        return Err(UploadError::invalid_format(
            FORMAT,
            format!("Unclosed element <{}>", unclosed),
        ));
    }

    let root = stack.pop().unwrap_or_default();
    if root.children.is_empty() {
        return Err(UploadError::invalid_format(FORMAT, "Document has no root element"));
    }

    Ok(root)
}

fn append_text(stack: &mut [Element], content: Cow<'_, str>) {
    if let Some(current) = stack.last_mut() {
        if !current.text.is_empty() {
            current.text.push(' ');
        }
        current.text.push_str(&content);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kml(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2"><Document><Placemark><name>Predio</name>{}</Placemark></Document></kml>"#,
            body
        )
    }

    #[test]
    fn test_parse_polygon() {
        let text = kml(
            r#"<Polygon><outerBoundaryIs><LinearRing><coordinates>
                -103.35,20.66,0 -103.34,20.66,0
                -103.34,20.67,0 -103.35,20.67,0 -103.35,20.66,0
            </coordinates></LinearRing></outerBoundaryIs></Polygon>"#,
        );

        let result = parse(&text).unwrap();
        assert_eq!(result.feature_count, 1);
        assert_eq!(result.ring.len(), 5);
        assert_eq!(result.ring[0], [-103.35, 20.66]);
        assert_eq!(result.ring[3], [-103.35, 20.67]);
    }

    #[test]
    fn test_missing_outer_boundary() {
        let text = kml(
            r#"<Polygon><innerBoundaryIs><LinearRing><coordinates>0,0 1,0 1,1 0,0</coordinates></LinearRing></innerBoundaryIs></Polygon>"#,
        );
        assert_eq!(
            parse(&text).unwrap_err(),
            UploadError::InvalidPolygonStructure {
                missing: "outerBoundaryIs"
            }
        );
    }

    #[test]
    fn test_missing_linear_ring() {
        let text = kml(r#"<Polygon><outerBoundaryIs></outerBoundaryIs></Polygon>"#);
        assert_eq!(
            parse(&text).unwrap_err(),
            UploadError::InvalidPolygonStructure {
                missing: "LinearRing"
            }
        );
    }

    #[test]
    fn test_missing_coordinates() {
        let text = kml(r#"<Polygon><outerBoundaryIs><LinearRing/></outerBoundaryIs></Polygon>"#);
        assert_eq!(parse(&text).unwrap_err(), UploadError::NoCoordinatesFound);

        let text = kml(
            r#"<Polygon><outerBoundaryIs><LinearRing><coordinates>   </coordinates></LinearRing></outerBoundaryIs></Polygon>"#,
        );
        assert_eq!(parse(&text).unwrap_err(), UploadError::NoCoordinatesFound);
    }

    #[test]
    fn test_no_polygon() {
        let text = kml(r#"<Point><coordinates>-103.35,20.66</coordinates></Point>"#);
        assert_eq!(
            parse(&text).unwrap_err(),
            UploadError::NoPolygonFeature { format: "KML" }
        );
    }

    #[test]
    fn test_insufficient_coordinates() {
        let text = kml(
            r#"<Polygon><outerBoundaryIs><LinearRing><coordinates>0,0 abc,1 1,1</coordinates></LinearRing></outerBoundaryIs></Polygon>"#,
        );
        assert_eq!(
            parse(&text).unwrap_err(),
            UploadError::InsufficientCoordinates { found: 2 }
        );
    }

    #[test]
    fn test_malformed_xml() {
        let err = parse("<kml><Document><Polygon></Document></kml>").unwrap_err();
        assert!(matches!(err, UploadError::InvalidFormat { format: "KML", .. }));

        let err = parse("<kml><Document>").unwrap_err();
        assert!(matches!(err, UploadError::InvalidFormat { .. }));

        let err = parse("").unwrap_err();
        assert!(matches!(err, UploadError::InvalidFormat { .. }));
    }

    #[test]
    fn test_prefixed_names_and_count() {
        let text = r#"<kml:kml xmlns:kml="http://www.opengis.net/kml/2.2"><kml:Document>
            <kml:Placemark><kml:Polygon><kml:outerBoundaryIs><kml:LinearRing>
                <kml:coordinates>0,0 2,0 2,2 0,2 0,0</kml:coordinates>
            </kml:LinearRing></kml:outerBoundaryIs></kml:Polygon></kml:Placemark>
            <kml:Placemark><kml:Polygon><kml:outerBoundaryIs><kml:LinearRing>
                <kml:coordinates>5,5 6,5 6,6 5,5</kml:coordinates>
            </kml:LinearRing></kml:outerBoundaryIs></kml:Polygon></kml:Placemark>
        </kml:Document></kml:kml>"#;

        let result = parse(text).unwrap();
        assert_eq!(result.feature_count, 2);
        assert_eq!(result.ring[1], [2.0, 0.0]);
    }

    #[test]
    fn test_parse_coordinates_drops_altitude() {
        let ring = parse_coordinates("1.5,2.5,100\n\t3,4 5,6,7");
        assert_eq!(ring, vec![[1.5, 2.5], [3.0, 4.0], [5.0, 6.0]]);
    }
}
