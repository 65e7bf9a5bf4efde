//! Contrôleur d'interaction de la carte
//!
//! Porte l'état ([`MapInteractionState`]) et traite les clics selon l'outil
//! actif : sélection d'un point, interrogation des couches, dessin, mesure.
//! Gère aussi l'import de fichiers à l'étape de sélection.

pub mod feature_info;
pub mod state;

pub use state::{LayerInfo, MapAction, MapInteractionState, Mode, Tool, UploadStep};

use crate::config::Config;
use crate::error::ProjectionError;
use crate::geoserver::FeatureInfoSource;
use crate::projection::{GeographicPoint, ProjectedPoint, ProjectionRegistry};
use geo::{HaversineLength, LineString};
use geoupload::{codec, UploadResult, UploadedFile};
use tracing::{debug, info, warn};

/// Effet d'un clic sur la carte
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// Outil sélection : point en attente et valeur du paramètre `point`
    PendingPoint {
        point: GeographicPoint,
        query_value: String,
    },
    /// Outil information : le dialogue s'est-il ouvert ?
    FeatureInfo { opened: bool, layers: usize },
    /// Outil dessin : nombre de sommets du brouillon
    DraftVertex { vertices: usize },
    /// Outil mesure : longueur cumulée en mètres
    Measure { length_m: f64 },
}

/// Contrôleur de la carte
pub struct MapController<S> {
    state: MapInteractionState,
    registry: ProjectionRegistry,
    source: S,
    map_epsg: u32,
}

impl<S: FeatureInfoSource> MapController<S> {
    pub fn new(config: &Config, registry: ProjectionRegistry, source: S) -> Self {
        Self {
            state: MapInteractionState::new(&config.layers),
            registry,
            source,
            map_epsg: config.map_epsg,
        }
    }

    pub fn state(&self) -> &MapInteractionState {
        &self.state
    }

    pub fn registry(&self) -> &ProjectionRegistry {
        &self.registry
    }

    /// Applique une action au réducteur
    pub fn dispatch(&mut self, action: MapAction) {
        let state = std::mem::take(&mut self.state);
        self.state = state.reduce(action);
    }

    /// Traite un clic en coordonnées carte
    pub async fn handle_click(&mut self, x: f64, y: f64) -> Result<ClickOutcome, ProjectionError> {
        let click = ProjectedPoint::new(x, y, self.map_epsg);

        if self.state.is_info_active() {
            return Ok(self.query_feature_info(&click).await);
        }

        let point = self.registry.to_geographic(click)?;
        let outcome = match self.state.tool {
            Tool::Select => {
                self.dispatch(MapAction::SetPendingPoint(Some(point)));
                ClickOutcome::PendingPoint {
                    point,
                    query_value: point.to_query_value(),
                }
            }
            Tool::Draw => {
                self.dispatch(MapAction::AddDraftVertex(point));
                ClickOutcome::DraftVertex {
                    vertices: self.state.draft.len(),
                }
            }
            Tool::Measure => {
                self.dispatch(MapAction::AddMeasureVertex(point));
                ClickOutcome::Measure {
                    length_m: self.measurement_length(),
                }
            }
            // is_info_active couvre déjà ce cas
            Tool::Info => return Ok(self.query_feature_info(&click).await),
        };

        debug!(?outcome, "Clic traité");
        Ok(outcome)
    }

    async fn query_feature_info(&mut self, click: &ProjectedPoint) -> ClickOutcome {
        let layers = self.state.visible_layers();
        let results = feature_info::query_layers(&self.source, &layers, click).await;
        let opened = feature_info::has_results(&results);

        if opened {
            self.dispatch(MapAction::ShowFeatureInfo(results));
        } else {
            info!(layers = layers.len(), "Aucune couche n'a répondu, dialogue non ouvert");
        }

        ClickOutcome::FeatureInfo {
            opened,
            layers: layers.len(),
        }
    }

    /// Termine le dessin : encode le brouillon s'il a au moins 3 sommets
    pub fn finish_drawing(&mut self) -> Option<String> {
        if self.state.draft.len() < 3 {
            warn!(vertices = self.state.draft.len(), "Dessin trop court, ignoré");
            return None;
        }

        let ring: Vec<[f64; 2]> = self.state.draft.iter().map(|p| p.to_pair()).collect();
        let token = codec::encode(&ring);
        self.dispatch(MapAction::PolygonDrawn(token.clone()));
        Some(token)
    }

    /// Longueur géodésique du tracé de mesure (mètres)
    pub fn measurement_length(&self) -> f64 {
        let line: LineString = self
            .state
            .measurement
            .iter()
            .map(|p| geo::Coord::from(*p))
            .collect();
        line.haversine_length()
    }

    /// Importe un fichier ; refusé hors de l'étape de sélection
    pub fn upload_file(&mut self, file: &UploadedFile) -> Option<UploadResult> {
        if !self.state.upload_dialog_open || self.state.upload_step != UploadStep::FileSelection {
            warn!(file = %file.name, step = ?self.state.upload_step, "Import hors étape de sélection");
            return None;
        }

        self.dispatch(MapAction::UploadStarted);
        let result = geoupload::parse_uploaded_file(file);

        match &result {
            UploadResult::Success(success) => self.dispatch(MapAction::UploadSucceeded(success.clone())),
            UploadResult::Error(failure) => self.dispatch(MapAction::UploadFailed(failure.clone())),
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayerConfig;
    use crate::error::FetchError;
    use serde_json::{json, Value};
    use std::future::Future;

    /// Source en mémoire : les couches listées échouent
    struct FakeSource {
        failing: Vec<&'static str>,
    }

    impl FeatureInfoSource for FakeSource {
        fn get_feature_info(
            &self,
            layer: &str,
            _click: &ProjectedPoint,
        ) -> impl Future<Output = Result<Value, FetchError>> + Send {
            let fails = self.failing.iter().any(|f| *f == layer);
            let layer = layer.to_string();
            async move {
                if fails {
                    Err(FetchError::Status {
                        url: format!("http://localhost/wms?layers={}", layer),
                        status: 500,
                    })
                } else {
                    Ok(json!({"type": "FeatureCollection", "features": [{"id": layer}]}))
                }
            }
        }
    }

    fn controller(failing: Vec<&'static str>) -> MapController<FakeSource> {
        let mut config = Config::from_preset("guadalajara").unwrap();
        config.layers = ["predios", "zonificacion", "vialidades"]
            .into_iter()
            .map(|name| LayerConfig {
                name: name.to_string(),
                title: name.to_string(),
                visible: true,
            })
            .collect();
        let registry = ProjectionRegistry::with_defaults(config.local_epsg, config.map_epsg).unwrap();
        MapController::new(&config, registry, FakeSource { failing })
    }

    // Guadalajara en Web Mercator
    const CLICK: (f64, f64) = (-11_504_869.37, 2_351_383.09);

    #[tokio::test]
    async fn test_partial_layer_failure() {
        let mut c = controller(vec!["zonificacion"]);
        c.dispatch(MapAction::SetMode(Mode::Info));

        let outcome = c.handle_click(CLICK.0, CLICK.1).await.unwrap();
        assert_eq!(
            outcome,
            ClickOutcome::FeatureInfo {
                opened: true,
                layers: 3
            }
        );

        let results = c.state().feature_info.as_ref().unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results.values().filter(|r| !r.is_error()).count(), 2);
        assert!(results["zonificacion"].is_error());
        assert!(matches!(&results["predios"], LayerInfo::Features(_)));
    }

    #[tokio::test]
    async fn test_all_layers_fail() {
        let mut c = controller(vec!["predios", "zonificacion", "vialidades"]);
        c.dispatch(MapAction::SetTool(Tool::Info));

        let outcome = c.handle_click(CLICK.0, CLICK.1).await.unwrap();
        assert_eq!(
            outcome,
            ClickOutcome::FeatureInfo {
                opened: false,
                layers: 3
            }
        );
        assert!(c.state().feature_info.is_none());
    }

    #[tokio::test]
    async fn test_select_stores_pending_point() {
        let mut c = controller(vec![]);
        let outcome = c.handle_click(CLICK.0, CLICK.1).await.unwrap();

        let ClickOutcome::PendingPoint { point, query_value } = outcome else {
            panic!("expected a pending point, got {:?}", outcome);
        };
        assert!((point.lon - (-103.35)).abs() < 1e-6, "lon={}", point.lon);
        assert!((point.lat - 20.66).abs() < 1e-6, "lat={}", point.lat);
        assert_eq!(c.state().pending_point, Some(point));

        let (lon, lat) = query_value.split_once(' ').unwrap();
        assert!((lon.parse::<f64>().unwrap() - (-103.35)).abs() < 1e-6);
        assert!((lat.parse::<f64>().unwrap() - 20.66).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_draw_then_finish() {
        let mut c = controller(vec![]);
        c.dispatch(MapAction::SetTool(Tool::Draw));

        for (dx, dy) in [(0.0, 0.0), (50.0, 0.0), (50.0, 50.0)] {
            c.handle_click(CLICK.0 + dx, CLICK.1 + dy).await.unwrap();
        }
        assert_eq!(c.state().draft.len(), 3);

        let token = c.finish_drawing().unwrap();
        let ring = codec::decode(&token).unwrap();
        assert_eq!(ring.len(), 3);
        assert!(c.state().draft.is_empty());
        assert_eq!(c.state().polygon_token.as_deref(), Some(token.as_str()));
    }

    #[test]
    fn test_finish_drawing_too_short() {
        let mut c = controller(vec![]);
        c.dispatch(MapAction::AddDraftVertex(GeographicPoint::new(-103.35, 20.66)));
        assert_eq!(c.finish_drawing(), None);
    }

    #[tokio::test]
    async fn test_measure() {
        let mut c = controller(vec![]);
        c.dispatch(MapAction::SetTool(Tool::Measure));

        c.handle_click(CLICK.0, CLICK.1).await.unwrap();
        // ~1 km vers l'est en Web Mercator (échelle 1/cos(lat))
        let outcome = c.handle_click(CLICK.0 + 1069.0, CLICK.1).await.unwrap();

        let ClickOutcome::Measure { length_m } = outcome else {
            panic!("expected a measure, got {:?}", outcome);
        };
        assert!((length_m - 1000.0).abs() < 10.0, "length={}", length_m);
    }

    #[test]
    fn test_upload_only_at_file_selection() {
        let mut c = controller(vec![]);
        let file = UploadedFile::new("predio.kmz", b"PK".to_vec());

        assert_eq!(c.upload_file(&file), None);

        c.dispatch(MapAction::OpenUpload);
        assert_eq!(c.upload_file(&file), None);

        c.dispatch(MapAction::AcceptDisclaimer);
        let result = c.upload_file(&file).unwrap();
        assert_eq!(result.failure().unwrap().message, "KMZ files not fully supported");
        assert!(c.state().upload_dialog_open);
        assert!(c.state().upload_error.is_some());
    }

    #[test]
    fn test_upload_success_closes_dialog() {
        let mut c = controller(vec![]);
        c.dispatch(MapAction::OpenUpload);
        c.dispatch(MapAction::AcceptDisclaimer);

        let geojson = r#"{"type":"Feature","properties":{},"geometry":{"type":"Polygon",
            "coordinates":[[[-103.35,20.66],[-103.34,20.66],[-103.34,20.67],[-103.35,20.66]]]}}"#;
        let file = UploadedFile::new("predio.geojson", geojson.as_bytes().to_vec());

        let result = c.upload_file(&file).unwrap();
        assert!(result.is_success());
        assert!(!c.state().upload_dialog_open);
        assert_eq!(c.state().upload_step, UploadStep::Disclaimer);
        assert!(c.state().polygon_token.is_some());
    }
}
