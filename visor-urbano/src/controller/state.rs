//! État d'interaction de la carte et son réducteur
//!
//! `reduce` consomme l'état et retourne le suivant par mise à jour champ par
//! champ (`..self`) : les collections ne sont jamais clonées, seulement
//! déplacées ou remplacées.

use crate::config::LayerConfig;
use crate::projection::GeographicPoint;
use crate::resolver::PropertyView;
use geoupload::{UploadFailure, UploadSuccess};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Outil actif sur la carte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tool {
    #[default]
    Select,
    Draw,
    Measure,
    Info,
}

/// Mode du panneau latéral
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    #[default]
    Layers,
    Measure,
    Upload,
    Info,
}

/// Étape de l'assistant d'import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UploadStep {
    #[default]
    Disclaimer,
    FileSelection,
}

/// Résultat GetFeatureInfo d'une couche
#[derive(Debug, Clone, PartialEq)]
pub enum LayerInfo {
    Features(Value),
    /// Marqueur d'échec affiché à la place des résultats
    Error(String),
}

impl LayerInfo {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// Actions du réducteur
#[derive(Debug, Clone)]
pub enum MapAction {
    SetMode(Mode),
    SetTool(Tool),
    SetPendingPoint(Option<GeographicPoint>),
    ToggleLayer(String),
    ToggleShowMapControls,
    OpenUpload,
    AcceptDisclaimer,
    CancelUpload,
    UploadStarted,
    UploadSucceeded(UploadSuccess),
    UploadFailed(UploadFailure),
    ShowFeatureInfo(BTreeMap<String, LayerInfo>),
    CloseFeatureInfo,
    ParcelQueryIssued,
    ParcelResolved {
        generation: u64,
        view: Option<PropertyView>,
    },
    AddDraftVertex(GeographicPoint),
    ClearDraft,
    /// Dessin terminé : jeton du polygone
    PolygonDrawn(String),
    AddMeasureVertex(GeographicPoint),
    ClearMeasure,
}

/// État transitoire de la page carte
#[derive(Debug, Clone, Default)]
pub struct MapInteractionState {
    pub tool: Tool,
    pub mode: Mode,
    pub upload_step: UploadStep,
    pub upload_dialog_open: bool,
    pub upload_processing: bool,
    pub upload_error: Option<UploadFailure>,
    /// Jeton du polygone sélectionné (paramètre `polygon`)
    pub polygon_token: Option<String>,
    pub pending_point: Option<GeographicPoint>,
    /// Visibilité par nom de couche
    pub layers: BTreeMap<String, bool>,
    pub show_map_controls: bool,
    /// Dialogue d'information, ouvert si `Some`
    pub feature_info: Option<BTreeMap<String, LayerInfo>>,
    pub draft: Vec<GeographicPoint>,
    pub measurement: Vec<GeographicPoint>,
    /// Génération de la dernière requête de prédio émise
    pub parcel_generation: u64,
    pub property: Option<PropertyView>,
}

impl MapInteractionState {
    pub fn new(layers: &[LayerConfig]) -> Self {
        Self {
            layers: layers.iter().map(|l| (l.name.clone(), l.visible)).collect(),
            show_map_controls: true,
            ..Self::default()
        }
    }

    /// L'outil d'information est armé
    pub fn is_info_active(&self) -> bool {
        self.tool == Tool::Info || self.mode == Mode::Info
    }

    pub fn visible_layers(&self) -> Vec<String> {
        self.layers
            .iter()
            .filter(|(_, visible)| **visible)
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn reduce(self, action: MapAction) -> Self {
        match action {
            MapAction::SetMode(mode) => Self {
                mode,
                tool: if mode == Mode::Info { Tool::Info } else { self.tool },
                ..self
            },
            MapAction::SetTool(tool) => Self { tool, ..self },
            MapAction::SetPendingPoint(pending_point) => Self {
                pending_point,
                ..self
            },
            MapAction::ToggleLayer(name) => {
                let mut layers = self.layers;
                let visible = layers.entry(name).or_insert(false);
                *visible = !*visible;
                Self { layers, ..self }
            }
            MapAction::ToggleShowMapControls => Self {
                show_map_controls: !self.show_map_controls,
                ..self
            },
            MapAction::OpenUpload => Self {
                upload_dialog_open: true,
                upload_step: UploadStep::Disclaimer,
                mode: Mode::Upload,
                ..self
            },
            MapAction::AcceptDisclaimer => {
                if !self.upload_dialog_open || self.upload_step != UploadStep::Disclaimer {
                    debug!(
                        step = ?self.upload_step,
                        open = self.upload_dialog_open,
                        "Avertissement hors assistant ignoré"
                    );
                    return self;
                }
                Self {
                    upload_step: UploadStep::FileSelection,
                    ..self
                }
            }
            MapAction::CancelUpload => Self {
                upload_dialog_open: false,
                upload_step: UploadStep::Disclaimer,
                upload_processing: false,
                upload_error: None,
                ..self
            },
            MapAction::UploadStarted => Self {
                upload_processing: true,
                upload_error: None,
                ..self
            },
            MapAction::UploadSucceeded(success) => Self {
                upload_dialog_open: false,
                upload_step: UploadStep::Disclaimer,
                upload_processing: false,
                upload_error: None,
                polygon_token: Some(success.polygon_base64),
                ..self
            },
            MapAction::UploadFailed(failure) => Self {
                upload_processing: false,
                upload_error: Some(failure),
                ..self
            },
            MapAction::ShowFeatureInfo(results) => Self {
                feature_info: Some(results),
                ..self
            },
            MapAction::CloseFeatureInfo => Self {
                feature_info: None,
                ..self
            },
            MapAction::ParcelQueryIssued => Self {
                parcel_generation: self.parcel_generation + 1,
                ..self
            },
            MapAction::ParcelResolved { generation, view } => {
                if generation != self.parcel_generation {
                    debug!(
                        generation,
                        latest = self.parcel_generation,
                        "Réponse de prédio périmée ignorée"
                    );
                    return self;
                }
                Self {
                    property: view,
                    ..self
                }
            }
            MapAction::AddDraftVertex(point) => {
                let mut draft = self.draft;
                draft.push(point);
                Self { draft, ..self }
            }
            MapAction::ClearDraft => Self {
                draft: Vec::new(),
                ..self
            },
            MapAction::PolygonDrawn(token) => Self {
                polygon_token: Some(token),
                draft: Vec::new(),
                ..self
            },
            MapAction::AddMeasureVertex(point) => {
                let mut measurement = self.measurement;
                measurement.push(point);
                Self {
                    measurement,
                    ..self
                }
            }
            MapAction::ClearMeasure => Self {
                measurement: Vec::new(),
                ..self
            },
        }
    }
}
