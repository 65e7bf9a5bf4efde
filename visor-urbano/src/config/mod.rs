//! Configuration du visor
//!
//! Ordre de priorité : fichier JSON ou preset embarqué, puis variables
//! d'environnement (`apply_env_overrides`), puis options de la CLI.

use serde::{Deserialize, Serialize};
use std::path::Path;

use anyhow::{bail, Context, Result};

/// Configuration principale
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// URL de base du serveur cartographique (sans `/wfs` ni `/wms`)
    pub geoserver_url: String,

    /// Couche cadastrale interrogée pour les prédios
    pub parcel_layer: String,

    /// Colonne géométrique utilisée dans les filtres CQL
    #[serde(default = "default_geometry_column")]
    pub geometry_column: String,

    /// EPSG de la couche cadastrale
    pub local_epsg: u32,

    /// EPSG de la vue cartographique
    #[serde(default = "default_map_epsg")]
    pub map_epsg: u32,

    /// Marge autour du prédio pour la minicarte (mètres)
    #[serde(default = "default_buffer_meters")]
    pub buffer_meters: f64,

    /// Tolérance de simplification Douglas-Peucker (mètres)
    #[serde(default)]
    pub simplify_tolerance: f64,

    #[serde(default = "default_minimap_width")]
    pub minimap_width: u32,

    #[serde(default = "default_minimap_height")]
    pub minimap_height: u32,

    /// Timeout HTTP (secondes)
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,

    /// Couches affichables
    #[serde(default)]
    pub layers: Vec<LayerConfig>,
}

/// Couche WMS affichable
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LayerConfig {
    /// Nom qualifié (`workspace:couche`)
    pub name: String,

    /// Libellé affiché
    #[serde(default)]
    pub title: String,

    /// Visible au chargement
    #[serde(default)]
    pub visible: bool,
}

fn default_geometry_column() -> String {
    "geom".to_string()
}

fn default_map_epsg() -> u32 {
    3857
}

fn default_buffer_meters() -> f64 {
    50.0
}

fn default_minimap_width() -> u32 {
    400
}

fn default_minimap_height() -> u32 {
    300
}

fn default_timeout() -> u64 {
    30
}

impl Config {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: Self = serde_json::from_str(&content).context("Failed to parse config JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Charge une configuration depuis un preset embarqué
    pub fn from_preset(preset: &str) -> Result<Self> {
        match preset {
            "guadalajara" => Self::load_embedded(include_str!("presets/guadalajara.json")),
            _ => bail!("Unknown preset: {}. Use: guadalajara", preset),
        }
    }

    fn load_embedded(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse embedded config")
    }

    /// Applique `GEOSERVER_URL`, `VISOR_LOCAL_EPSG` et `VISOR_BUFFER_METERS`
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = var("GEOSERVER_URL") {
            self.geoserver_url = url;
        }
        if let Some(epsg) = var("VISOR_LOCAL_EPSG") {
            self.local_epsg = epsg
                .parse()
                .context(format!("VISOR_LOCAL_EPSG is not an EPSG code: {}", epsg))?;
        }
        if let Some(buffer) = var("VISOR_BUFFER_METERS") {
            self.buffer_meters = buffer
                .parse()
                .context(format!("VISOR_BUFFER_METERS is not a number: {}", buffer))?;
        }
        self.validate()
    }

    /// Vérifie la cohérence des valeurs
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.geoserver_url)
            .context(format!("Invalid geoserver_url: {}", self.geoserver_url))?;

        if !self.buffer_meters.is_finite() || self.buffer_meters < 0.0 {
            bail!("buffer_meters must be a positive number, got {}", self.buffer_meters);
        }
        if !self.simplify_tolerance.is_finite() || self.simplify_tolerance < 0.0 {
            bail!(
                "simplify_tolerance must be a positive number, got {}",
                self.simplify_tolerance
            );
        }
        if self.parcel_layer.is_empty() {
            bail!("parcel_layer must not be empty");
        }
        Ok(())
    }

    /// Noms des couches visibles au chargement
    pub fn visible_layers(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().filter(|l| l.visible).map(|l| l.name.as_str())
    }
}
