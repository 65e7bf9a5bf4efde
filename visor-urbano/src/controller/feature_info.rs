//! Interrogation GetFeatureInfo de toutes les couches visibles
//!
//! Les requêtes partent ensemble et sont toutes attendues : une couche en
//! échec n'empêche pas l'affichage des autres.

use super::state::LayerInfo;
use crate::error::FetchError;
use crate::geoserver::FeatureInfoSource;
use crate::projection::ProjectedPoint;
use futures::future::join_all;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// Lance une requête par couche et regroupe les résultats par nom
pub async fn query_layers<S: FeatureInfoSource>(
    source: &S,
    layers: &[String],
    click: &ProjectedPoint,
) -> BTreeMap<String, LayerInfo> {
    let requests = layers.iter().map(|layer| async move {
        let result = source.get_feature_info(layer, click).await;
        (layer.clone(), to_layer_info(layer, result))
    });

    join_all(requests).await.into_iter().collect()
}

/// Au moins une couche a répondu sans erreur
pub fn has_results(results: &BTreeMap<String, LayerInfo>) -> bool {
    results.values().any(|info| !info.is_error())
}

fn to_layer_info(layer: &str, result: Result<Value, FetchError>) -> LayerInfo {
    match result {
        Ok(value) => match error_payload(&value) {
            Some(message) => {
                warn!(layer, error = %message, "GetFeatureInfo en erreur");
                LayerInfo::Error(message)
            }
            None => LayerInfo::Features(value),
        },
        Err(e) => {
            warn!(layer, error = %e, "GetFeatureInfo en échec");
            LayerInfo::Error(e.to_string())
        }
    }
}

/// Corps JSON signalant une erreur (`exceptions` ou `error`)
fn error_payload(value: &Value) -> Option<String> {
    if let Some(exceptions) = value.get("exceptions") {
        return Some(exceptions.to_string());
    }
    match value.get("error") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    }
}
