//! Client du serveur cartographique (GeoServer WFS/WMS)
//!
//! Chaque appel retourne `Result<_, FetchError>` : un échec réseau, un code
//! HTTP d'erreur et un rapport d'exception OGC restent distinguables d'une
//! réponse vide.

pub mod filter;
pub mod urls;

pub use urls::{FeatureFilter, ServiceEndpoints};

use crate::config::Config;
use crate::error::FetchError;
use crate::projection::ProjectedPoint;
use bytes::Bytes;
use regex::Regex;
use serde_json::Value;
use std::future::Future;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Source des réponses GetFeatureInfo
///
/// Implémentée par [`GeoServerClient`] ; les tests du contrôleur en
/// fournissent une version en mémoire.
pub trait FeatureInfoSource {
    fn get_feature_info(
        &self,
        layer: &str,
        click: &ProjectedPoint,
    ) -> impl Future<Output = Result<Value, FetchError>> + Send;
}

/// Source des prédios (WFS GetFeature filtré en CQL)
pub trait ParcelSource {
    fn query_parcels(&self, cql_filter: &str) -> impl Future<Output = Result<Value, FetchError>> + Send;
}

/// Client HTTP du serveur cartographique
#[derive(Debug, Clone)]
pub struct GeoServerClient {
    http: reqwest::Client,
    endpoints: ServiceEndpoints,
}

impl GeoServerClient {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(FetchError::Client)?;
        let endpoints = ServiceEndpoints::from_config(config)?;
        Ok(Self { http, endpoints })
    }

    pub fn endpoints(&self) -> &ServiceEndpoints {
        &self.endpoints
    }

    /// Télécharge l'image PNG d'une minicarte
    pub async fn fetch_minimap(&self, url: &Url) -> Result<Bytes, FetchError> {
        let response = self.send(url.clone()).await?;

        let is_image = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("image/"));

        let body = response.bytes().await.map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;

        if !is_image {
            let text = String::from_utf8_lossy(&body);
            return Err(match ogc_exception(&text) {
                Some(message) => FetchError::ServiceException(message),
                None => FetchError::Decode("expected an image response".to_string()),
            });
        }
        Ok(body)
    }

    async fn send(&self, url: Url) -> Result<reqwest::Response, FetchError> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "Réponse HTTP en erreur");
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn get_json(&self, url: Url) -> Result<Value, FetchError> {
        let response = self.send(url.clone()).await?;
        let text = response.text().await.map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;
        parse_json_body(&text)
    }
}

impl ParcelSource for GeoServerClient {
    /// WFS GetFeature JSON sur la couche cadastrale
    fn query_parcels(&self, cql_filter: &str) -> impl Future<Output = Result<Value, FetchError>> + Send {
        let url = self.endpoints.parcel_query(cql_filter);
        debug!(filter = cql_filter, "Requête prédios");
        async move { self.get_json(url).await }
    }
}

impl FeatureInfoSource for GeoServerClient {
    fn get_feature_info(
        &self,
        layer: &str,
        click: &ProjectedPoint,
    ) -> impl Future<Output = Result<Value, FetchError>> + Send {
        let url = self.endpoints.feature_info(layer, click);
        async move { self.get_json(url).await }
    }
}

/// Décode un corps JSON en détectant les rapports d'exception
pub fn parse_json_body(text: &str) -> Result<Value, FetchError> {
    if text.trim_start().starts_with('<') {
        return Err(match ogc_exception(text) {
            Some(message) => FetchError::ServiceException(message),
            None => FetchError::Decode("expected JSON, got XML".to_string()),
        });
    }

    let value: Value = serde_json::from_str(text).map_err(|e| FetchError::Decode(e.to_string()))?;

    // Format JSON des exceptions GeoServer
    if let Some(exceptions) = value.get("exceptions").and_then(Value::as_array) {
        let message = exceptions
            .iter()
            .filter_map(|e| e.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("; ");
        return Err(FetchError::ServiceException(message));
    }

    Ok(value)
}

static EXCEPTION_TEXT: OnceLock<Option<Regex>> = OnceLock::new();

/// Extrait le message d'un `ServiceExceptionReport` ou `ows:ExceptionReport`
pub fn ogc_exception(body: &str) -> Option<String> {
    if !body.contains("Exception") {
        return None;
    }

    let re = EXCEPTION_TEXT
        .get_or_init(|| {
            Regex::new(r"(?s)<(?:\w+:)?(?:ServiceException|ExceptionText)\b[^>]*>(.*?)</").ok()
        })
        .as_ref()?;

    let message = re
        .captures_iter(body)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("; ");

    Some(if message.is_empty() {
        "unknown service exception".to_string()
    } else {
        message
    })
}
