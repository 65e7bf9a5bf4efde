//! Construction des URLs OGC (WFS GetFeature, WMS GetMap/GetFeatureInfo)

use crate::config::Config;
use crate::projection::ProjectedPoint;
use geo::Rect;
use url::Url;

/// Taille en pixels de la fenêtre GetFeatureInfo autour du clic
const INFO_WINDOW_PX: u32 = 101;
/// Demi-largeur en unités carte de cette fenêtre
const INFO_HALF_WIDTH: f64 = 5.0;

/// Points d'accès du serveur cartographique
#[derive(Debug, Clone)]
pub struct ServiceEndpoints {
    wfs: Url,
    wms: Url,
    parcel_layer: String,
    local_epsg: u32,
    map_epsg: u32,
    minimap_size: (u32, u32),
}

/// Filtre d'une requête WFS
#[derive(Debug, Clone, Copy)]
pub enum FeatureFilter<'a> {
    /// `featureID=<id>`
    Id(&'a str),
    /// `CQL_FILTER=<expr>`
    Cql(&'a str),
}

impl ServiceEndpoints {
    pub fn from_config(config: &Config) -> Result<Self, url::ParseError> {
        let base = config.geoserver_url.trim_end_matches('/');
        Ok(Self {
            wfs: Url::parse(&format!("{}/wfs", base))?,
            wms: Url::parse(&format!("{}/wms", base))?,
            parcel_layer: config.parcel_layer.clone(),
            local_epsg: config.local_epsg,
            map_epsg: config.map_epsg,
            minimap_size: (config.minimap_width, config.minimap_height),
        })
    }

    pub fn local_epsg(&self) -> u32 {
        self.local_epsg
    }

    pub fn map_epsg(&self) -> u32 {
        self.map_epsg
    }

    fn wfs_get_feature(&self, output_format: &str, filter: FeatureFilter<'_>) -> Url {
        let mut url = self.wfs.clone();
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("service", "WFS")
                .append_pair("version", "1.0.0")
                .append_pair("request", "GetFeature")
                .append_pair("typeName", &self.parcel_layer)
                .append_pair("outputFormat", output_format)
                .append_pair("srsName", &format!("EPSG:{}", self.local_epsg));
            match filter {
                FeatureFilter::Id(id) => q.append_pair("featureID", id),
                FeatureFilter::Cql(cql) => q.append_pair("CQL_FILTER", cql),
            };
        }
        url
    }

    /// Requête des prédios en GeoJSON
    pub fn parcel_query(&self, cql_filter: &str) -> Url {
        self.wfs_get_feature("application/json", FeatureFilter::Cql(cql_filter))
    }

    /// Téléchargement du prédio en shapefile zippé
    pub fn download(&self, filter: FeatureFilter<'_>) -> Url {
        self.wfs_get_feature("SHAPE-ZIP", filter)
    }

    /// Minicarte PNG sur une emprise en projection locale
    pub fn minimap(&self, cql_filter: &str, bbox: &Rect) -> Url {
        let (width, height) = self.minimap_size;
        let mut url = self.wms.clone();
        url.query_pairs_mut()
            .append_pair("service", "WMS")
            .append_pair("version", "1.1.1")
            .append_pair("request", "GetMap")
            .append_pair("layers", &self.parcel_layer)
            .append_pair("styles", "")
            .append_pair("bbox", &bbox_param(bbox))
            .append_pair("width", &width.to_string())
            .append_pair("height", &height.to_string())
            .append_pair("srs", &format!("EPSG:{}", self.local_epsg))
            .append_pair("format", "image/png")
            .append_pair("transparent", "true")
            .append_pair("CQL_FILTER", cql_filter);
        url
    }

    /// GetFeatureInfo JSON pour un clic en projection carte
    pub fn feature_info(&self, layer: &str, click: &ProjectedPoint) -> Url {
        let bbox = Rect::new(
            (click.x - INFO_HALF_WIDTH, click.y - INFO_HALF_WIDTH),
            (click.x + INFO_HALF_WIDTH, click.y + INFO_HALF_WIDTH),
        );
        let center = (INFO_WINDOW_PX / 2).to_string();
        let size = INFO_WINDOW_PX.to_string();

        let mut url = self.wms.clone();
        url.query_pairs_mut()
            .append_pair("service", "WMS")
            .append_pair("version", "1.1.1")
            .append_pair("request", "GetFeatureInfo")
            .append_pair("layers", layer)
            .append_pair("query_layers", layer)
            .append_pair("styles", "")
            .append_pair("bbox", &bbox_param(&bbox))
            .append_pair("width", &size)
            .append_pair("height", &size)
            .append_pair("x", &center)
            .append_pair("y", &center)
            .append_pair("srs", &format!("EPSG:{}", click.epsg))
            .append_pair("INFO_FORMAT", "application/json")
            .append_pair("feature_count", "10");
        url
    }
}

/// `minx,miny,maxx,maxy`
fn bbox_param(rect: &Rect) -> String {
    format!(
        "{},{},{},{}",
        rect.min().x,
        rect.min().y,
        rect.max().x,
        rect.max().y
    )
}
