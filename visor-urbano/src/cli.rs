//! Sous-commandes de la CLI

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use geoupload::{codec, UploadResult, UploadedFile};
use tracing::{info, warn};
use visor_urbano::geoserver::GeoServerClient;
use visor_urbano::projection::{GeographicPoint, ProjectionRegistry};
use visor_urbano::resolver::ResolveContext;
use visor_urbano::route::{load_property, QueryState};
use visor_urbano::Config;

#[derive(Subcommand)]
pub enum Commands {
    /// Extract the polygon of an uploaded file (GeoJSON or KML)
    Parse {
        /// Path to the uploaded file
        path: PathBuf,
    },

    /// Transform a point between WGS84 and a projected system
    Transform {
        /// Point as "lon lat" (or "x y" with --inverse)
        #[arg(long, allow_hyphen_values = true)]
        point: String,

        /// Projected EPSG code (défaut : local_epsg de la configuration)
        #[arg(long)]
        epsg: Option<u32>,

        /// Projected → WGS84 instead of WGS84 → projected
        #[arg(long)]
        inverse: bool,
    },

    /// Decode a polygon token from the `polygon` query parameter
    Decode {
        /// URL-safe base64 token
        token: String,
    },

    /// Resolve a property against the map server
    Resolve {
        /// Point as "lon lat" (WGS84)
        #[arg(long, allow_hyphen_values = true)]
        point: Option<String>,

        /// Polygon token (takes precedence over --point)
        #[arg(long)]
        polygon: Option<String>,

        /// Raw query string (`point=...&polygon=...`)
        #[arg(long, conflicts_with_all = ["point", "polygon"])]
        query: Option<String>,

        /// Save the minimap PNG to this path
        #[arg(long)]
        minimap: Option<PathBuf>,
    },
}

/// Options de configuration communes
#[derive(Args)]
pub struct ConfigArgs {
    /// Config preset name (guadalajara) or path to a JSON config
    #[arg(long, default_value = "guadalajara", global = true)]
    pub config: String,

    /// Map server base URL (défaut : env GEOSERVER_URL / configuration)
    #[arg(long, global = true)]
    pub geoserver_url: Option<String>,

    /// EPSG code of the cadastral layer (défaut : env VISOR_LOCAL_EPSG / configuration)
    #[arg(long, global = true)]
    pub local_epsg: Option<u32>,
}

/// Charge la configuration : preset ou fichier, puis env, puis CLI
pub fn load_config(args: &ConfigArgs) -> Result<Config> {
    let mut config = match args.config.as_str() {
        "guadalajara" => Config::from_preset(&args.config)?,
        path => Config::load(Path::new(path))?,
    };

    config.apply_env_overrides()?;

    if let Some(url) = &args.geoserver_url {
        config.geoserver_url = url.clone();
    }
    if let Some(epsg) = args.local_epsg {
        config.local_epsg = epsg;
    }
    config.validate()?;
    Ok(config)
}

/// Exécute la commande parse
pub fn cmd_parse(path: &Path) -> Result<()> {
    let content = std::fs::read(path).context(format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let result = geoupload::parse_uploaded_file(&UploadedFile::new(name, content));
    println!("{}", serde_json::to_string_pretty(&result)?);

    if let UploadResult::Error(failure) = result {
        bail!("{}", failure.message);
    }
    Ok(())
}

/// Exécute la commande transform
pub fn cmd_transform(config: &Config, point: &str, epsg: Option<u32>, inverse: bool) -> Result<()> {
    let epsg = epsg.unwrap_or(config.local_epsg);
    let mut registry = ProjectionRegistry::new();
    registry
        .register(epsg)
        .context(format!("Cannot use EPSG:{}", epsg))?;

    let (a, b) = parse_pair(point)?;
    if inverse {
        let geo = registry.to_geographic_from(a, b, epsg)?;
        info!(epsg, x = a, y = b, "Projeté → WGS84");
        println!("{} {}", geo.lon, geo.lat);
    } else {
        let projected = registry.to_projected(GeographicPoint::new(a, b), epsg)?;
        info!(epsg, lon = a, lat = b, "WGS84 → projeté");
        println!("{} {}", projected.x, projected.y);
    }
    Ok(())
}

/// Exécute la commande decode
pub fn cmd_decode(token: &str) -> Result<()> {
    let Some(ring) = codec::decode(token) else {
        bail!("Invalid polygon token");
    };
    println!("{}", serde_json::to_string_pretty(&ring)?);
    Ok(())
}

/// Exécute la commande resolve
pub async fn cmd_resolve(config: &Config, query: QueryState, minimap: Option<&Path>) -> Result<()> {
    if query.point.is_none() && query.polygon.is_none() {
        bail!("A point or a polygon is required (--point, --polygon or --query)");
    }

    let registry = ProjectionRegistry::with_defaults(config.local_epsg, config.map_epsg)
        .context(format!("Cannot use EPSG:{}", config.local_epsg))?;
    let client = GeoServerClient::new(config).context("Failed to create map server client")?;
    let ctx = ResolveContext::new(config, &registry, client.endpoints());

    info!(query = %query.to_query_string(), geoserver = %config.geoserver_url, "Résolution");

    let Some(view) = load_property(&client, &ctx, &query).await else {
        bail!("No property could be resolved for this query");
    };
    println!("{}", serde_json::to_string_pretty(&view)?);

    if let Some(path) = minimap {
        let url = url::Url::parse(&view.minimap_url)?;
        match client.fetch_minimap(&url).await {
            Ok(png) => {
                std::fs::write(path, &png).context(format!("Failed to write {}", path.display()))?;
                info!(path = %path.display(), bytes = png.len(), "Minicarte enregistrée");
            }
            Err(e) => warn!(error = %e, "Minicarte indisponible"),
        }
    }
    Ok(())
}

/// Construit l'état de route depuis les options de resolve
pub fn build_query(point: Option<String>, polygon: Option<String>, query: Option<String>) -> Result<QueryState> {
    if let Some(raw) = query {
        return Ok(QueryState::parse(&raw));
    }

    let point = point
        .map(|p| {
            GeographicPoint::parse_query_value(&p)
                .with_context(|| format!("Invalid point '{}', expected \"lon lat\"", p))
        })
        .transpose()?;

    Ok(QueryState {
        point,
        polygon,
        ..QueryState::default()
    })
}

/// Parse `"a b"` ou `"a,b"`
fn parse_pair(raw: &str) -> Result<(f64, f64)> {
    let parts: Vec<&str> = raw
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .collect();

    let [a, b] = parts.as_slice() else {
        bail!("Expected two numbers, got '{}'", raw);
    };
    let a: f64 = a.parse().context(format!("Invalid number: {}", a))?;
    let b: f64 = b.parse().context(format!("Invalid number: {}", b))?;
    Ok((a, b))
}
