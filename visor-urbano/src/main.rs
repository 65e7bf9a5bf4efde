//! Point d'entrée CLI pour visor-urbano

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// Charger .env au démarrage
fn load_env() {
    // Chercher .env dans le répertoire courant ou parent
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;

use cli::{Commands, ConfigArgs};

/// Résoudre des propriétés cadastrales sur un serveur GeoServer
#[derive(Parser)]
#[command(name = "visor-urbano")]
#[command(author, version)]
#[command(about = "Résoudre des propriétés cadastrales et importer des polygones")]
#[command(long_about = "Outil du visor urbano : projections, import de polygones (GeoJSON, KML) et résolution de prédios via WFS/WMS.\n\nLa configuration vient d'un preset (guadalajara) ou d'un fichier JSON, surchargée par l'environnement puis par les options.")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    // Configurer le logging
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Parse { path } => {
            info!(path = %path.display(), "Import d'un fichier");
            cli::cmd_parse(&path)?;
        }
        Commands::Decode { token } => {
            cli::cmd_decode(&token)?;
        }
        Commands::Transform {
            point,
            epsg,
            inverse,
        } => {
            let config = cli::load_config(&cli.config)?;
            cli::cmd_transform(&config, &point, epsg, inverse)?;
        }
        Commands::Resolve {
            point,
            polygon,
            query,
            minimap,
        } => {
            let config = cli::load_config(&cli.config)?;
            let query = cli::build_query(point, polygon, query)?;
            cli::cmd_resolve(&config, query, minimap.as_deref()).await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // Logs sur stderr, la sortie JSON reste sur stdout
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
