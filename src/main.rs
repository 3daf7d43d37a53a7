use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::{fmt::Debug, path::PathBuf};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use signage_index_server::compiler::{
    DocumentAssembler, HttpExternalSource, IndexCompiler, ItemCompiler, StoredContentSource,
    DEFAULT_MAX_DEPTH,
};
use signage_index_server::config::{AppConfig, CliConfig, FileConfig};
use signage_index_server::delivery::{IndexFileStore, IndexPublisher};
use signage_index_server::player_store::{PlayerLookup, SqlitePlayerStore};
use signage_index_server::playlist_store::SqlitePlaylistStore;
use signage_index_server::server::{self, run_server, RequestsLoggingLevel, ServerConfig};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to a TOML config file. Its values override the CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory holding playlists.db and players.db.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// Directory for the published per-player documents. Defaults to
    /// `<db-dir>/documents`.
    #[clap(long, value_parser = parse_path)]
    pub document_dir: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Absolute base URL players use to reach this server.
    #[clap(long)]
    pub public_base_url: Option<String>,

    /// Timeout in seconds for external playlist fetches.
    #[clap(long, default_value_t = 10)]
    pub external_timeout_sec: u64,

    /// Seconds an external playlist is served from cache before revalidation.
    #[clap(long, default_value_t = 60)]
    pub external_cache_ttl_sec: u64,

    /// Maximum playlist nesting depth before a subtree is dropped.
    #[clap(long, default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_nesting_depth: usize,

    /// Refresh interval advertised to players without their own setting.
    #[clap(long, default_value_t = 900)]
    pub default_refresh_sec: u32,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_dir: self.db_dir.clone(),
            document_dir: self.document_dir.clone(),
            port: self.port,
            metrics_port: self.metrics_port,
            logging_level: self.logging_level.clone(),
            public_base_url: self.public_base_url.clone(),
            external_timeout_sec: self.external_timeout_sec,
            external_cache_ttl_sec: self.external_cache_ttl_sec,
            max_nesting_depth: self.max_nesting_depth,
            default_refresh_sec: self.default_refresh_sec,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config file {:?}...", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    info!("Initializing metrics...");
    server::metrics::init_metrics();

    info!(
        "Opening SQLite playlist database at {:?}...",
        config.playlist_db_path()
    );
    let playlist_store = Arc::new(SqlitePlaylistStore::new(config.playlist_db_path())?);

    info!(
        "Opening SQLite player database at {:?}...",
        config.player_db_path()
    );
    let player_store = Arc::new(SqlitePlayerStore::new(config.player_db_path())?);

    let compiler = IndexCompiler::new(
        Arc::new(StoredContentSource::new(
            playlist_store,
            ItemCompiler::new(config.compiler_defaults.clone()),
        )),
        Arc::new(HttpExternalSource::new(
            config.external_timeout_sec,
            config.external_cache_ttl_sec,
        )?),
        DocumentAssembler::new(&config.public_base_url, config.default_refresh_sec),
        config.max_nesting_depth,
    );

    info!("Publishing documents to {:?}", config.document_dir);
    let publisher = IndexPublisher::new(
        PlayerLookup::new(player_store),
        compiler,
        IndexFileStore::new(&config.document_dir)?,
    );

    let server_config = ServerConfig {
        requests_logging_level: config.logging_level.clone(),
        port: config.port,
        metrics_port: config.metrics_port,
    };
    run_server(server_config, publisher).await
}
