mod file_config;

pub use file_config::{CompilerConfig, FileConfig};

use crate::compiler::CompilerDefaults;
use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub document_dir: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub public_base_url: Option<String>,
    pub external_timeout_sec: u64,
    pub external_cache_ttl_sec: u64,
    pub max_nesting_depth: usize,
    pub default_refresh_sec: u32,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub document_dir: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    /// Absolute prefix for URLs advertised inside documents.
    pub public_base_url: String,
    pub external_timeout_sec: u64,
    pub external_cache_ttl_sec: u64,
    pub max_nesting_depth: usize,
    pub default_refresh_sec: u32,

    pub compiler_defaults: CompilerDefaults,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let document_dir = file
            .document_dir
            .map(PathBuf::from)
            .or_else(|| cli.document_dir.clone())
            .unwrap_or_else(|| db_dir.join("documents"));

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let public_base_url = file
            .public_base_url
            .or_else(|| cli.public_base_url.clone())
            .unwrap_or_else(|| format!("http://localhost:{}", port));

        let external_timeout_sec = file
            .external_timeout_sec
            .unwrap_or(cli.external_timeout_sec);
        if external_timeout_sec == 0 {
            bail!("external_timeout_sec must be greater than zero");
        }
        let external_cache_ttl_sec = file
            .external_cache_ttl_sec
            .unwrap_or(cli.external_cache_ttl_sec);
        let max_nesting_depth = file.max_nesting_depth.unwrap_or(cli.max_nesting_depth);
        if max_nesting_depth == 0 {
            bail!("max_nesting_depth must be greater than zero");
        }
        let default_refresh_sec = file.default_refresh_sec.unwrap_or(cli.default_refresh_sec);

        let compiler_file = file.compiler.unwrap_or_default();
        let defaults = CompilerDefaults::default();
        let compiler_defaults = CompilerDefaults {
            fit: compiler_file.fit.unwrap_or(defaults.fit),
            media_align: compiler_file.media_align.unwrap_or(defaults.media_align),
            volume: compiler_file.volume.unwrap_or(defaults.volume),
            media_base_url: compiler_file
                .media_base_url
                .unwrap_or(defaults.media_base_url),
            template_base_url: compiler_file
                .template_base_url
                .unwrap_or(defaults.template_base_url),
        };
        if compiler_defaults.volume > 100 {
            bail!(
                "compiler.volume must be between 0 and 100, got {}",
                compiler_defaults.volume
            );
        }

        Ok(Self {
            db_dir,
            document_dir,
            port,
            metrics_port,
            logging_level,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            external_timeout_sec,
            external_cache_ttl_sec,
            max_nesting_depth,
            default_refresh_sec,
            compiler_defaults,
        })
    }

    pub fn playlist_db_path(&self) -> PathBuf {
        self.db_dir.join("playlists.db")
    }

    pub fn player_db_path(&self) -> PathBuf {
        self.db_dir.join("players.db")
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
