use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub db_dir: Option<String>,
    pub document_dir: Option<String>,
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,
    pub public_base_url: Option<String>,
    pub external_timeout_sec: Option<u64>,
    pub external_cache_ttl_sec: Option<u64>,
    pub max_nesting_depth: Option<usize>,
    pub default_refresh_sec: Option<u32>,

    pub compiler: Option<CompilerConfig>,
}

/// Item defaults applied when a playlist item leaves them unset.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct CompilerConfig {
    pub fit: Option<String>,
    pub media_align: Option<String>,
    pub volume: Option<u8>,
    pub media_base_url: Option<String>,
    pub template_base_url: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_compiler_table() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
port = 8080
public_base_url = "https://signage.example.com"

[compiler]
fit = "fill"
volume = 40
"#
        )
        .unwrap();

        let config = FileConfig::load(file.path()).unwrap();
        assert_eq!(config.port, Some(8080));
        assert_eq!(
            config.public_base_url.as_deref(),
            Some("https://signage.example.com")
        );
        let compiler = config.compiler.unwrap();
        assert_eq!(compiler.fit.as_deref(), Some("fill"));
        assert_eq!(compiler.volume, Some(40));
        assert!(compiler.media_align.is_none());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = \"not a number\"").unwrap();
        let err = FileConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
