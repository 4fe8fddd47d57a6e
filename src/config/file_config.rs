use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Optional TOML config file. Every field overrides the matching CLI value
/// when present.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub db_dir: Option<String>,
    pub port: Option<u16>,
    pub logging_level: Option<String>,
    pub frontend_dir_path: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("parsing config file {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_partial_file() {
        let config: FileConfig = toml::from_str("port = 8080\nlogging_level = \"headers\"").unwrap();
        assert_eq!(config.port, Some(8080));
        assert_eq!(config.logging_level.as_deref(), Some("headers"));
        assert!(config.db_dir.is_none());
    }
}
