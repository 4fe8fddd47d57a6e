mod file_config;

pub use file_config::FileConfig;

use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

/// CLI arguments that participate in config resolution; mirrors the subset
/// of flags a TOML file can override.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding the SQLite database files.
    pub db_dir: PathBuf,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
}

impl AppConfig {
    /// Resolves configuration from CLI arguments and an optional TOML file.
    /// File values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in the config file")
            })?;
        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let logging_level = match file.logging_level {
            Some(raw) => RequestsLoggingLevel::from_str(&raw, true)
                .map_err(|_| anyhow::anyhow!("invalid logging_level in config file: {}", raw))?,
            None => cli.logging_level.clone(),
        };

        Ok(Self {
            db_dir,
            port: file.port.unwrap_or(cli.port),
            logging_level,
            frontend_dir_path: file.frontend_dir_path.or_else(|| cli.frontend_dir_path.clone()),
        })
    }

    pub fn users_db_path(&self) -> PathBuf {
        self.db_dir.join("users.db")
    }

    pub fn training_db_path(&self) -> PathBuf {
        self.db_dir.join("training.db")
    }
}
