//! Configuration management for Rota
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (ROTA_*)
//! 3. Config file (~/.config/rota/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};
use std::time::Duration;

use humantime_serde::re::humantime;
use rota_db::DatabaseConfig;
use serde::{Deserialize, Serialize};

use crate::assignment::RandomPicker;
use crate::{Error, Result};

/// Store settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Path to the SQLite file; defaults to ~/.cache/rota/rota.db
    pub path: Option<PathBuf>,

    /// Maximum pooled connections
    pub max_connections: u32,

    /// How long a writer waits on a locked database
    #[serde(with = "humantime_serde")]
    pub busy_timeout: Duration,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: None,
            max_connections: 5,
            busy_timeout: Duration::from_secs(30),
        }
    }
}

/// Reviewer selection settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Seed for the candidate picker; unseeded when absent
    pub seed: Option<u64>,
}

/// Per-operation limits
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct OperationsConfig {
    /// Deadline after which a running operation is cancelled
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseSettings,
    pub selection: SelectionConfig,
    pub operations: OperationsConfig,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        match Self::default_config_path() {
            Some(path) if path.exists() => Self::load_from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/rota/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("rota").join("config.toml"))
    }

    /// Apply environment variable overrides from the process environment
    ///
    /// Supported variables:
    /// - ROTA_DB_PATH_FILE: file whose trimmed contents are the database path
    /// - ROTA_DB_PATH: database path (ignored when ROTA_DB_PATH_FILE is set)
    /// - ROTA_SEED: picker seed
    /// - ROTA_OPERATION_TIMEOUT: operation deadline, e.g. "30s"
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(file) = lookup("ROTA_DB_PATH_FILE") {
            let path = std::fs::read_to_string(&file).map_err(|e| {
                Error::Config(format!("Failed to read ROTA_DB_PATH_FILE {}: {}", file, e))
            })?;
            self.database.path = Some(PathBuf::from(path.trim()));
        } else if let Some(path) = lookup("ROTA_DB_PATH") {
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(seed) = lookup("ROTA_SEED") {
            let seed = seed
                .parse()
                .map_err(|e| Error::Config(format!("Invalid ROTA_SEED {:?}: {}", seed, e)))?;
            self.selection.seed = Some(seed);
        }

        if let Some(timeout) = lookup("ROTA_OPERATION_TIMEOUT") {
            let timeout = humantime::parse_duration(&timeout).map_err(|e| {
                Error::Config(format!("Invalid ROTA_OPERATION_TIMEOUT {:?}: {}", timeout, e))
            })?;
            self.operations.timeout = Some(timeout);
        }

        Ok(self)
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, db_path: Option<PathBuf>, seed: Option<u64>) -> Self {
        if let Some(path) = db_path {
            self.database.path = Some(path);
        }

        if let Some(seed) = seed {
            self.selection.seed = Some(seed);
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(
        config_file: Option<&Path>,
        db_path: Option<PathBuf>,
        seed: Option<u64>,
    ) -> Result<Self> {
        let base = match config_file {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load()?,
        };

        Ok(base.with_env_overrides()?.with_cli_overrides(db_path, seed))
    }

    /// Store configuration derived from these settings
    pub fn database_config(&self) -> DatabaseConfig {
        let base = match &self.database.path {
            Some(path) => DatabaseConfig::new(path),
            None => DatabaseConfig::default(),
        };

        base.with_max_connections(self.database.max_connections)
            .with_busy_timeout(self.database.busy_timeout)
    }

    /// Candidate picker configured by these settings
    pub fn picker(&self) -> RandomPicker {
        match self.selection.seed {
            Some(seed) => RandomPicker::seeded(seed),
            None => RandomPicker::new(),
        }
    }
}
