//! Configuration file handling
//!
//! The config file is a JSON object; every field is optional:
//!
//! ```json
//! {
//!   "catalog_path": "./catalog_data.json",
//!   "seed_demo": false,
//!   "pretty_export": true,
//!   "log_level": "warn"
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::{CliError, CliResult};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Catalog data file
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Seed the demo records when `init` creates the data file
    #[serde(default)]
    pub seed_demo: bool,

    /// Indent JSON written to data and export files
    #[serde(default = "default_pretty_export")]
    pub pretty_export: bool,

    /// Log filter used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_catalog_path() -> String {
    "./catalog_data.json".to_string()
}
fn default_pretty_export() -> bool {
    true
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            seed_demo: false,
            pretty_export: default_pretty_export(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Load from `path` if given, otherwise use defaults
    pub fn resolve(path: Option<&Path>) -> CliResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> CliResult<()> {
        if self.catalog_path.trim().is_empty() {
            return Err(CliError::config_error("catalog_path must not be empty"));
        }

        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(CliError::config_error(format!(
                "Invalid log_level: '{}'. Expected one of {}.",
                self.log_level,
                LOG_LEVELS.join(", ")
            )));
        }

        Ok(())
    }

    /// Get the data file as Path
    pub fn catalog_path(&self) -> &Path {
        Path::new(&self.catalog_path)
    }
}
