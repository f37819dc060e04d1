//! Application configuration loaded from environment variables.

use std::path::PathBuf;

use serde::Deserialize;

use crate::measures::AllowList;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Store ===
    /// Path to the SQLite store produced by the importer.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Replacement allow-list of measure names (comma separated).
    #[serde(default)]
    pub allowed_measures: Option<Vec<String>>,

    // === Server Configuration ===
    /// Interface the HTTP server binds to.
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted request body, in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    // === Logging ===
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Emit logs as JSON lines.
    #[serde(default)]
    pub log_json: bool,

    /// Enable verbose logging.
    #[serde(default)]
    pub verbose: bool,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/data.db")
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            allowed_measures: None,
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
            rust_log: default_log_level(),
            log_json: false,
            verbose: false,
        }
    }
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.db_path.as_os_str().is_empty() {
            return Err("DB_PATH must not be empty".to_string());
        }

        if self.host.parse::<std::net::IpAddr>().is_err() {
            return Err(format!("HOST must be an IP address, got {:?}", self.host));
        }

        if self.max_body_bytes == 0 {
            return Err("MAX_BODY_BYTES must be positive".to_string());
        }

        if let Some(measures) = &self.allowed_measures {
            if measures.iter().all(|m| m.trim().is_empty()) {
                return Err("ALLOWED_MEASURES must name at least one measure".to_string());
            }
        }

        Ok(())
    }

    /// Build the measure allow-list, falling back to the built-in catalogue.
    pub fn allow_list(&self) -> AllowList {
        match &self.allowed_measures {
            Some(names) => AllowList::new(
                names
                    .iter()
                    .map(|name| name.trim())
                    .filter(|name| !name.is_empty()),
            ),
            None => AllowList::default(),
        }
    }
}
