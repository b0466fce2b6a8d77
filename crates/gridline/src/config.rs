//! Configuration management for the gridline server.
//!
//! This module handles loading, validation, and conversion of server
//! configuration from TOML files and command-line arguments.

use grid_server::ServerConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use tracing::info;

const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

fn default_max_connections() -> usize {
    ServerConfig::default().max_connections
}

fn default_max_line_length() -> usize {
    ServerConfig::default().max_line_length
}

fn default_outbound_queue_size() -> usize {
    ServerConfig::default().outbound_queue_size
}

/// Top-level contents of the configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// The `[server]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub bind_address: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,
    #[serde(default = "default_outbound_queue_size")]
    pub outbound_queue_size: usize,
}

/// The `[logging]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    #[serde(default)]
    pub json_format: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        let defaults = ServerConfig::default();
        Self {
            bind_address: defaults.bind_address.to_string(),
            max_connections: defaults.max_connections,
            max_line_length: defaults.max_line_length,
            outbound_queue_size: defaults.outbound_queue_size,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from `path`, writing a default file first if none
    /// exists.
    pub async fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("📝 Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Converts the file settings into the library's [`ServerConfig`].
    pub fn to_server_config(&self) -> Result<ServerConfig, Box<dyn std::error::Error>> {
        Ok(ServerConfig {
            bind_address: self.server.bind_address.parse()?,
            max_connections: self.server.max_connections,
            max_line_length: self.server.max_line_length,
            outbound_queue_size: self.server.outbound_queue_size,
        })
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.server.bind_address.parse::<SocketAddr>().is_err() {
            return Err(format!(
                "Invalid bind address: {}",
                &self.server.bind_address
            ));
        }

        if self.server.max_connections == 0 {
            return Err("server.max_connections must be greater than 0".to_string());
        }
        if self.server.max_line_length == 0 {
            return Err("server.max_line_length must be greater than 0".to_string());
        }
        if self.server.outbound_queue_size == 0 {
            return Err("server.outbound_queue_size must be greater than 0".to_string());
        }

        if !VALID_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {VALID_LEVELS:?}",
                &self.logging.level
            ));
        }

        Ok(())
    }
}
