/// Configuration management for proxysql-admin

use crate::core::Host;
pub use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use sqlx::mysql::MySqlConnectOptions;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Admin interface connection
    pub admin: AdminConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Desired backend servers, used by `apply`
    #[serde(default)]
    pub hosts: Vec<Host>,
}

/// Admin interface connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Pool size
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection
    pub connect_timeout_sec: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            admin: AdminConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            hosts: Vec::new(),
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6032,
            username: "admin".to_string(),
            password: "admin".to_string(),
            max_connections: 4,
            connect_timeout_sec: 5,
        }
    }
}

impl AdminConfig {
    pub fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .password(&self.password)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_sec)
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.admin.host.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "admin host cannot be empty".to_string(),
            ));
        }

        if self.admin.username.is_empty() {
            return Err(ConfigError::ValidationError(
                "admin username cannot be empty".to_string(),
            ));
        }

        if self.admin.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "max_connections must be greater than 0".to_string(),
            ));
        }

        if self.admin.connect_timeout_sec == 0 {
            return Err(ConfigError::ValidationError(
                "connect_timeout_sec must be greater than 0".to_string(),
            ));
        }

        match self.logging.level.as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            _ => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level: {}",
                    self.logging.level
                )))
            }
        }

        for host in &self.hosts {
            host.valid().map_err(|e| {
                ConfigError::ValidationError(format!("host {}:{}: {}", host.hostname, host.port, e))
            })?;
        }

        Ok(())
    }

    /// Create example configuration file
    pub fn create_example_config<P: AsRef<Path>>(path: P) -> Result<(), ConfigError> {
        let mut writer = Host::new("10.0.1.10", 3306).with_hostgroup_id(10);
        writer.comment = "writer".to_string();

        let mut reader = Host::new("10.0.1.11", 3306).with_hostgroup_id(20);
        reader.max_replication_lag = 10;
        reader.comment = "reader".to_string();

        let config = Config {
            hosts: vec![writer, reader],
            ..Default::default()
        };

        config.save_to_file(path)
    }
}
