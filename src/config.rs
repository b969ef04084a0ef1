//! Configuration management for Elektra
//!
//! This module handles loading, validation, and management of the integration
//! configuration from YAML files with environment variable overrides for the
//! secret-carrying fields.

use crate::error::{ElektraError, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_true() -> bool {
    true
}

fn default_refresh_interval() -> u64 {
    300
}

fn default_timezone() -> String {
    "Europe/Berlin".to_string()
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// OAuth2 client credentials for the Ostrom API
    pub credentials: CredentialsConfig,

    /// Postal code the price queries are scoped to; also the instance id
    pub zip_code: String,

    /// IANA timezone name used for calendar-day and current-hour math
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Upstream endpoint configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Seconds between host-driven refresh cycles
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// OAuth2 client-credentials pair
///
/// Opaque strings, immutable for the lifetime of the integration instance.
/// Presence is the only validation applied.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CredentialsConfig {
    /// OAuth2 client id
    pub client_id: String,

    /// OAuth2 client secret
    pub client_secret: String,
}

/// Upstream endpoint URLs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Token endpoint for the client-credentials exchange
    pub auth_url: String,

    /// Base URL for the pricing endpoints
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            auth_url: "https://auth.production.ostrom-api.io/oauth2/token".to_string(),
            base_url: "https://production.ostrom-api.io".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Optional console-specific level override
    #[serde(default)]
    pub console_level: Option<String>,

    /// Optional file-specific level override
    #[serde(default)]
    pub file_level: Option<String>,

    /// Path to log file (or directory for the rotated files)
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    #[serde(default = "default_true")]
    pub console_output: bool,

    /// Whether to use JSON format
    #[serde(default)]
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            console_level: None,
            file_level: None,
            file: "/tmp/elektra.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credentials: CredentialsConfig::default(),
            zip_code: String::new(),
            timezone: default_timezone(),
            api: ApiConfig::default(),
            refresh_interval_secs: default_refresh_interval(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from the default locations
    pub fn load() -> Result<Self> {
        if let Some(path) = std::env::var_os("ELEKTRA_CONFIG") {
            return Self::from_file(path);
        }

        let default_paths = [
            "elektra_config.yaml",
            "/data/elektra_config.yaml",
            "/etc/elektra/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        // Fall back to default configuration; env overrides may still
        // supply the credentials
        let mut config = Config::default();
        config.apply_env_overrides();
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Overlay secret-carrying fields from the environment
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("ELEKTRA_CLIENT_ID")
            && !v.is_empty()
        {
            self.credentials.client_id = v;
        }
        if let Ok(v) = std::env::var("ELEKTRA_CLIENT_SECRET")
            && !v.is_empty()
        {
            self.credentials.client_secret = v;
        }
        if let Ok(v) = std::env::var("ELEKTRA_ZIP_CODE")
            && !v.is_empty()
        {
            self.zip_code = v;
        }
    }

    /// Resolve the configured timezone name
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ElektraError::validation("timezone", &format!("Unknown timezone: {}", self.timezone)))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.credentials.client_id.is_empty() {
            return Err(ElektraError::validation(
                "credentials.client_id",
                "Client id cannot be empty",
            ));
        }

        if self.credentials.client_secret.is_empty() {
            return Err(ElektraError::validation(
                "credentials.client_secret",
                "Client secret cannot be empty",
            ));
        }

        if self.zip_code.is_empty() {
            return Err(ElektraError::validation(
                "zip_code",
                "Zip code cannot be empty",
            ));
        }

        self.tz()?;

        if self.refresh_interval_secs == 0 {
            return Err(ElektraError::validation(
                "refresh_interval_secs",
                "Must be greater than 0",
            ));
        }

        if self.api.auth_url.is_empty() || self.api.base_url.is_empty() {
            return Err(ElektraError::validation(
                "api",
                "Endpoint URLs cannot be empty",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated() -> Config {
        let mut config = Config::default();
        config.credentials.client_id = "id".to_string();
        config.credentials.client_secret = "secret".to_string();
        config.zip_code = "10115".to_string();
        config
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.refresh_interval_secs, 300);
        assert_eq!(config.timezone, "Europe/Berlin");
        assert!(config.api.base_url.contains("ostrom-api.io"));
    }

    #[test]
    fn test_config_validation() {
        let config = populated();
        assert!(config.validate().is_ok());

        // Missing credentials
        let mut config = populated();
        config.credentials.client_id = String::new();
        assert!(config.validate().is_err());

        // Unknown timezone
        let mut config = populated();
        config.timezone = "Mars/Olympus_Mons".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = populated();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let deserialized: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config.zip_code, deserialized.zip_code);
        assert_eq!(config.api.auth_url, deserialized.api.auth_url);
    }

    #[test]
    fn test_timezone_resolution() {
        let config = populated();
        assert_eq!(config.tz().unwrap(), chrono_tz::Europe::Berlin);
    }
}
