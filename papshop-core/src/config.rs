//! Configuration management for the admin console
//!
//! Config files are stored in platform-appropriate locations:
//! - Linux: ~/.config/papshop/
//! - macOS: ~/Library/Application Support/papshop/
//! - Windows: %APPDATA%\papshop\

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    NoDirFound,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Session persistence
    #[serde(default)]
    pub session: SessionConfig,

    /// Terminal console settings
    #[serde(default)]
    pub tui: TuiConfig,

    /// Development mock backend (for papshop-mock-api)
    #[serde(default)]
    pub mock: MockConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Where the bearer token is kept
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Token file; defaults to the platform data directory
    pub token_path: Option<PathBuf>,
}

/// TUI-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuiConfig {
    /// Enable mouse support
    #[serde(default = "default_true")]
    pub mouse: bool,

    /// Use true color (24-bit)
    #[serde(default = "default_true")]
    pub true_color: bool,
}

/// Mock backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// JWT secret (base64 encoded)
    /// If not set, a random secret is generated on every start
    pub jwt_secret: Option<String>,

    /// Issued token lifetime in seconds
    #[serde(default = "default_token_ttl")]
    pub token_ttl: u64,
}

// Default value functions
fn default_base_url() -> String {
    format!("http://localhost:{}/api", crate::DEFAULT_API_PORT)
}
fn default_timeout() -> u64 {
    30
}
fn default_true() -> bool {
    true
}
fn default_listen_addr() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    crate::DEFAULT_API_PORT
}
fn default_token_ttl() -> u64 {
    86400 // 1 day
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            mouse: true,
            true_color: true,
        }
    }
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
            jwt_secret: None,
            token_ttl: default_token_ttl(),
        }
    }
}

impl Config {
    /// Get config directory path
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|p| p.join("papshop"))
            .ok_or(ConfigError::NoDirFound)
    }

    /// Get config file path
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load config from default location
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load config from specific path
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to default location
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    /// Save config to specific path
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:8080/api");
        assert_eq!(config.api.timeout_secs, 30);
        assert!(config.session.token_path.is_none());
        assert_eq!(config.mock.port, crate::DEFAULT_API_PORT);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[api]"));

        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.api.base_url, config.api.base_url);
        assert_eq!(parsed.mock.token_ttl, config.mock.token_ttl);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [api]
            base_url = "https://shop.example.com/api"

            [session]
            token_path = "/tmp/papshop-token"
            "#,
        )
        .unwrap();

        assert_eq!(parsed.api.base_url, "https://shop.example.com/api");
        assert_eq!(parsed.api.timeout_secs, 30);
        assert_eq!(parsed.session.token_path, Some(PathBuf::from("/tmp/papshop-token")));
        assert!(parsed.tui.mouse);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("papshop").join("config.toml");

        let mut config = Config::default();
        config.api.timeout_secs = 5;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api.timeout_secs, 5);
    }
}
