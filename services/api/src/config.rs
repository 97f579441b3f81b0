//! HTTP server configuration
//!
//! Built once at startup and handed to the router and handlers through
//! [`crate::state::AppState`].

use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::path::PathBuf;

/// Deployment mode; production turns on secure cookies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Development,
    Production,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: RunMode,
    /// Origin allowed to call the API with credentials
    pub cors_origin: Option<String>,
    /// Maximum JSON/urlencoded body size in bytes
    pub json_body_limit: usize,
    /// Maximum multipart body size in bytes
    pub upload_body_limit: usize,
    /// Directory staging multipart files before they are pushed to the media host
    pub upload_temp_dir: PathBuf,
}

impl ServerConfig {
    /// Load the server configuration
    ///
    /// # Environment Variables
    /// - `SERVER_HOST` (default: "0.0.0.0")
    /// - `SERVER_PORT` (default: 8000)
    /// - `SERVER_ENVIRONMENT`: "development" or "production" (default: "development")
    /// - `SERVER_CORS_ORIGIN` (optional)
    /// - `SERVER_JSON_BODY_LIMIT` (default: 16384)
    /// - `SERVER_UPLOAD_BODY_LIMIT` (default: 104857600)
    /// - `SERVER_UPLOAD_TEMP_DIR` (default: "./public/temp")
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8000_i64)?
            .set_default("environment", "development")?
            .set_default("json_body_limit", 16_384_i64)?
            .set_default("upload_body_limit", 104_857_600_i64)?
            .set_default("upload_temp_dir", "./public/temp")?
            .add_source(Environment::with_prefix("SERVER").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn is_production(&self) -> bool {
        self.environment == RunMode::Production
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            environment: RunMode::Development,
            cors_origin: None,
            json_body_limit: 16_384,
            upload_body_limit: 1_048_576,
            upload_temp_dir: std::env::temp_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 7] = [
        "SERVER_HOST",
        "SERVER_PORT",
        "SERVER_ENVIRONMENT",
        "SERVER_CORS_ORIGIN",
        "SERVER_JSON_BODY_LIMIT",
        "SERVER_UPLOAD_BODY_LIMIT",
        "SERVER_UPLOAD_TEMP_DIR",
    ];

    fn clear_env() {
        for var in VARS {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }

    #[test]
    #[serial]
    fn defaults_apply_without_environment() {
        clear_env();

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.environment, RunMode::Development);
        assert_eq!(config.json_body_limit, 16_384);
        assert_eq!(config.upload_body_limit, 104_857_600);
        assert_eq!(config.upload_temp_dir, PathBuf::from("./public/temp"));
        assert!(config.cors_origin.is_none());
        assert!(!config.is_production());
    }

    #[test]
    #[serial]
    fn environment_overrides_defaults() {
        clear_env();
        unsafe {
            std::env::set_var("SERVER_PORT", "9100");
            std::env::set_var("SERVER_ENVIRONMENT", "production");
            std::env::set_var("SERVER_CORS_ORIGIN", "https://app.example.test");
        }

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.port, 9100);
        assert!(config.is_production());
        assert_eq!(
            config.cors_origin.as_deref(),
            Some("https://app.example.test")
        );

        clear_env();
    }

    #[test]
    #[serial]
    fn unknown_run_mode_is_rejected() {
        clear_env();
        unsafe {
            std::env::set_var("SERVER_ENVIRONMENT", "staging");
        }

        assert!(ServerConfig::from_env().is_err());

        clear_env();
    }
}
