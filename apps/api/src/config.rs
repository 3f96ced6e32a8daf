//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use emporium_db::DbConfig;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Development-only signing secret, used when `TOKEN_SECRET` is unset.
pub const DEV_TOKEN_SECRET: &str = "emporium-dev-secret-change-in-production!";

/// Shortest accepted signing secret.
pub const MIN_TOKEN_SECRET_LEN: usize = 32;

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// HTTP port
    pub http_port: u16,

    /// Interface to bind
    pub bind_addr: String,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub database_max_connections: u32,

    /// HS256 key for session tokens
    #[serde(skip_serializing)]
    pub token_secret: String,

    /// Session token lifetime in seconds
    pub token_lifetime_secs: i64,

    /// Mark the token cookie `Secure`
    pub cookie_secure: bool,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let token_secret = match env::var("TOKEN_SECRET") {
            Ok(secret) if secret.len() >= MIN_TOKEN_SECRET_LEN => secret,
            Ok(_) => return Err(ConfigError::WeakSecret(MIN_TOKEN_SECRET_LEN)),
            Err(_) => {
                // In production, this MUST be set via environment variable
                warn!("TOKEN_SECRET not set, using the development secret");
                DEV_TOKEN_SECRET.to_string()
            }
        };

        let config = ApiConfig {
            http_port: parse_var("EMPORIUM_HTTP_PORT", "3000")?,

            bind_addr: env::var("EMPORIUM_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".to_string()),

            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "./emporium.db".to_string())
                .into(),

            database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS", "5")?,

            token_secret,

            token_lifetime_secs: parse_var("TOKEN_LIFETIME_SECS", "604800")?, // 7 days

            cookie_secure: env::var("COOKIE_SECURE")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
        };

        config.validate()?;
        Ok(config)
    }

    /// Checks values that parse but make no sense.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "DATABASE_MAX_CONNECTIONS".to_string(),
            ));
        }
        if self.token_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("TOKEN_LIFETIME_SECS".to_string()));
        }
        if self.token_secret.len() < MIN_TOKEN_SECRET_LEN {
            return Err(ConfigError::WeakSecret(MIN_TOKEN_SECRET_LEN));
        }
        Ok(())
    }

    /// Address to listen on.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.http_port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue("EMPORIUM_BIND_ADDR".to_string()))
    }

    /// Pool settings for emporium-db.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path).max_connections(self.database_max_connections)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: &str) -> Result<T, ConfigError> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name.to_string()))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("TOKEN_SECRET must be at least {0} characters")]
    WeakSecret(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ApiConfig {
        ApiConfig {
            http_port: 3000,
            bind_addr: "127.0.0.1".to_string(),
            database_path: "./test.db".into(),
            database_max_connections: 5,
            token_secret: DEV_TOKEN_SECRET.to_string(),
            token_lifetime_secs: 604800,
            cookie_secure: false,
        }
    }

    #[test]
    fn test_dev_secret_is_long_enough() {
        assert!(DEV_TOKEN_SECRET.len() >= MIN_TOKEN_SECRET_LEN);
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = sample();
        config.database_max_connections = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));

        let mut config = sample();
        config.token_secret = "short".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::WeakSecret(32))));
    }

    #[test]
    fn test_socket_addr() {
        let addr = sample().socket_addr().unwrap();
        assert_eq!(addr.port(), 3000);

        let mut config = sample();
        config.bind_addr = "not-an-ip".to_string();
        assert!(config.socket_addr().is_err());
    }

    #[test]
    fn test_secret_not_serialized() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert!(!json.contains(DEV_TOKEN_SECRET));
    }
}
