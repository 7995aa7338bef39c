//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Which `DatabaseService` adapter backs the server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres { database_url: String, max_connections: u32 },
    /// Non-persistent; for demos and local UI work.
    Memory,
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub storage: StorageBackend,
    pub log_level: Level,
    pub cors_origin: String,
    pub static_dir: PathBuf,
    pub session_ttl_days: i64,
    /// Requests without a session cookie act as the demo user instead of failing.
    pub guest_access: bool,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        // --- Load Server Settings ---
        let bind_address_str = var_or("BIND_ADDRESS", "0.0.0.0:3000");
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Storage Settings ---
        let storage = match var_or("STORAGE_BACKEND", "postgres").to_lowercase().as_str() {
            "postgres" => {
                let database_url = lookup("DATABASE_URL")
                    .ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?;
                let max_connections_str = var_or("DB_MAX_CONNECTIONS", "5");
                let max_connections = max_connections_str.parse::<u32>().map_err(|e| {
                    ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string(), e.to_string())
                })?;
                StorageBackend::Postgres {
                    database_url,
                    max_connections,
                }
            }
            "memory" => StorageBackend::Memory,
            other => {
                return Err(ConfigError::InvalidValue(
                    "STORAGE_BACKEND".to_string(),
                    format!("'{}' is not one of postgres, memory", other),
                ))
            }
        };

        // --- Load Web Settings ---
        let cors_origin = var_or("CORS_ORIGIN", "http://localhost:5173");
        let static_dir = PathBuf::from(var_or("STATIC_DIR", "./client/dist"));

        let ttl_str = var_or("SESSION_TTL_DAYS", "30");
        let session_ttl_days = ttl_str
            .parse::<i64>()
            .ok()
            .filter(|days| *days > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "SESSION_TTL_DAYS".to_string(),
                    format!("'{}' is not a positive number of days", ttl_str),
                )
            })?;

        let guest_str = var_or("GUEST_ACCESS", "true");
        let guest_access = guest_str.parse::<bool>().map_err(|_| {
            ConfigError::InvalidValue(
                "GUEST_ACCESS".to_string(),
                format!("'{}' is not true or false", guest_str),
            )
        })?;

        Ok(Self {
            bind_address,
            storage,
            log_level,
            cors_origin,
            static_dir,
            session_ttl_days,
            guest_access,
        })
    }
}
