//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// `None` runs against the in-memory store.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub database_acquire_timeout: Duration,
    pub log_level: Level,
    pub jwt_secret: String,
    /// Lifetime baked into each signed token.
    pub jwt_expiry: Duration,
    /// Effective session lifetime, measured from login.
    pub session_ttl: Duration,
    pub session_sweep_interval: Duration,
    /// Path secret guarding staff and admin registration.
    pub admin_slug: String,
    pub cors_origin: Option<String>,
    pub default_page_size: usize,
    pub seed_inventory: bool,
}

fn required(name: &str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingVar(name.to_string()))
}

fn parsed_or<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
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

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:5000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        let database_max_connections = parsed_or("DATABASE_MAX_CONNECTIONS", 5u32)?;
        let database_acquire_timeout =
            Duration::from_secs(parsed_or("DATABASE_ACQUIRE_TIMEOUT_SECS", 5u64)?);

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Session Settings ---
        let jwt_secret = required("JWT_SECRET_KEY")?;
        let jwt_expiry = Duration::from_secs(parsed_or("JWT_EXPIRY_SECS", 300u64)?);
        let session_ttl = Duration::from_secs(parsed_or("SESSION_TTL_SECS", 7200u64)?);
        let session_sweep_interval = Duration::from_secs(parsed_or("SESSION_SWEEP_SECS", 30u64)?);
        if session_sweep_interval.is_zero() {
            return Err(ConfigError::InvalidValue(
                "SESSION_SWEEP_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let admin_slug = required("ADMIN_SLUG")?;
        let cors_origin = std::env::var("CORS_ORIGIN").ok();

        // --- Load Catalog Settings ---
        let default_page_size = parsed_or("DEFAULT_PAGE_SIZE", 10usize)?;
        if default_page_size == 0 {
            return Err(ConfigError::InvalidValue(
                "DEFAULT_PAGE_SIZE".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let seed_inventory = parsed_or("SEED_INVENTORY", true)?;

        Ok(Self {
            bind_address,
            database_url,
            database_max_connections,
            database_acquire_timeout,
            log_level,
            jwt_secret,
            jwt_expiry,
            session_ttl,
            session_sweep_interval,
            admin_slug,
            cors_origin,
            default_page_size,
            seed_inventory,
        })
    }
}
