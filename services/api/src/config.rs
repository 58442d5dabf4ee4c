//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
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
    /// `None` runs the shell against the in-memory collaborators.
    pub database_url: Option<String>,
    pub log_level: Level,
    pub blob_root: PathBuf,
    pub blob_public_url: String,
    pub analysis_delay: Duration,
    /// Key of the persisted provider session; one per client shell.
    pub client_id: String,
    pub session_ttl_days: i64,
    pub consent_timeout: Duration,
    pub seed_remote_catalog: bool,
    pub cors_origin: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            database_url: None,
            log_level: Level::INFO,
            blob_root: PathBuf::from("./uploads"),
            blob_public_url: "/uploads".to_string(),
            analysis_delay: Duration::from_millis(2000),
            client_id: "default".to_string(),
            session_ttl_days: 30,
            consent_timeout: Duration::from_secs(120),
            seed_remote_catalog: false,
            cors_origin: "http://localhost:5173".to_string(),
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T, ConfigError>
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
        let defaults = Self::default();

        // --- Server and Database Settings ---
        let bind_address = parse_var("BIND_ADDRESS", defaults.bind_address)?;

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Blob Storage ---
        let blob_root = std::env::var("BLOB_ROOT")
            .map(PathBuf::from)
            .unwrap_or(defaults.blob_root);
        let blob_public_url = std::env::var("BLOB_PUBLIC_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.blob_public_url);

        // --- Session and Analysis Settings ---
        let analysis_delay = Duration::from_millis(parse_var("ANALYSIS_DELAY_MS", 2000u64)?);
        let client_id = std::env::var("CLIENT_ID").unwrap_or(defaults.client_id);
        let session_ttl_days = parse_var("SESSION_TTL_DAYS", defaults.session_ttl_days)?;
        if session_ttl_days <= 0 {
            return Err(ConfigError::InvalidValue(
                "SESSION_TTL_DAYS".to_string(),
                "must be positive".to_string(),
            ));
        }
        let consent_timeout = Duration::from_secs(parse_var("CONSENT_TIMEOUT_SECS", 120u64)?);
        let seed_remote_catalog = parse_var("SEED_REMOTE_CATALOG", false)?;
        let cors_origin = std::env::var("CORS_ORIGIN").unwrap_or(defaults.cors_origin);

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            blob_root,
            blob_public_url,
            analysis_delay,
            client_id,
            session_ttl_days,
            consent_timeout,
            seed_remote_catalog,
            cors_origin,
        })
    }
}
