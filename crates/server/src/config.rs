//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `KSURPLUS_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `KSURPLUS_HOST` - Bind address (default: 0.0.0.0)
//! - `KSURPLUS_PORT` - Listen port (default: 3000)
//! - `KSURPLUS_DAILY_RESERVATION_LIMIT` - Units per customer per day (default: 5)
//! - `KSURPLUS_ENFORCE_DAILY_LIMIT` - Enforce the daily limit server-side (default: true)
//! - `KSURPLUS_BROADCAST_CAPACITY` - Realtime channel buffer per room (default: 256)
//! - `KSURPLUS_CORS_ORIGINS` - Comma-separated allowed origins (default: any)
//! - `KSURPLUS_RATE_LIMIT` - Per-IP rate limiting on `/api` (default: true)
//! - `KSURPLUS_LOG_JSON` - Emit JSON logs (also enabled when `FLY_APP_NAME` is set)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` / `SENTRY_TRACES_SAMPLE_RATE` - Sample rates (default: 1.0 / 0.1)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use ksurplus_core::quota::DEFAULT_DAILY_RESERVATION_LIMIT;
use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: &str = "3000";
const DEFAULT_BROADCAST_CAPACITY: usize = 256;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    /// Maximum reservation units per customer per UTC day
    pub daily_reservation_limit: u32,
    /// Whether the reservation creator enforces the daily limit
    pub enforce_daily_limit: bool,
    /// Buffer size of each realtime broadcast channel
    pub broadcast_capacity: usize,
    /// Allowed CORS origins; empty means any origin
    pub cors_origins: Vec<String>,
    pub rate_limit: bool,
    pub log_json: bool,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("database_url", &"[REDACTED]")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("daily_reservation_limit", &self.daily_reservation_limit)
            .field("enforce_daily_limit", &self.enforce_daily_limit)
            .field("broadcast_capacity", &self.broadcast_capacity)
            .field("cors_origins", &self.cors_origins)
            .field("rate_limit", &self.rate_limit)
            .field("log_json", &self.log_json)
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"))
            .field("sentry_environment", &self.sentry_environment)
            .finish_non_exhaustive()
    }
}

impl ServerConfig {
    /// Load configuration from the process environment (and `.env` if present).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the database URL is missing or a variable
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`ServerConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let database_url = env
            .get("KSURPLUS_DATABASE_URL")
            .or_else(|| env.get("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("KSURPLUS_DATABASE_URL".to_string()))?;

        let host: IpAddr = env.parse_or("KSURPLUS_HOST", DEFAULT_HOST)?;
        let port: u16 = env.parse_or("KSURPLUS_PORT", DEFAULT_PORT)?;

        let daily_reservation_limit: u32 = env.parse_or(
            "KSURPLUS_DAILY_RESERVATION_LIMIT",
            &DEFAULT_DAILY_RESERVATION_LIMIT.to_string(),
        )?;
        if daily_reservation_limit == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "KSURPLUS_DAILY_RESERVATION_LIMIT".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let broadcast_capacity: usize = env.parse_or(
            "KSURPLUS_BROADCAST_CAPACITY",
            &DEFAULT_BROADCAST_CAPACITY.to_string(),
        )?;
        if broadcast_capacity == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "KSURPLUS_BROADCAST_CAPACITY".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let cors_origins = env
            .get("KSURPLUS_CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            database_url,
            host,
            port,
            daily_reservation_limit,
            enforce_daily_limit: env.flag("KSURPLUS_ENFORCE_DAILY_LIMIT", true)?,
            broadcast_capacity,
            cors_origins,
            rate_limit: env.flag("KSURPLUS_RATE_LIMIT", true)?,
            log_json: env.flag("KSURPLUS_LOG_JSON", false)? || env.get("FLY_APP_NAME").is_some(),
            sentry_dsn: env.get("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
            sentry_environment: env.get("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env
                .get("SENTRY_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
            sentry_traces_sample_rate: env
                .get("SENTRY_TRACES_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.1),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }

    fn parse_or<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key)
            .unwrap_or_else(|| default.to_string())
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    fn flag(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        let Some(raw) = self.get(key) else {
            return Ok(default);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("expected a boolean, got {other:?}"),
            )),
        }
    }
}
