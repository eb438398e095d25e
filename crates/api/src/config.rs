//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Directory uploaded files are stored in.
    pub media_dir: PathBuf,
    /// Session inactivity expiry, in minutes.
    pub session_minutes: i64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `PARLEY_ADDR` | Server bind address | `127.0.0.1:8000` |
    /// | `SQLITE_PATH` | SQLite database URL | `sqlite:parley.db?mode=rwc` |
    /// | `MEDIA_DIR` | Upload storage directory | `media` |
    /// | `SESSION_MINUTES` | Session inactivity expiry | `60` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("PARLEY_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url =
            env::var("SQLITE_PATH").unwrap_or_else(|_| "sqlite:parley.db?mode=rwc".to_string());

        let media_dir = env::var("MEDIA_DIR")
            .unwrap_or_else(|_| "media".to_string())
            .into();

        let session_minutes = match env::var("SESSION_MINUTES") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidSessionMinutes)?,
            Err(_) => 60,
        };

        Ok(Self {
            addr,
            database_url,
            media_dir,
            session_minutes,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid PARLEY_ADDR format")]
    InvalidAddr,

    #[error("Invalid SESSION_MINUTES value")]
    InvalidSessionMinutes,
}
