//! Runtime configuration read from the environment (and a `.env` file).

use axum::http::HeaderValue;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:8080";
const DATA_DIR_NAME: &str = "Vacation Tracker";
const DATABASE_FILE: &str = "vacation_tracker.db";

/// Which persistence backend to run against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// CSV collections plus a YAML settings document per user
    Csv,
    Sqlite,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(StorageBackend::Csv),
            "sqlite" => Ok(StorageBackend::Sqlite),
            other => Err(ConfigError::UnknownStorage(other.to_string())),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Csv => f.write_str("csv"),
            StorageBackend::Sqlite => f.write_str("sqlite"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub storage: StorageBackend,
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub allowed_origin: HeaderValue,
    /// Custom sign-in token; anonymous sign-in when absent
    pub auth_token: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let data_dir = get("VACATION_TRACKER_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let storage = match get("VACATION_TRACKER_STORAGE") {
            Some(value) => value.parse()?,
            None => StorageBackend::Csv,
        };

        let database_url = get("DATABASE_URL")
            .unwrap_or_else(|| format!("sqlite://{}", data_dir.join(DATABASE_FILE).display()));

        let server_host = get("SERVER_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        let server_port = match get("SERVER_PORT") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(value))?,
            None => DEFAULT_PORT,
        };

        let origin = get("ALLOWED_ORIGIN").unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.to_string());
        let allowed_origin = origin
            .parse::<HeaderValue>()
            .map_err(|_| ConfigError::InvalidOrigin(origin))?;

        let auth_token = get("VACATION_TRACKER_AUTH_TOKEN");

        Ok(AppConfig {
            data_dir,
            storage,
            database_url,
            server_host,
            server_port,
            allowed_origin,
            auth_token,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

/// `~/Documents/Vacation Tracker`, or `./data` when there is no documents folder
fn default_data_dir() -> PathBuf {
    match dirs::document_dir() {
        Some(documents) => documents.join(DATA_DIR_NAME),
        None => PathBuf::from("data"),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid port number: '{0}'")]
    InvalidPort(String),

    #[error("Unknown storage backend '{0}', expected 'csv' or 'sqlite'")]
    UnknownStorage(String),

    #[error("ALLOWED_ORIGIN is not a valid header value: '{0}'")]
    InvalidOrigin(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("VACATION_TRACKER_DATA_DIR", "/tmp/vacations")]).unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/vacations"));
        assert_eq!(config.storage, StorageBackend::Csv);
        assert_eq!(config.database_url, "sqlite:///tmp/vacations/vacation_tracker.db");
        assert_eq!(config.server_address(), "127.0.0.1:3000");
        assert_eq!(config.allowed_origin, "http://localhost:8080");
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("VACATION_TRACKER_STORAGE", "SQLite"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("SERVER_HOST", "0.0.0.0"),
            ("SERVER_PORT", "8081"),
            ("ALLOWED_ORIGIN", "https://vacations.example.com"),
            ("VACATION_TRACKER_AUTH_TOKEN", "team-token"),
        ])
        .unwrap();

        assert_eq!(config.storage, StorageBackend::Sqlite);
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.server_address(), "0.0.0.0:8081");
        assert_eq!(config.allowed_origin, "https://vacations.example.com");
        assert_eq!(config.auth_token.as_deref(), Some("team-token"));
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = config_from(&[("SERVER_PORT", "  "), ("VACATION_TRACKER_AUTH_TOKEN", "")]).unwrap();
        assert_eq!(config.server_port, 3000);
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            config_from(&[("SERVER_PORT", "http")]),
            Err(ConfigError::InvalidPort(_))
        ));
        assert!(matches!(
            config_from(&[("SERVER_PORT", "70000")]),
            Err(ConfigError::InvalidPort(_))
        ));
        assert!(matches!(
            config_from(&[("VACATION_TRACKER_STORAGE", "postgres")]),
            Err(ConfigError::UnknownStorage(_))
        ));
        assert!(matches!(
            config_from(&[("ALLOWED_ORIGIN", "bad\norigin")]),
            Err(ConfigError::InvalidOrigin(_))
        ));
    }
}
