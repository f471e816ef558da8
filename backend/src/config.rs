//! Server configuration.
//!
//! Values come from the environment (a `.env` file is loaded first when
//! present) and fall back to the defaults below. CLI flags override both.
//!
//! | Variable                  | Default   |
//! |---------------------------|-----------|
//! | `TABKIT_HOST`             | `0.0.0.0` |
//! | `TABKIT_PORT`             | `5001`    |
//! | `TABKIT_MAX_UPLOAD_BYTES` | 10 MiB    |
//! | `TABKIT_MAX_COLUMNS`      | `100`     |

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use crate::error::ConfigError;

/// Default bind address.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default port.
pub const DEFAULT_PORT: u16 = 5001;

/// Maximum size of an uploaded CSV file (in bytes).
///
/// 10 MiB limit.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Maximum number of columns in an uploaded CSV file.
pub const MAX_COLUMNS: usize = 100;

/// Settings for the HTTP server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub max_columns: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_upload_bytes: MAX_UPLOAD_BYTES,
            max_columns: MAX_COLUMNS,
        }
    }
}

impl ServerConfig {
    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Try loading .env file
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Missing keys use the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            host: lookup("TABKIT_HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "TABKIT_PORT", defaults.port)?,
            max_upload_bytes: parse_var(&lookup, "TABKIT_MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            max_columns: parse_var(&lookup, "TABKIT_MAX_COLUMNS", defaults.max_columns)?,
        })
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Address to bind the listener to.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = IpAddr::from_str(&self.host).map_err(|e| ConfigError::Invalid {
            key: "TABKIT_HOST".to_string(),
            value: self.host.clone(),
            message: e.to_string(),
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key: key.to_string(),
            value: raw.clone(),
            message: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.port, 5001);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.max_columns, 100);
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("TABKIT_HOST", "127.0.0.1"),
            ("TABKIT_PORT", "8080"),
            ("TABKIT_MAX_COLUMNS", " 20 "),
        ]))
        .unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_columns, 20);
        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn test_invalid_port() {
        let err = ServerConfig::from_lookup(lookup(&[("TABKIT_PORT", "http")])).unwrap_err();
        assert!(err.to_string().contains("TABKIT_PORT"));
    }

    #[test]
    fn test_invalid_host() {
        let config = ServerConfig::default().with_host("not an ip");
        assert!(config.socket_addr().is_err());
    }
}
