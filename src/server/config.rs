// src/server/config.rs

//! Configuration file parsing for the Pinion server
//!
//! Supports TOML configuration files with the following sections:
//! - [server] - Bind address
//! - [storage] - Job store path, job TTL
//! - [registry] - Registry base URL, timeout, metadata cache TTL

use crate::server::ServerConfig;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize)]
pub struct PinionConfig {
    /// Server settings
    #[serde(default)]
    pub server: ServerSection,

    /// Storage settings
    #[serde(default)]
    pub storage: StorageSection,

    /// Registry settings
    #[serde(default)]
    pub registry: RegistrySection,
}

/// Server configuration section
#[derive(Debug, Deserialize)]
pub struct ServerSection {
    /// Public API bind address
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

/// Storage configuration section
#[derive(Debug, Deserialize)]
pub struct StorageSection {
    /// Job store database path
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Terminal job TTL (e.g., "24h", "30m")
    #[serde(default = "default_job_ttl")]
    pub job_ttl: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            job_ttl: default_job_ttl(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("/var/lib/pinion/jobs.db")
}

fn default_job_ttl() -> String {
    "24h".to_string()
}

/// Registry configuration section
#[derive(Debug, Deserialize)]
pub struct RegistrySection {
    /// Base URL of the PyPI-compatible JSON API
    #[serde(default = "default_registry_url")]
    pub base_url: String,

    /// Request timeout (e.g., "30s")
    #[serde(default = "default_registry_timeout")]
    pub timeout: String,

    /// Metadata cache TTL (e.g., "1h")
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl: String,
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            base_url: default_registry_url(),
            timeout: default_registry_timeout(),
            cache_ttl: default_cache_ttl(),
        }
    }
}

fn default_registry_url() -> String {
    "https://pypi.org/pypi".to_string()
}

fn default_registry_timeout() -> String {
    "30s".to_string()
}

fn default_cache_ttl() -> String {
    "1h".to_string()
}

impl PinionConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: PinionConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.server
            .bind
            .parse::<SocketAddr>()
            .with_context(|| format!("Invalid server.bind address: {}", self.server.bind))?;

        parse_duration(&self.storage.job_ttl)
            .with_context(|| format!("Invalid storage.job_ttl: {}", self.storage.job_ttl))?;
        parse_duration(&self.registry.timeout)
            .with_context(|| format!("Invalid registry.timeout: {}", self.registry.timeout))?;
        parse_duration(&self.registry.cache_ttl)
            .with_context(|| format!("Invalid registry.cache_ttl: {}", self.registry.cache_ttl))?;

        Ok(())
    }

    /// Convert to the internal ServerConfig structure
    pub fn to_server_config(&self) -> Result<ServerConfig> {
        Ok(ServerConfig {
            bind_addr: self.server.bind.parse()?,
            db_path: self.storage.db_path.clone(),
            registry_url: self.registry.base_url.clone(),
            registry_timeout: parse_duration(&self.registry.timeout)?,
            cache_ttl: parse_duration(&self.registry.cache_ttl)?,
            job_ttl: parse_duration(&self.storage.job_ttl)?,
        })
    }
}

/// Parse a human-readable duration string (e.g., "15m", "1h", "30s")
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim().to_lowercase();

    let (num_str, multiplier) = if s.ends_with('d') {
        (&s[..s.len() - 1], 24 * 60 * 60)
    } else if s.ends_with('h') {
        (&s[..s.len() - 1], 60 * 60)
    } else if s.ends_with('m') {
        (&s[..s.len() - 1], 60)
    } else if s.ends_with('s') {
        (&s[..s.len() - 1], 1)
    } else {
        // Assume seconds
        (s.as_str(), 1)
    };

    let num: u64 = num_str
        .trim()
        .parse()
        .with_context(|| format!("Invalid duration number: {}", num_str))?;

    Ok(Duration::from_secs(num * multiplier))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("30").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("15m").unwrap(), Duration::from_secs(15 * 60));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("2d").unwrap(), Duration::from_secs(2 * 24 * 3600));
    }

    #[test]
    fn test_default_config() {
        let config = PinionConfig::default();
        assert!(config.validate().is_ok());

        let server_config = config.to_server_config().unwrap();
        assert_eq!(server_config.registry_url, "https://pypi.org/pypi");
        assert_eq!(server_config.cache_ttl, Duration::from_secs(3600));
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
[server]
bind = "127.0.0.1:9000"

[storage]
db_path = "/tmp/pinion/jobs.db"
job_ttl = "12h"

[registry]
base_url = "https://pypi.example.org/pypi"
timeout = "10s"
cache_ttl = "30m"
"#;
        let config: PinionConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_ok());

        let server_config = config.to_server_config().unwrap();
        assert_eq!(server_config.bind_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(server_config.job_ttl, Duration::from_secs(12 * 3600));
        assert_eq!(server_config.cache_ttl, Duration::from_secs(30 * 60));
    }

    #[test]
    fn test_invalid_bind_rejected() {
        let toml_str = r#"
[server]
bind = "not-an-address"
"#;
        let config: PinionConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_err());
    }
}
