//! Configuration for the KnowledgeOut server
//!
//! TOML-based, every field defaulted, loaded from an explicit path or the
//! conventional location under the user config directory.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Configuration error type.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: IpAddr,
    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origins allowed by the CORS layer
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_host() -> IpAddr {
    [127, 0, 0, 1].into()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
    ]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

/// SQLite settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database file path; `:memory:` for an in-memory store
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    /// WAL journal mode
    #[serde(default = "default_true")]
    pub wal_mode: bool,
    /// Foreign key enforcement
    #[serde(default = "default_true")]
    pub foreign_keys: bool,
    /// Busy timeout in milliseconds
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u32,
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("knowledgeout")
        .join("knowledgeout.db")
}

fn default_true() -> bool {
    true
}

fn default_busy_timeout() -> u32 {
    5000
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            wal_mode: true,
            foreign_keys: true,
            busy_timeout_ms: default_busy_timeout(),
        }
    }
}

impl DatabaseConfig {
    /// In-memory database, used by tests.
    pub fn memory() -> Self {
        Self {
            path: PathBuf::from(":memory:"),
            ..Self::default()
        }
    }
}

/// Data seeded on startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Category vocabulary; categories are created if missing, never removed
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
    /// Optional admin account, created on first start if the email is free
    #[serde(default)]
    pub admin: Option<AdminAccount>,
}

fn default_categories() -> Vec<String> {
    ["JAVA", "SPRING", "REACT", "DATABASE", "AWS"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            admin: None,
        }
    }
}

/// Seed admin credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminAccount {
    pub email: String,
    pub password: String,
    pub nickname: String,
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

impl AppConfig {
    /// Load from an explicit path, or from the conventional location if none
    /// is given. A missing file yields the defaults; a malformed file is an
    /// error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) if p.exists() => p,
                _ => {
                    debug!("no config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;

        let config = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;

        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// `~/.config/knowledgeout/config.toml` (platform equivalent).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("knowledgeout").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert!(config.database.wal_mode);
        assert_eq!(config.bootstrap.categories.len(), 5);
        assert!(config.bootstrap.admin.is_none());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            [server]
            port = 9999

            [bootstrap]
            categories = ["RUST"]
            "#,
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.server.port, 9999);
        // Unspecified sections keep their defaults
        assert_eq!(config.server.host, default_host());
        assert!(config.database.foreign_keys);
        assert_eq!(config.bootstrap.categories, vec!["RUST".to_string()]);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "server = 'not a table'").unwrap();

        assert!(matches!(
            AppConfig::load(Some(&path)),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn admin_account_round_trips() {
        let raw = r#"
            [bootstrap.admin]
            email = "admin@knowledgeout.dev"
            password = "changeme123"
            nickname = "admin"
        "#;
        let config: AppConfig = toml::from_str(raw).unwrap();
        let admin = config.bootstrap.admin.unwrap();
        assert_eq!(admin.email, "admin@knowledgeout.dev");
    }
}
