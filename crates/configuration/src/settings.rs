use crate::error::ConfigError;
use serde::Deserialize;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DbConfig,
    pub logging: LoggingConfig,
}

/// Connection parameters for the PostgreSQL server.
///
/// The defaults point at the local development database (`aed_db` on
/// localhost), so no config file is needed for it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    /// Name of the database to connect to (e.g., "aed_db").
    pub dbname: String,
    pub user: String,
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "aed_db".to_string(),
            user: "aed_user".to_string(),
            password: "aed_pass".to_string(),
        }
    }
}

impl DbConfig {
    /// Rejects settings that can never produce a connection.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::ValidationError("database.host must not be empty".into()));
        }
        if self.dbname.trim().is_empty() {
            return Err(ConfigError::ValidationError("database.dbname must not be empty".into()));
        }
        if self.user.trim().is_empty() {
            return Err(ConfigError::ValidationError("database.user must not be empty".into()));
        }
        if self.port == 0 {
            return Err(ConfigError::ValidationError("database.port must be non-zero".into()));
        }
        Ok(())
    }

    /// Applies command-line overrides on top of the loaded values.
    pub fn apply(&mut self, overrides: &DbOverrides) {
        if let Some(host) = &overrides.host {
            self.host = host.clone();
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(dbname) = &overrides.dbname {
            self.dbname = dbname.clone();
        }
        if let Some(user) = &overrides.user {
            self.user = user.clone();
        }
        if let Some(password) = &overrides.password {
            self.password = password.clone();
        }
    }
}

/// Optional per-invocation overrides for [`DbConfig`].
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct DbOverrides {
    /// Database host (overrides `database.host`).
    #[cfg_attr(feature = "clap", arg(long, global = true))]
    pub host: Option<String>,
    /// Database port (overrides `database.port`).
    #[cfg_attr(feature = "clap", arg(long, global = true))]
    pub port: Option<u16>,
    /// Database name (overrides `database.dbname`).
    #[cfg_attr(feature = "clap", arg(long, global = true))]
    pub dbname: Option<String>,
    /// Database user (overrides `database.user`).
    #[cfg_attr(feature = "clap", arg(long, global = true))]
    pub user: Option<String>,
    /// Database password (overrides `database.password`).
    #[cfg_attr(feature = "clap", arg(long, global = true))]
    pub password: Option<String>,
}

/// Settings for the tracing subscriber.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set (e.g., "info" or "database=debug").
    pub level: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}
