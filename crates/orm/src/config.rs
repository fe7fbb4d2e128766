//! Connection configuration
//!
//! Resolves `{driver, host, port, database, username, password, charset,
//! options}` records into driver-specific connection URLs. Records come
//! from environment variables or a YAML document.

use std::collections::{BTreeMap, HashMap};
use std::env;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Configuration errors
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}")]
    MissingEnvVar { var: String },

    #[error("Invalid value for {field}: '{value}', expected {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },

    #[error("Validation failed for {field}: {reason}")]
    ValidationFailed { field: String, reason: String },

    #[error("Unsupported database driver: {0}")]
    UnsupportedDriver(String),

    #[error("Connection '{0}' is not configured")]
    UnknownConnection(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Supported database drivers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Driver {
    Mysql,
    Sqlite,
    Postgres,
}

impl Driver {
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Driver::Mysql => Some(3306),
            Driver::Postgres => Some(5432),
            Driver::Sqlite => None,
        }
    }

    fn scheme(&self) -> &'static str {
        match self {
            Driver::Mysql => "mysql",
            Driver::Postgres => "postgres",
            Driver::Sqlite => "sqlite",
        }
    }
}

impl FromStr for Driver {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Driver::Mysql),
            "sqlite" | "sqlite3" => Ok(Driver::Sqlite),
            "pgsql" | "postgres" | "postgresql" => Ok(Driver::Postgres),
            other => Err(ConfigError::UnsupportedDriver(other.to_string())),
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

impl<'de> Deserialize<'de> for Driver {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A single named connection
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    pub driver: Driver,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    pub database: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub charset: Option<String>,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    #[serde(default)]
    pub max_connections: Option<u32>,
}

impl ConnectionConfig {
    /// An SQLite connection to a file path, or `:memory:`
    pub fn sqlite(database: &str) -> Self {
        Self {
            driver: Driver::Sqlite,
            host: None,
            port: None,
            database: database.to_string(),
            username: None,
            password: None,
            charset: None,
            options: BTreeMap::new(),
            max_connections: None,
        }
    }

    /// An in-memory SQLite connection
    pub fn sqlite_memory() -> Self {
        Self::sqlite(":memory:")
    }

    pub fn is_sqlite_memory(&self) -> bool {
        self.driver == Driver::Sqlite
            && matches!(self.database.as_str(), ":memory:" | "" | "sqlite::memory:")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.driver != Driver::Sqlite {
            if self.database.trim().is_empty() {
                return Err(ConfigError::ValidationFailed {
                    field: "database".to_string(),
                    reason: "Database name cannot be empty".to_string(),
                });
            }
            if self.host.as_deref().map_or(true, |h| h.trim().is_empty()) {
                return Err(ConfigError::ValidationFailed {
                    field: "host".to_string(),
                    reason: format!("Host is required for the {} driver", self.driver),
                });
            }
        }

        if self.max_connections == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "max_connections".to_string(),
                reason: "Pool size cannot be 0".to_string(),
            });
        }

        Ok(())
    }

    /// Resolve the driver-specific connection URL
    pub fn dsn(&self) -> Result<String, ConfigError> {
        self.validate()?;

        if self.driver == Driver::Sqlite {
            return Ok(if self.is_sqlite_memory() {
                "sqlite::memory:".to_string()
            } else {
                format!("sqlite://{}", self.database)
            });
        }

        let host = self.host.as_deref().unwrap_or("localhost");
        let mut url = Url::parse(&format!("{}://{}", self.driver.scheme(), host))
            .map_err(|e| ConfigError::InvalidValue {
                field: "host".to_string(),
                value: host.to_string(),
                expected: format!("a valid host name ({})", e),
            })?;

        let invalid = |field: &str| ConfigError::InvalidValue {
            field: field.to_string(),
            value: host.to_string(),
            expected: "a host that accepts credentials and ports".to_string(),
        };

        if let Some(username) = self.username.as_deref().filter(|u| !u.is_empty()) {
            url.set_username(username).map_err(|_| invalid("username"))?;
        }
        if let Some(password) = self.password.as_deref().filter(|p| !p.is_empty()) {
            url.set_password(Some(password))
                .map_err(|_| invalid("password"))?;
        }
        url.set_port(self.port.or_else(|| self.driver.default_port()))
            .map_err(|_| invalid("port"))?;
        url.set_path(&self.database);

        {
            let mut query = url.query_pairs_mut();
            if self.driver == Driver::Mysql {
                if let Some(charset) = &self.charset {
                    query.append_pair("charset", charset);
                }
            }
            for (key, value) in &self.options {
                query.append_pair(key, value);
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }

        Ok(url.to_string())
    }

    /// Read a connection from the `DB_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let driver: Driver = get_env_or_default("DB_CONNECTION", "sqlite").parse()?;
        let database = match driver {
            Driver::Sqlite => get_env_or_default("DB_DATABASE", ":memory:"),
            _ => get_env_required("DB_DATABASE")?,
        };
        let port = match get_env_optional("DB_PORT") {
            Some(raw) => Some(raw.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                field: "port".to_string(),
                value: raw,
                expected: "valid port number (0-65535)".to_string(),
            })?),
            None => None,
        };

        let config = Self {
            driver,
            host: get_env_optional("DB_HOST"),
            port,
            database,
            username: get_env_optional("DB_USERNAME"),
            password: get_env_optional("DB_PASSWORD"),
            charset: get_env_optional("DB_CHARSET"),
            options: BTreeMap::new(),
            max_connections: None,
        };
        config.validate()?;
        Ok(config)
    }
}

/// The set of named connections
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub default: String,
    pub connections: HashMap<String, ConnectionConfig>,
}

impl DatabaseConfig {
    pub fn single(name: &str, connection: ConnectionConfig) -> Self {
        let mut connections = HashMap::new();
        connections.insert(name.to_string(), connection);
        Self {
            default: name.to_string(),
            connections,
        }
    }

    /// Single connection named after the driver, read from `DB_*`
    pub fn from_env() -> Result<Self, ConfigError> {
        let connection = ConnectionConfig::from_env()?;
        Ok(Self::single(&connection.driver.to_string(), connection))
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.connections.contains_key(&self.default) {
            return Err(ConfigError::UnknownConnection(self.default.clone()));
        }
        for connection in self.connections.values() {
            connection.validate()?;
        }
        Ok(())
    }

    /// Resolve a named connection, or the default one when `name` is `None`
    pub fn connection(&self, name: Option<&str>) -> Result<&ConnectionConfig, ConfigError> {
        let name = name.unwrap_or(&self.default);
        self.connections
            .get(name)
            .ok_or_else(|| ConfigError::UnknownConnection(name.to_string()))
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            level: get_env_or_default("LOG_LEVEL", "info"),
            format: get_env_or_default("LOG_FORMAT", "compact"),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "level".to_string(),
                value: self.level.clone(),
                expected: "trace, debug, info, warn, or error".to_string(),
            });
        }

        let valid_formats = ["compact", "pretty", "json"];
        if !valid_formats.contains(&self.format.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "format".to_string(),
                value: self.format.clone(),
                expected: "compact, pretty, or json".to_string(),
            });
        }

        Ok(())
    }
}

fn get_env_required(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingEnvVar {
        var: key.to_string(),
    })
}

fn get_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn get_env_or_default(key: &str, default: &str) -> String {
    get_env_optional(key).unwrap_or_else(|| default.to_string())
}
