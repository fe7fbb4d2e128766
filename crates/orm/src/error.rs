//! Error types for the ORM system
//!
//! Read paths (`get`, `first`, `count`) surface these errors to the caller.
//! Write paths (`insert`, `update`, `delete`) log execution failures and
//! return a sentinel instead, so only configuration and connection problems
//! reach the caller there.

use crate::config::ConfigError;
use crate::event_error::EventError;

/// Result type alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// ORM error type alias
pub type OrmError = ModelError;

/// Error types for ORM operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelError {
    /// Statement execution failed (constraint, syntax, lost connection)
    #[error("Database error: {0}")]
    Database(String),

    /// The connection could not be opened
    #[error("Connection error: {0}")]
    Connection(String),

    /// Missing or invalid connection configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The builder was asked to compile something it cannot express safely
    #[error("Query error: {0}")]
    Query(String),

    /// A guarded attribute was written through the attribute setter
    #[error("Attribute '{0}' is guarded and cannot be assigned")]
    ForbiddenAttribute(String),

    /// Record not found in table
    #[error("Record not found in table '{0}'")]
    NotFound(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Lifecycle hook error
    #[error("Event error: {0}")]
    Event(String),
}

impl ModelError {
    /// Whether this error came from running a statement, as opposed to
    /// configuring or compiling one
    pub fn is_execution(&self) -> bool {
        matches!(self, ModelError::Database(_))
    }
}

impl From<sqlx::Error> for ModelError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(e) => ModelError::Configuration(e.to_string()),
            sqlx::Error::Io(e) => ModelError::Connection(e.to_string()),
            sqlx::Error::Tls(e) => ModelError::Connection(e.to_string()),
            sqlx::Error::PoolTimedOut => {
                ModelError::Connection("timed out acquiring a connection".to_string())
            }
            sqlx::Error::PoolClosed => ModelError::Connection("pool is closed".to_string()),
            other => ModelError::Database(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serialization(err.to_string())
    }
}

impl From<ConfigError> for ModelError {
    fn from(err: ConfigError) -> Self {
        ModelError::Configuration(err.to_string())
    }
}

impl From<EventError> for ModelError {
    fn from(err: EventError) -> Self {
        ModelError::Event(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ModelError::ForbiddenAttribute("is_admin".to_string()).to_string(),
            "Attribute 'is_admin' is guarded and cannot be assigned"
        );
        assert_eq!(
            ModelError::NotFound("users".to_string()).to_string(),
            "Record not found in table 'users'"
        );
    }

    #[test]
    fn test_sqlx_errors_are_classified() {
        let err: ModelError = sqlx::Error::PoolClosed.into();
        assert!(matches!(err, ModelError::Connection(_)));

        let err: ModelError = sqlx::Error::RowNotFound.into();
        assert!(err.is_execution());
    }

    #[test]
    fn test_config_error_conversion() {
        let err: ModelError = ConfigError::UnsupportedDriver("oracle".to_string()).into();
        assert!(matches!(err, ModelError::Configuration(msg) if msg.contains("oracle")));
    }
}
