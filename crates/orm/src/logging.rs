//! Subscriber setup for the `tracing` events emitted by the query layer.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{ConfigError, LoggingConfig};

/// Install a global `tracing` subscriber.
///
/// `RUST_LOG` wins over `config.level` when set. Fails if a global
/// subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<(), ConfigError> {
    config.validate()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_lowercase()));
    let builder = fmt().with_env_filter(filter).with_target(true);

    let result = match config.format.to_lowercase().as_str() {
        "json" => builder.json().try_init(),
        "pretty" => builder.pretty().try_init(),
        _ => builder.compact().try_init(),
    };

    result.map_err(|e| ConfigError::ValidationFailed {
        field: "logging".to_string(),
        reason: e.to_string(),
    })
}
