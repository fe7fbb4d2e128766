//! # quarry-orm: query builder and Active-Record layer
//!
//! A fluent SQL builder with positional bindings, offset and cursor
//! paginators, and an Active-Record `Model` trait with dirty tracking,
//! casts, mass-assignment rules and lifecycle events. Runs on SQLite,
//! PostgreSQL and MySQL through sqlx.

pub mod config;
pub mod connection;
pub mod database;
pub mod error;
pub mod event_error;
pub mod events;
pub mod logging;
pub mod model;
pub mod observers;
pub mod pagination;
pub mod query;
pub mod security;

// Re-export core traits and types
pub use config::{ConfigError, ConnectionConfig, DatabaseConfig, Driver, LoggingConfig};
pub use connection::DatabasePool;
pub use database::Database;
pub use error::{ModelError, ModelResult, OrmError};
pub use event_error::EventError;
pub use events::{ModelEvent, ModelObserver};
pub use model::{
    Attributes, Cast, CrudOperations, Model, QueryMethods, Relationships, SaveResult,
};
pub use observers::{EventRegistry, ObserverRegistry};
pub use pagination::{CursorPaginator, Link, PageUrl, Paginator, RequestContext, StaticRequest};
pub use query::{CompiledQuery, Condition, Hydrate, IntoRow, OrderDirection, QueryBuilder, Row};
