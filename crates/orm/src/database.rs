//! Database handle - lazily opened connection plus the per-handle state
//! shared by every builder created from it
//!
//! A `Database` is cheap to clone; clones share one pool, one event
//! registry and (unless replaced) one request context.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;

use crate::config::{ConnectionConfig, DatabaseConfig, Driver};
use crate::connection::DatabasePool;
use crate::error::{ModelError, ModelResult};
use crate::event_error::EventError;
use crate::events::{ModelEvent, ModelObserver};
use crate::model::Model;
use crate::observers::EventRegistry;
use crate::pagination::RequestContext;
use crate::query::{QueryBuilder, Row};

struct Shared {
    name: String,
    config: ConnectionConfig,
    pool: Mutex<Option<DatabasePool>>,
    events: EventRegistry,
}

/// Handle to one named connection
#[derive(Clone)]
pub struct Database {
    shared: Arc<Shared>,
    request: Option<Arc<dyn RequestContext>>,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.shared.name)
            .field("driver", &self.shared.config.driver)
            .field("database", &self.shared.config.database)
            .field("has_request", &self.request.is_some())
            .finish()
    }
}

impl Database {
    /// Build a handle without opening the connection
    pub fn new(config: ConnectionConfig) -> Self {
        let name = config.driver.to_string();
        Self::named(&name, config)
    }

    pub fn named(name: &str, config: ConnectionConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                name: name.to_string(),
                config,
                pool: Mutex::new(None),
                events: EventRegistry::new(),
            }),
            request: None,
        }
    }

    /// Handle for a named connection (or the default one)
    pub fn from_config(config: &DatabaseConfig, name: Option<&str>) -> ModelResult<Self> {
        let name = name.unwrap_or(&config.default);
        let connection = config.connection(Some(name))?;
        connection.validate()?;
        Ok(Self::named(name, connection.clone()))
    }

    /// Build a handle and open its connection right away
    pub async fn connect(config: ConnectionConfig) -> ModelResult<Self> {
        let database = Self::new(config);
        database.pool().await?;
        Ok(database)
    }

    /// A private in-memory SQLite database
    pub fn sqlite_memory() -> Self {
        Self::new(ConnectionConfig::sqlite_memory())
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.shared.config
    }

    pub fn driver(&self) -> Driver {
        self.shared.config.driver
    }

    /// Same connection, different request context
    pub fn with_request(&self, request: Arc<dyn RequestContext>) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            request: Some(request),
        }
    }

    pub fn request(&self) -> Option<&dyn RequestContext> {
        self.request.as_deref()
    }

    /// The pool, opened on first use and reused afterwards
    pub async fn pool(&self) -> ModelResult<DatabasePool> {
        let mut slot = self.shared.pool.lock().await;
        if let Some(pool) = slot.as_ref() {
            return Ok(pool.clone());
        }

        tracing::info!(
            connection = %self.shared.name,
            driver = %self.shared.config.driver,
            "opening database connection"
        );
        let pool = DatabasePool::connect(&self.shared.config)
            .await
            .map_err(|e| {
                tracing::error!(connection = %self.shared.name, error = %e, "failed to open database connection");
                match e {
                    ModelError::Database(message) => ModelError::Connection(message),
                    other => other,
                }
            })?;
        *slot = Some(pool.clone());
        Ok(pool)
    }

    pub async fn is_connected(&self) -> bool {
        self.shared.pool.lock().await.is_some()
    }

    /// Release the pool. The next query opens a new one.
    pub async fn close(&self) {
        let pool = self.shared.pool.lock().await.take();
        if let Some(pool) = pool {
            pool.close().await;
            tracing::info!(connection = %self.shared.name, "closed database connection");
        }
    }

    /// Builder bound to `table`; it returns to that table after each terminal call
    pub fn table(&self, table: &str) -> QueryBuilder<Row> {
        QueryBuilder::bound(self.clone(), table)
    }

    /// Unbound builder; call `.table()` before any terminal operation
    pub fn query(&self) -> QueryBuilder<Row> {
        QueryBuilder::new(self.clone())
    }

    /// Run a raw statement, returning the affected row count
    pub async fn execute(&self, sql: &str, bindings: &[Value]) -> ModelResult<u64> {
        let pool = self.pool().await?;
        pool.execute(sql, bindings).await.map_err(|e| {
            tracing::error!(sql = %sql, error = %e, "statement failed");
            e
        })
    }

    /// Run a raw query, returning every row
    pub async fn select(&self, sql: &str, bindings: &[Value]) -> ModelResult<Vec<Row>> {
        let pool = self.pool().await?;
        pool.fetch_all(sql, bindings).await.map_err(|e| {
            tracing::error!(sql = %sql, error = %e, "query failed");
            e
        })
    }

    pub fn events(&self) -> &EventRegistry {
        &self.shared.events
    }

    /// Register a closure for one lifecycle event of `M`
    pub fn on<M, F>(&self, event: ModelEvent, callback: F)
    where
        M: Model,
        F: Fn(&mut M) -> Result<(), EventError> + Send + Sync + 'static,
    {
        self.shared.events.on::<M, F>(event, callback);
    }

    /// Register an observer receiving every lifecycle event of `M`
    pub fn observe<M, O>(&self, observer: O)
    where
        M: Model,
        O: ModelObserver<M> + 'static,
    {
        self.shared.events.observe::<M, O>(observer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::StaticRequest;

    #[tokio::test]
    async fn test_pool_opens_lazily_and_reopens_after_close() {
        let db = Database::sqlite_memory();
        assert!(!db.is_connected().await);

        db.execute("CREATE TABLE t (id INTEGER PRIMARY KEY)", &[]).await.unwrap();
        assert!(db.is_connected().await);

        db.close().await;
        assert!(!db.is_connected().await);

        // a fresh in-memory database
        assert!(db.select("SELECT * FROM t", &[]).await.is_err());
        assert!(db.is_connected().await);
    }

    #[tokio::test]
    async fn test_clones_share_the_connection() {
        let db = Database::sqlite_memory();
        let other = db.clone();
        db.execute("CREATE TABLE t (id INTEGER PRIMARY KEY)", &[]).await.unwrap();
        other.execute("INSERT INTO t (id) VALUES (7)", &[]).await.unwrap();
        let rows = db.select("SELECT id FROM t", &[]).await.unwrap();
        assert_eq!(rows[0].get("id"), Some(&Value::from(7)));
    }

    #[test]
    fn test_from_config_resolves_named_connection() {
        let yaml = r#"
default: main
connections:
  main:
    driver: sqlite
    database: ":memory:"
  reports:
    driver: pgsql
    host: reports.internal
    database: reports
"#;
        let config = DatabaseConfig::from_yaml_str(yaml).unwrap();
        let db = Database::from_config(&config, None).unwrap();
        assert_eq!(db.name(), "main");
        assert_eq!(db.driver(), Driver::Sqlite);

        let db = Database::from_config(&config, Some("reports")).unwrap();
        assert_eq!(db.driver(), Driver::Postgres);

        let err = Database::from_config(&config, Some("missing")).unwrap_err();
        assert!(matches!(err, ModelError::Configuration(_)));
    }

    #[test]
    fn test_with_request_keeps_shared_state() {
        let db = Database::sqlite_memory();
        assert!(db.request().is_none());
        let scoped = db.with_request(Arc::new(StaticRequest::new("/users?page=2")));
        assert_eq!(scoped.request().map(|r| r.full_url()), Some("/users?page=2".to_string()));
        assert!(Arc::ptr_eq(&db.shared, &scoped.shared));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_a_connection_error() {
        let mut config = ConnectionConfig::sqlite("/nonexistent-dir/nested/app.db");
        config.max_connections = Some(1);
        let err = Database::connect(config).await.unwrap_err();
        assert!(matches!(err, ModelError::Connection(_)));
    }
}
