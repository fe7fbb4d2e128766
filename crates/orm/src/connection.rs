//! Database connection pools for the supported drivers
//!
//! Statements are always compiled with `?` placeholders; the Postgres arm
//! rewrites them to `$n` right before execution. Rows come back as
//! [`Row`] maps so the query builder stays driver agnostic.

use std::str::FromStr;

use serde_json::{Number, Value};
use sqlx::mysql::{MySqlArguments, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::postgres::{PgArguments, PgPool, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
    SqliteRow,
};
use sqlx::{Column, MySql, Postgres, Row as _, Sqlite, TypeInfo, ValueRef};

use crate::config::{ConnectionConfig, Driver};
use crate::error::{ModelError, ModelResult};
use crate::query::Row;
use crate::security::number_placeholders;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Connection pool for one of the supported backends
#[derive(Debug, Clone)]
pub enum DatabasePool {
    Sqlite(SqlitePool),
    Postgres(PgPool),
    Mysql(MySqlPool),
}

impl DatabasePool {
    /// Open a pool for the given connection
    pub async fn connect(config: &ConnectionConfig) -> ModelResult<Self> {
        config.validate()?;
        let max_connections = config.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS);

        match config.driver {
            Driver::Sqlite => {
                if config.is_sqlite_memory() {
                    // every pooled connection to :memory: is a separate database
                    let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
                    let pool = SqlitePoolOptions::new()
                        .max_connections(1)
                        .min_connections(1)
                        .idle_timeout(None)
                        .max_lifetime(None)
                        .connect_with(options)
                        .await?;
                    Ok(Self::Sqlite(pool))
                } else {
                    let options = SqliteConnectOptions::new()
                        .filename(&config.database)
                        .create_if_missing(true)
                        .journal_mode(SqliteJournalMode::Wal);
                    let pool = SqlitePoolOptions::new()
                        .max_connections(max_connections)
                        .connect_with(options)
                        .await?;
                    Ok(Self::Sqlite(pool))
                }
            }
            Driver::Postgres => {
                let pool = PgPoolOptions::new()
                    .max_connections(max_connections)
                    .connect(&config.dsn()?)
                    .await?;
                Ok(Self::Postgres(pool))
            }
            Driver::Mysql => {
                let pool = MySqlPoolOptions::new()
                    .max_connections(max_connections)
                    .connect(&config.dsn()?)
                    .await?;
                Ok(Self::Mysql(pool))
            }
        }
    }

    pub fn driver(&self) -> Driver {
        match self {
            Self::Sqlite(_) => Driver::Sqlite,
            Self::Postgres(_) => Driver::Postgres,
            Self::Mysql(_) => Driver::Mysql,
        }
    }

    /// Execute a statement and return the affected row count
    pub async fn execute(&self, sql: &str, bindings: &[Value]) -> ModelResult<u64> {
        tracing::debug!(sql = %sql, bindings = bindings.len(), "executing statement");
        match self {
            Self::Sqlite(pool) => {
                let result = bind_sqlite(sqlx::query(sql), bindings).execute(pool).await?;
                Ok(result.rows_affected())
            }
            Self::Postgres(pool) => {
                let (sql, bindings) = number_placeholders(sql, bindings);
                let result = bind_postgres(sqlx::query(&sql), &bindings)
                    .execute(pool)
                    .await?;
                Ok(result.rows_affected())
            }
            Self::Mysql(pool) => {
                let result = bind_mysql(sqlx::query(sql), bindings).execute(pool).await?;
                Ok(result.rows_affected())
            }
        }
    }

    /// Fetch every row produced by a statement
    pub async fn fetch_all(&self, sql: &str, bindings: &[Value]) -> ModelResult<Vec<Row>> {
        tracing::debug!(sql = %sql, bindings = bindings.len(), "fetching rows");
        match self {
            Self::Sqlite(pool) => {
                let rows = bind_sqlite(sqlx::query(sql), bindings)
                    .fetch_all(pool)
                    .await?;
                rows.iter().map(sqlite_row_to_map).collect()
            }
            Self::Postgres(pool) => {
                let (sql, bindings) = number_placeholders(sql, bindings);
                let rows = bind_postgres(sqlx::query(&sql), &bindings)
                    .fetch_all(pool)
                    .await?;
                rows.iter().map(pg_row_to_map).collect()
            }
            Self::Mysql(pool) => {
                let rows = bind_mysql(sqlx::query(sql), bindings)
                    .fetch_all(pool)
                    .await?;
                rows.iter().map(mysql_row_to_map).collect()
            }
        }
    }

    /// Execute an INSERT and return the generated integer key
    pub async fn insert(&self, sql: &str, bindings: &[Value], key: &str) -> ModelResult<i64> {
        tracing::debug!(sql = %sql, bindings = bindings.len(), "executing insert");
        match self {
            Self::Sqlite(pool) => {
                let result = bind_sqlite(sqlx::query(sql), bindings).execute(pool).await?;
                Ok(result.last_insert_rowid())
            }
            Self::Postgres(pool) => {
                let returning = format!("{} RETURNING {}", sql, key);
                let (sql, bindings) = number_placeholders(&returning, bindings);
                let row = bind_postgres(sqlx::query(&sql), &bindings)
                    .fetch_one(pool)
                    .await?;
                pg_row_to_map(&row)?
                    .get(key)
                    .and_then(Value::as_i64)
                    .ok_or_else(|| {
                        ModelError::Database(format!("INSERT did not return an integer '{}'", key))
                    })
            }
            Self::Mysql(pool) => {
                let result = bind_mysql(sqlx::query(sql), bindings).execute(pool).await?;
                i64::try_from(result.last_insert_id()).map_err(|_| {
                    ModelError::Database("generated id does not fit in i64".to_string())
                })
            }
        }
    }

    pub async fn close(&self) {
        match self {
            Self::Sqlite(pool) => pool.close().await,
            Self::Postgres(pool) => pool.close().await,
            Self::Mysql(pool) => pool.close().await,
        }
    }
}

fn bind_sqlite<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    bindings: &[Value],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for value in bindings {
        query = match value {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(*b),
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => query.bind(i),
                (None, Some(f)) => query.bind(f),
                _ => query.bind(n.to_string()),
            },
            Value::String(s) => query.bind(s.clone()),
            Value::Array(_) | Value::Object(_) => query.bind(value.to_string()),
        };
    }
    query
}

fn bind_postgres<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    bindings: &[&Value],
) -> Query<'q, Postgres, PgArguments> {
    for value in bindings {
        query = match value {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(*b),
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => query.bind(i),
                (None, Some(f)) => query.bind(f),
                _ => query.bind(n.to_string()),
            },
            Value::String(s) => query.bind(s.clone()),
            Value::Array(_) | Value::Object(_) => query.bind(sqlx::types::Json((*value).clone())),
        };
    }
    query
}

fn bind_mysql<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    bindings: &[Value],
) -> Query<'q, MySql, MySqlArguments> {
    for value in bindings {
        query = match value {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(*b),
            Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
                (Some(i), _, _) => query.bind(i),
                (None, Some(u), _) => query.bind(u),
                (None, None, Some(f)) => query.bind(f),
                _ => query.bind(n.to_string()),
            },
            Value::String(s) => query.bind(s.clone()),
            Value::Array(_) | Value::Object(_) => query.bind(value.to_string()),
        };
    }
    query
}

fn float(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

fn bytes(b: Vec<u8>) -> Value {
    match String::from_utf8(b) {
        Ok(s) => Value::String(s),
        Err(e) => Value::Array(e.into_bytes().into_iter().map(Value::from).collect()),
    }
}

/// Convert SQLite row to a column map, using each value's storage class
fn sqlite_row_to_map(row: &SqliteRow) -> ModelResult<Row> {
    let mut map = Row::new();

    for (i, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(i)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            let type_name = raw.type_info().name().to_string();
            match type_name.as_str() {
                "INTEGER" | "BOOLEAN" => Value::from(row.try_get_unchecked::<i64, _>(i)?),
                "REAL" | "NUMERIC" => float(row.try_get_unchecked::<f64, _>(i)?),
                "BLOB" => bytes(row.try_get_unchecked::<Vec<u8>, _>(i)?),
                _ => Value::String(row.try_get_unchecked::<String, _>(i)?),
            }
        };
        map.insert(column.name().to_string(), value);
    }

    Ok(map)
}

/// Convert PostgreSQL row to a column map
fn pg_row_to_map(row: &PgRow) -> ModelResult<Row> {
    let mut map = Row::new();

    for (i, column) in row.columns().iter().enumerate() {
        if row.try_get_raw(i)?.is_null() {
            map.insert(column.name().to_string(), Value::Null);
            continue;
        }

        let value = match column.type_info().name() {
            "BOOL" => Value::Bool(row.try_get::<bool, _>(i)?),
            "INT2" => Value::from(row.try_get::<i16, _>(i)?),
            "INT4" => Value::from(row.try_get::<i32, _>(i)?),
            "INT8" => Value::from(row.try_get::<i64, _>(i)?),
            "FLOAT4" => float(f64::from(row.try_get::<f32, _>(i)?)),
            "FLOAT8" => float(row.try_get::<f64, _>(i)?),
            "JSON" | "JSONB" => row.try_get::<Value, _>(i)?,
            "TIMESTAMPTZ" => Value::String(
                row.try_get::<chrono::DateTime<chrono::Utc>, _>(i)?
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string(),
            ),
            "TIMESTAMP" => Value::String(
                row.try_get::<chrono::NaiveDateTime, _>(i)?
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string(),
            ),
            "DATE" => Value::String(row.try_get::<chrono::NaiveDate, _>(i)?.to_string()),
            "TIME" => Value::String(row.try_get::<chrono::NaiveTime, _>(i)?.to_string()),
            "BYTEA" => bytes(row.try_get::<Vec<u8>, _>(i)?),
            other => match row.try_get::<String, _>(i) {
                Ok(s) => Value::String(s),
                Err(e) => {
                    tracing::warn!(column = column.name(), type_name = other, error = %e, "unsupported column type");
                    Value::Null
                }
            },
        };
        map.insert(column.name().to_string(), value);
    }

    Ok(map)
}

/// Convert MySQL row to a column map
fn mysql_row_to_map(row: &MySqlRow) -> ModelResult<Row> {
    let mut map = Row::new();

    for (i, column) in row.columns().iter().enumerate() {
        if row.try_get_raw(i)?.is_null() {
            map.insert(column.name().to_string(), Value::Null);
            continue;
        }

        let type_name = column.type_info().name();
        let value = match type_name {
            "BOOLEAN" => Value::Bool(row.try_get::<bool, _>(i)?),
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
                Value::from(row.try_get::<i64, _>(i)?)
            }
            "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
            | "BIGINT UNSIGNED" => Value::from(row.try_get::<u64, _>(i)?),
            "FLOAT" => float(f64::from(row.try_get::<f32, _>(i)?)),
            "DOUBLE" => float(row.try_get::<f64, _>(i)?),
            "JSON" => row.try_get::<Value, _>(i)?,
            "DATETIME" => Value::String(
                row.try_get::<chrono::NaiveDateTime, _>(i)?
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string(),
            ),
            "TIMESTAMP" => Value::String(
                row.try_get::<chrono::DateTime<chrono::Utc>, _>(i)?
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string(),
            ),
            "DATE" => Value::String(row.try_get::<chrono::NaiveDate, _>(i)?.to_string()),
            "TIME" => Value::String(row.try_get::<chrono::NaiveTime, _>(i)?.to_string()),
            "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BINARY" | "VARBINARY" => {
                bytes(row.try_get::<Vec<u8>, _>(i)?)
            }
            other => match row.try_get::<String, _>(i) {
                Ok(s) => Value::String(s),
                Err(e) => {
                    tracing::warn!(column = column.name(), type_name = other, error = %e, "unsupported column type");
                    Value::Null
                }
            },
        };
        map.insert(column.name().to_string(), value);
    }

    Ok(map)
}
