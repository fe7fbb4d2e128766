//! Query Methods - builder proxies for models
//!
//! Every method opens a fresh builder bound to the model's table; the
//! model type itself never holds query state.

use serde_json::Value;

use super::core_trait::Model;
use crate::database::Database;
use crate::error::ModelResult;
use crate::pagination::{CursorPaginator, Paginator};
use crate::query::QueryBuilder;

/// Trait providing query operations for model collections
#[allow(async_fn_in_trait)]
pub trait QueryMethods: Model {
    /// Get a query builder for this model
    fn query(db: &Database) -> QueryBuilder<Self> {
        QueryBuilder::bound(db.clone(), Self::table_name())
    }

    fn where_<V: Into<Value>>(db: &Database, column: &str, operator: &str, value: V) -> QueryBuilder<Self> {
        Self::query(db).where_(column, operator, value)
    }

    fn where_eq<V: Into<Value>>(db: &Database, column: &str, value: V) -> QueryBuilder<Self> {
        Self::query(db).where_eq(column, value)
    }

    fn where_in<I, V>(db: &Database, column: &str, values: I) -> QueryBuilder<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::query(db).where_in(column, values)
    }

    fn where_between<L: Into<Value>, H: Into<Value>>(
        db: &Database,
        column: &str,
        low: L,
        high: H,
    ) -> QueryBuilder<Self> {
        Self::query(db).where_between(column, low, high)
    }

    fn where_raw(db: &Database, sql: &str, bindings: Vec<Value>) -> QueryBuilder<Self> {
        Self::query(db).where_raw(sql, bindings)
    }

    fn where_nested<F>(db: &Database, build: F) -> QueryBuilder<Self>
    where
        F: FnOnce(QueryBuilder<Self>) -> QueryBuilder<Self>,
    {
        Self::query(db).where_nested(build)
    }

    fn select<I, S>(db: &Database, columns: I) -> QueryBuilder<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::query(db).select(columns)
    }

    fn order_by(db: &Database, column: &str, direction: &str) -> QueryBuilder<Self> {
        Self::query(db).order_by(column, direction)
    }

    fn latest(db: &Database) -> QueryBuilder<Self> {
        Self::query(db).latest()
    }

    fn limit(db: &Database, count: i64) -> QueryBuilder<Self> {
        Self::query(db).limit(count)
    }

    /// Every stored row
    async fn all(db: &Database) -> ModelResult<Vec<Self>> {
        Self::query(db).get().await
    }

    async fn first(db: &Database) -> ModelResult<Option<Self>> {
        Self::query(db).first().await
    }

    async fn count(db: &Database) -> ModelResult<u64> {
        Self::query(db).count().await
    }

    async fn paginate(db: &Database, per_page: u64, page: u64) -> ModelResult<Paginator<Self>> {
        Self::query(db).paginate(per_page, page).await
    }

    async fn cursor_paginate(
        db: &Database,
        per_page: u64,
        cursor: Option<Value>,
    ) -> ModelResult<CursorPaginator<Self>> {
        Self::query(db).cursor_paginate(per_page, cursor).await
    }
}

impl<M: Model> QueryMethods for M {}
