//! Query Builder read operations
//!
//! Failures on these paths are logged with the SQL text and returned.

use serde_json::Value;

use super::builder::QueryBuilder;
use super::types::*;
use crate::error::{ModelError, ModelResult};

impl<M: Hydrate> QueryBuilder<M> {
    /// Run a compiled read against this builder's connection
    pub(crate) async fn fetch_rows(&self, compiled: &CompiledQuery) -> ModelResult<Vec<Row>> {
        let (db, _) = self.target()?;
        let pool = db.pool().await?;
        pool.fetch_all(&compiled.sql, &compiled.bindings)
            .await
            .map_err(|e| {
                tracing::error!(sql = %compiled.sql, error = %e, "query failed");
                e
            })
    }

    async fn run_get(&self) -> ModelResult<Vec<M>> {
        self.target()?;
        let compiled = self.to_sql()?;
        let rows = self.fetch_rows(&compiled).await?;
        rows.into_iter().map(M::hydrate).collect()
    }

    /// Execute the SELECT and return every row
    pub async fn get(&mut self) -> ModelResult<Vec<M>> {
        let result = self.run_get().await;
        self.reset();
        result
    }

    /// First matching row, or `None`
    pub async fn first(&mut self) -> ModelResult<Option<M>> {
        self.state.limit = Some(1);
        Ok(self.get().await?.into_iter().next())
    }

    /// First matching row, or `ModelError::NotFound`
    pub async fn first_or_fail(&mut self) -> ModelResult<M> {
        let table = self.state.table.clone().unwrap_or_default();
        self.first().await?.ok_or(ModelError::NotFound(table))
    }

    /// Row whose key column equals `id`
    pub async fn find<V: Into<Value>>(&mut self, id: V) -> ModelResult<Option<M>> {
        self.push_basic(M::key_name(), "=", id.into(), Boolean::And);
        self.first().await
    }

    /// Number of matching rows. Leaves the builder state untouched.
    pub async fn count(&mut self) -> ModelResult<u64> {
        self.target()?;
        let compiled = self.compile_count()?;
        let rows = self.fetch_rows(&compiled).await?;
        let count = rows
            .first()
            .and_then(|row| row.get("aggregate"))
            .and_then(Value::as_u64)
            .unwrap_or(0);
        Ok(count)
    }

    async fn run_exists(&self) -> ModelResult<bool> {
        self.target()?;
        let compiled = self.to_sql()?;
        Ok(!self.fetch_rows(&compiled).await?.is_empty())
    }

    /// Whether any row matches
    pub async fn exists(&mut self) -> ModelResult<bool> {
        self.state.limit = Some(1);
        self.state.offset = None;
        let result = self.run_exists().await;
        self.reset();
        result
    }

    async fn run_pluck(&self, column: &str) -> ModelResult<Vec<Value>> {
        let query = self.clone().select([column]);
        query.target()?;
        let compiled = query.to_sql()?;
        let key = column.rsplit('.').next().unwrap_or(column);
        let rows = query.fetch_rows(&compiled).await?;
        Ok(rows
            .into_iter()
            .map(|mut row| row.remove(key).unwrap_or(Value::Null))
            .collect())
    }

    /// Values of one column across the matching rows
    pub async fn pluck(&mut self, column: &str) -> ModelResult<Vec<Value>> {
        let result = self.run_pluck(column).await;
        self.reset();
        result
    }
}
