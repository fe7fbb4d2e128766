//! Query Builder write operations
//!
//! Statement failures are logged and turned into sentinels (`None` for
//! inserts, `0` for updates and deletes) so a batch of writes can carry on
//! past one bad row. Configuration, connection and compilation problems
//! are still returned as errors.

use super::builder::QueryBuilder;
use super::types::*;
use crate::error::{ModelError, ModelResult};

/// Log a failed write and swallow statement errors
fn write_sentinel<T: Default>(sql: &str, result: ModelResult<T>) -> ModelResult<T> {
    match result {
        Err(ModelError::Database(message)) => {
            tracing::error!(sql = %sql, error = %message, "write failed");
            Ok(T::default())
        }
        other => other,
    }
}

impl<M: Hydrate> QueryBuilder<M> {
    async fn run_insert(&self, data: Row) -> ModelResult<Option<i64>> {
        let (db, _) = self.target()?;
        let compiled = self.compile_insert(&data, db.driver())?;
        let pool = db.pool().await?;
        let result = pool
            .insert(&compiled.sql, &compiled.bindings, M::key_name())
            .await
            .map(Some);
        write_sentinel(&compiled.sql, result)
    }

    /// Insert one row and return its generated id, or `None` on failure
    pub async fn insert<D: IntoRow>(&mut self, data: D) -> ModelResult<Option<i64>> {
        let result = match data.into_row() {
            Ok(row) => self.run_insert(row).await,
            Err(e) => Err(e),
        };
        self.reset();
        result
    }

    async fn run_update(&self, data: Row) -> ModelResult<u64> {
        let (db, _) = self.target()?;
        if data.is_empty() {
            return Ok(0);
        }
        let compiled = self.compile_update(&data)?;
        let pool = db.pool().await?;
        let result = pool.execute(&compiled.sql, &compiled.bindings).await;
        write_sentinel(&compiled.sql, result)
    }

    /// Update matching rows; returns the affected count (0 on failure)
    pub async fn update<D: IntoRow>(&mut self, data: D) -> ModelResult<u64> {
        let result = match data.into_row() {
            Ok(row) => self.run_update(row).await,
            Err(e) => Err(e),
        };
        self.reset();
        result
    }

    async fn run_delete(&self) -> ModelResult<u64> {
        let (db, _) = self.target()?;
        let compiled = self.compile_delete()?;
        let pool = db.pool().await?;
        let result = pool.execute(&compiled.sql, &compiled.bindings).await;
        write_sentinel(&compiled.sql, result)
    }

    /// Delete matching rows; returns the affected count (0 on failure)
    pub async fn delete(&mut self) -> ModelResult<u64> {
        let result = self.run_delete().await;
        self.reset();
        result
    }
}
