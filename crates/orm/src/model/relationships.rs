//! Single-level relationship lookups

use super::core_trait::Model;
use super::query_methods::QueryMethods;
use crate::database::Database;
use crate::error::ModelResult;

/// Relationship helpers. A null linking key short-circuits without a query.
#[allow(async_fn_in_trait)]
pub trait Relationships: Model {
    /// Rows of `R` whose `foreign_key` equals this model's `local_key`
    async fn has_many<R: Model>(
        &self,
        db: &Database,
        foreign_key: &str,
        local_key: &str,
    ) -> ModelResult<Vec<R>> {
        match self.attributes().get(local_key).filter(|v| !v.is_null()) {
            Some(key) => R::query(db).where_eq(foreign_key, key.clone()).get().await,
            None => Ok(Vec::new()),
        }
    }

    /// The `R` whose `owner_key` equals this model's `foreign_key`
    async fn belongs_to<R: Model>(
        &self,
        db: &Database,
        foreign_key: &str,
        owner_key: &str,
    ) -> ModelResult<Option<R>> {
        match self.attributes().get(foreign_key).filter(|v| !v.is_null()) {
            Some(key) => R::query(db).where_eq(owner_key, key.clone()).first().await,
            None => Ok(None),
        }
    }
}

impl<M: Model> Relationships for M {}
