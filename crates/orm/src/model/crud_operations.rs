//! CRUD Operations - Create, Read, Update, Delete operations for models
//!
//! Write failures come back as sentinels (`SaveResult::Failed`, `None`,
//! `false`, `0`); only configuration and connection problems are errors.

use chrono::Utc;
use serde_json::Value;

use super::attributes::Attributes;
use super::casts::DATETIME_FORMAT;
use super::core_trait::Model;
use super::lifecycle;
use super::query_methods::QueryMethods;
use crate::database::Database;
use crate::error::{ModelError, ModelResult};
use crate::events::ModelEvent;
use crate::query::{IntoRow, Row};

pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

/// Outcome of [`CrudOperations::save`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// Inserted with this generated id
    Created(i64),
    /// Updated; affected row count
    Updated(u64),
    /// Nothing was dirty, no statement ran
    Unchanged,
    /// The statement failed or a listener cancelled the write
    Failed,
}

impl SaveResult {
    pub fn is_success(&self) -> bool {
        !matches!(self, SaveResult::Failed)
    }
}

fn now() -> Value {
    Value::String(Utc::now().naive_utc().format(DATETIME_FORMAT).to_string())
}

/// Trait providing persistence for models
#[allow(async_fn_in_trait)]
pub trait CrudOperations: Model + QueryMethods {
    /// Update the row named by the primary key, or insert when no key is set.
    ///
    /// `updated_at` is stamped before `saving` fires. It does not count as a
    /// change on its own: a save with nothing else dirty runs no statement
    /// and leaves the previous stamp in place.
    async fn save(&mut self, db: &Database) -> ModelResult<SaveResult> {
        let previous_stamp = if Self::uses_timestamps() {
            let previous = self.attributes().get(UPDATED_AT).cloned();
            self.attributes_mut().set(UPDATED_AT, now());
            Some(previous)
        } else {
            None
        };

        if !lifecycle::before(db, ModelEvent::Saving, self).await {
            return Ok(SaveResult::Failed);
        }

        let result = if self.id().is_some() || self.exists() {
            self.perform_update(db).await?
        } else {
            self.perform_insert(db).await?
        };

        match result {
            SaveResult::Created(_) | SaveResult::Updated(_) => {
                self.attributes_mut().sync_original();
                lifecycle::after(db, ModelEvent::Saved, self).await;
            }
            SaveResult::Unchanged => match previous_stamp {
                Some(Some(stamp)) => self.attributes_mut().set(UPDATED_AT, stamp),
                Some(None) => {
                    self.attributes_mut().remove(UPDATED_AT);
                }
                None => {}
            },
            SaveResult::Failed => {}
        }
        Ok(result)
    }

    #[doc(hidden)]
    async fn perform_update(&mut self, db: &Database) -> ModelResult<SaveResult> {
        let changed = self
            .dirty()
            .keys()
            .any(|key| key != UPDATED_AT || !Self::uses_timestamps());
        if !changed {
            return Ok(SaveResult::Unchanged);
        }
        let Some(id) = self.id() else {
            tracing::warn!(model = Self::table_name(), "stored model has no primary key");
            return Ok(SaveResult::Failed);
        };
        if !lifecycle::before(db, ModelEvent::Updating, self).await {
            return Ok(SaveResult::Failed);
        }
        let mut dirty = self.dirty();
        if Self::uses_timestamps() {
            // written even when equal to the stored stamp (same-second saves)
            let stamp = self.attributes().get(UPDATED_AT).cloned().unwrap_or_else(now);
            dirty.insert(UPDATED_AT.to_string(), stamp);
        }

        let rows = Self::query(db)
            .where_eq(Self::primary_key_name(), id)
            .update(dirty)
            .await?;
        if rows == 0 {
            return Ok(SaveResult::Failed);
        }

        self.attributes_mut().set_exists(true);
        lifecycle::after(db, ModelEvent::Updated, self).await;
        Ok(SaveResult::Updated(rows))
    }

    #[doc(hidden)]
    async fn perform_insert(&mut self, db: &Database) -> ModelResult<SaveResult> {
        if !lifecycle::before(db, ModelEvent::Creating, self).await {
            return Ok(SaveResult::Failed);
        }
        if Self::uses_timestamps() {
            let stamp = self
                .attributes()
                .get(UPDATED_AT)
                .filter(|value| !value.is_null())
                .cloned()
                .unwrap_or_else(now);
            if self.attributes().get(CREATED_AT).map_or(true, Value::is_null) {
                self.attributes_mut().set(CREATED_AT, stamp.clone());
            }
            self.attributes_mut().set(UPDATED_AT, stamp);
        }

        let values = self.attributes().values().clone();
        let Some(id) = Self::query(db).insert(values).await? else {
            return Ok(SaveResult::Failed);
        };

        let attributes = self.attributes_mut();
        attributes.set(Self::primary_key_name(), Value::from(id));
        attributes.set_exists(true);
        lifecycle::after(db, ModelEvent::Created, self).await;
        Ok(SaveResult::Created(id))
    }

    /// Fill and save a new instance; `None` when the save failed
    async fn create<D: IntoRow>(db: &Database, data: D) -> ModelResult<Option<Self>> {
        let mut model = Self::make(data)?;
        match model.save(db).await? {
            SaveResult::Created(_) => Ok(Some(model)),
            _ => Ok(None),
        }
    }

    /// Find a model by its primary key
    async fn find<V: Into<Value>>(db: &Database, id: V) -> ModelResult<Option<Self>> {
        Self::query(db).find(id).await
    }

    /// Find a model by its primary key or return an error if not found
    async fn find_or_fail<V: Into<Value>>(db: &Database, id: V) -> ModelResult<Self> {
        Self::find(db, id)
            .await?
            .ok_or_else(|| ModelError::NotFound(Self::table_name().to_string()))
    }

    /// Delete this instance by primary key. Returns whether a row was removed.
    async fn delete(&mut self, db: &Database) -> ModelResult<bool> {
        let Some(id) = self.id().filter(|_| self.exists()) else {
            return Ok(false);
        };
        if !lifecycle::before(db, ModelEvent::Deleting, self).await {
            return Ok(false);
        }

        let rows = Self::query(db)
            .where_eq(Self::primary_key_name(), id)
            .delete()
            .await?;
        if rows == 0 {
            return Ok(false);
        }

        self.attributes_mut().set_exists(false);
        lifecycle::after(db, ModelEvent::Deleted, self).await;
        Ok(true)
    }

    /// Delete the given keys one model at a time, firing delete events.
    /// Returns how many were removed.
    async fn destroy<I, V>(db: &Database, ids: I) -> ModelResult<u64>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let ids: Vec<Value> = ids.into_iter().map(Into::into).collect();
        if ids.is_empty() {
            return Ok(0);
        }

        let models = Self::query(db)
            .where_in(Self::primary_key_name(), ids)
            .get()
            .await?;
        let mut removed = 0;
        for mut model in models {
            if model.delete(db).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Reload attributes from the stored row. False when the row is gone.
    async fn refresh(&mut self, db: &Database) -> ModelResult<bool> {
        let Some(id) = self.id() else {
            return Ok(false);
        };
        let row: Option<Row> = db
            .table(Self::table_name())
            .where_eq(Self::primary_key_name(), id)
            .first()
            .await?;

        match row {
            Some(row) => {
                *self.attributes_mut() = Attributes::from_row(row);
                Ok(true)
            }
            None => {
                self.attributes_mut().set_exists(false);
                Ok(false)
            }
        }
    }
}

impl<M: Model> CrudOperations for M {}
