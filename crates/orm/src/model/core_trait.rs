//! Core Model Trait - Base definition for database entities
//!
//! Defines table metadata, mass-assignment rules, casts and attribute
//! access. Persistence lives in `crud_operations`, query proxies in
//! `query_methods`.

use chrono::NaiveDateTime;
use serde_json::Value;

use super::attributes::Attributes;
use super::casts::{parse_datetime, Cast};
use crate::error::{ModelError, ModelResult};
use crate::query::{Hydrate, IntoRow, Row};

/// Core trait for Active-Record models.
///
/// Implementors store an [`Attributes`] value and declare their table;
/// everything else has a default.
///
/// ```ignore
/// struct User { attributes: Attributes }
///
/// impl Model for User {
///     fn table_name() -> &'static str { "users" }
///     fn fillable() -> &'static [&'static str] { &["name", "email", "active"] }
///     fn casts() -> &'static [(&'static str, Cast)] { &[("active", Cast::Bool)] }
///     fn attributes(&self) -> &Attributes { &self.attributes }
///     fn attributes_mut(&mut self) -> &mut Attributes { &mut self.attributes }
///     fn from_attributes(attributes: Attributes) -> Self { Self { attributes } }
/// }
/// ```
pub trait Model: Sized + Send + Sync + 'static {
    /// Table name for this model
    fn table_name() -> &'static str;

    /// Primary key column
    fn primary_key_name() -> &'static str {
        "id"
    }

    /// Keys `fill` may write; empty allows every key not guarded
    fn fillable() -> &'static [&'static str] {
        &[]
    }

    /// Keys `fill` skips and `set` rejects
    fn guarded() -> &'static [&'static str] {
        &[]
    }

    /// Keys left out of `to_array`
    fn hidden() -> &'static [&'static str] {
        &[]
    }

    fn casts() -> &'static [(&'static str, Cast)] {
        &[]
    }

    /// Keys cast as datetimes without an explicit cast entry
    fn dates() -> &'static [&'static str] {
        &[]
    }

    /// Maintain `created_at` / `updated_at`
    fn uses_timestamps() -> bool {
        true
    }

    fn attributes(&self) -> &Attributes;

    fn attributes_mut(&mut self) -> &mut Attributes;

    fn from_attributes(attributes: Attributes) -> Self;

    /// Computed attribute, consulted when `name` is not stored
    fn accessor(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Declared property, consulted after accessors
    fn property(&self, _name: &str) -> Option<Value> {
        None
    }

    fn new() -> Self {
        Self::from_attributes(Attributes::new())
    }

    /// New instance filled from `data`
    fn make<D: IntoRow>(data: D) -> ModelResult<Self> {
        let mut model = Self::new();
        model.fill(data)?;
        Ok(model)
    }

    fn is_fillable(key: &str) -> bool {
        let fillable = Self::fillable();
        (fillable.is_empty() || fillable.contains(&key)) && !Self::is_guarded(key)
    }

    fn is_guarded(key: &str) -> bool {
        Self::guarded().contains(&key)
    }

    fn cast_for(key: &str) -> Option<Cast> {
        Self::casts()
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, cast)| *cast)
            .or_else(|| Self::dates().contains(&key).then_some(Cast::DateTime))
    }

    fn cast_attribute(key: &str, value: &Value) -> Value {
        match Self::cast_for(key) {
            Some(cast) => cast.apply(value),
            None => value.clone(),
        }
    }

    /// Mass-assign `data`, silently skipping keys that are not fillable
    fn fill<D: IntoRow>(&mut self, data: D) -> ModelResult<&mut Self> {
        for (key, value) in data.into_row()? {
            if Self::is_fillable(&key) {
                self.attributes_mut().set(&key, value);
            } else {
                tracing::debug!(model = Self::table_name(), key = %key, "skipping non-fillable attribute");
            }
        }
        Ok(self)
    }

    /// Attribute (cast), then accessor, then property, else null
    fn get(&self, name: &str) -> Value {
        if let Some(value) = self.attributes().get(name) {
            return Self::cast_attribute(name, value);
        }
        self.accessor(name)
            .or_else(|| self.property(name))
            .unwrap_or(Value::Null)
    }

    /// Write one attribute; guarded keys are rejected
    fn set<V: Into<Value>>(&mut self, name: &str, value: V) -> ModelResult<()> {
        if Self::is_guarded(name) {
            return Err(ModelError::ForbiddenAttribute(name.to_string()));
        }
        self.attributes_mut().set(name, value.into());
        Ok(())
    }

    /// Primary key value, if set and not null
    fn id(&self) -> Option<Value> {
        self.attributes()
            .get(Self::primary_key_name())
            .filter(|value| !value.is_null())
            .cloned()
    }

    /// Whether this instance has been stored
    fn exists(&self) -> bool {
        self.attributes().exists()
    }

    fn is_dirty(&self) -> bool {
        self.attributes().is_dirty()
    }

    fn dirty(&self) -> Row {
        self.attributes().dirty()
    }

    /// Attribute parsed as a timestamp
    fn get_datetime(&self, name: &str) -> Option<NaiveDateTime> {
        self.attributes().get(name).and_then(parse_datetime)
    }

    /// Visible attributes with casts applied
    fn to_array(&self) -> Row {
        let hidden = Self::hidden();
        self.attributes()
            .values()
            .iter()
            .filter(|(key, _)| !hidden.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), Self::cast_attribute(key, value)))
            .collect()
    }

    fn to_json(&self) -> ModelResult<String> {
        Ok(serde_json::to_string(&self.to_array())?)
    }
}

impl<M: Model> Hydrate for M {
    fn hydrate(row: Row) -> ModelResult<Self> {
        Ok(M::from_attributes(Attributes::from_row(row)))
    }

    fn key_name() -> &'static str {
        M::primary_key_name()
    }

    fn column_value(&self, column: &str) -> Option<Value> {
        self.attributes().get(column).cloned()
    }

    fn to_row(&self) -> Row {
        self.to_array()
    }
}
