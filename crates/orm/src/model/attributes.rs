//! Attribute storage with change tracking

use serde_json::Value;

use crate::query::Row;

/// Current attribute values plus the snapshot taken at the last load or save
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    values: Row,
    original: Row,
    exists: bool,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attributes loaded from a stored row: clean and persisted
    pub fn from_row(row: Row) -> Self {
        Self {
            original: row.clone(),
            values: row,
            exists: true,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Write without any mass-assignment checks
    pub fn set(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn values(&self) -> &Row {
        &self.values
    }

    pub fn original(&self) -> &Row {
        &self.original
    }

    /// Attributes that are new or differ from the snapshot
    pub fn dirty(&self) -> Row {
        self.values
            .iter()
            .filter(|(key, value)| self.original.get(key.as_str()) != Some(*value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    pub fn is_dirty(&self) -> bool {
        self.values
            .iter()
            .any(|(key, value)| self.original.get(key.as_str()) != Some(value))
    }

    pub fn is_attribute_dirty(&self, key: &str) -> bool {
        self.values.get(key) != self.original.get(key)
    }

    /// Take a new snapshot of the current values
    pub fn sync_original(&mut self) {
        self.original = self.values.clone();
    }

    /// Whether the row is known to be stored
    pub fn exists(&self) -> bool {
        self.exists
    }

    pub fn set_exists(&mut self, exists: bool) {
        self.exists = exists;
    }
}
