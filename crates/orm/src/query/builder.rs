//! Query Builder - Core builder implementation

use std::fmt;
use std::marker::PhantomData;

use serde_json::Value;

use super::types::*;
use crate::database::Database;
use crate::error::{ModelError, ModelResult};
use crate::security::validate_identifier;

/// Largest LIMIT or OFFSET a driver accepts as a signed 64-bit integer
pub(crate) const MAX_ROWS: u64 = i64::MAX as u64;

/// Everything a builder accumulates between terminal operations
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    pub table: Option<String>,
    pub columns: Vec<String>,
    pub conditions: Vec<Condition>,
    pub orders: Vec<(String, OrderDirection)>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    /// First invalid input seen; reported by the next terminal operation
    pub error: Option<String>,
}

impl QueryState {
    pub fn new(table: Option<String>) -> Self {
        Self {
            table,
            columns: vec!["*".to_string()],
            conditions: Vec::new(),
            orders: Vec::new(),
            limit: None,
            offset: None,
            error: None,
        }
    }
}

impl Default for QueryState {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Fluent SQL builder.
///
/// Chaining methods consume and return the builder. Terminal operations
/// (`get`, `first`, `insert`, `update`, `delete`, `paginate`, ...) borrow it
/// mutably, run one statement and reset the accumulated state, so one
/// builder can be reused for several queries against its table. `count`
/// is the exception: it leaves the state untouched.
///
/// `M` is the row type produced by reads: raw [`Row`] maps by default, or
/// a model type when the builder was created through a model.
pub struct QueryBuilder<M = Row> {
    pub(crate) db: Option<Database>,
    pub(crate) bound_table: Option<String>,
    pub(crate) state: QueryState,
    _phantom: PhantomData<fn() -> M>,
}

impl<M> Clone for QueryBuilder<M> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            bound_table: self.bound_table.clone(),
            state: self.state.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<M> fmt::Debug for QueryBuilder<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("db", &self.db)
            .field("bound_table", &self.bound_table)
            .field("state", &self.state)
            .finish()
    }
}

impl<M> QueryBuilder<M> {
    /// Create a builder with no table; set one with [`QueryBuilder::table`]
    pub fn new(db: Database) -> Self {
        Self::from_parts(Some(db), None)
    }

    /// Create a builder that returns to `table` after each terminal operation
    pub fn bound(db: Database, table: &str) -> Self {
        Self::from_parts(Some(db), Some(table.to_string()))
    }

    /// A builder without a connection, used for nested groups and for
    /// compiling SQL without running it
    pub fn detached() -> Self {
        Self::from_parts(None, None)
    }

    fn from_parts(db: Option<Database>, table: Option<String>) -> Self {
        let mut builder = Self {
            db,
            bound_table: table.clone(),
            state: QueryState::new(table.clone()),
            _phantom: PhantomData,
        };
        if let Some(table) = table {
            builder.check_identifier(&table);
        }
        builder
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn database(&self) -> Option<&Database> {
        self.db.as_ref()
    }

    /// Discard accumulated state, keeping the bound table
    pub fn reset(&mut self) {
        self.state = QueryState::new(self.bound_table.clone());
    }

    pub(crate) fn record_error(&mut self, message: String) {
        tracing::warn!(error = %message, "invalid query builder input");
        if self.state.error.is_none() {
            self.state.error = Some(message);
        }
    }

    /// Validate an identifier, recording the failure on the builder
    pub(crate) fn check_identifier(&mut self, identifier: &str) -> bool {
        match validate_identifier(identifier) {
            Ok(()) => true,
            Err(e) => {
                self.record_error(e.to_string());
                false
            }
        }
    }

    /// Connection and table needed by every terminal operation
    pub(crate) fn target(&self) -> ModelResult<(&Database, &str)> {
        if let Some(error) = &self.state.error {
            return Err(ModelError::Query(error.clone()));
        }
        let db = self.db.as_ref().ok_or_else(|| {
            ModelError::Configuration("builder has no database connection".to_string())
        })?;
        let table = self
            .state
            .table
            .as_deref()
            .ok_or_else(|| ModelError::Query("no table specified".to_string()))?;
        Ok((db, table))
    }

    pub(crate) fn push_condition(&mut self, condition: Condition) {
        self.state.conditions.push(condition);
    }

    pub(crate) fn push_basic(&mut self, column: &str, operator: &str, value: Value, boolean: Boolean) {
        let Some(operator) = QueryOperator::parse(operator) else {
            self.record_error(format!("unsupported operator '{}'", operator));
            return;
        };
        if self.check_identifier(column) {
            self.push_condition(Condition::Basic {
                column: column.to_string(),
                operator,
                value,
                boolean,
            });
        }
    }
}
