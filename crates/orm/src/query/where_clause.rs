//! Query Builder WHERE clause operations

use serde_json::Value;

use super::builder::QueryBuilder;
use super::types::*;

impl<M> QueryBuilder<M> {
    /// Add `column <operator> ?`, joined with AND
    pub fn where_<V: Into<Value>>(mut self, column: &str, operator: &str, value: V) -> Self {
        self.push_basic(column, operator, value.into(), Boolean::And);
        self
    }

    /// Add `column <operator> ?`, joined with OR
    pub fn or_where<V: Into<Value>>(mut self, column: &str, operator: &str, value: V) -> Self {
        self.push_basic(column, operator, value.into(), Boolean::Or);
        self
    }

    /// Two-argument form of [`QueryBuilder::where_`] with `=`
    pub fn where_eq<V: Into<Value>>(self, column: &str, value: V) -> Self {
        self.where_(column, "=", value)
    }

    pub fn or_where_eq<V: Into<Value>>(self, column: &str, value: V) -> Self {
        self.or_where(column, "=", value)
    }

    pub fn where_in<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.add_in(column, values, Boolean::And)
    }

    pub fn or_where_in<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.add_in(column, values, Boolean::Or)
    }

    fn add_in<I, V>(mut self, column: &str, values: I, boolean: Boolean) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        if self.check_identifier(column) {
            self.push_condition(Condition::In {
                column: column.to_string(),
                values: values.into_iter().map(Into::into).collect(),
                boolean,
            });
        }
        self
    }

    pub fn where_between<L: Into<Value>, H: Into<Value>>(self, column: &str, low: L, high: H) -> Self {
        self.add_between(column, low.into(), high.into(), Boolean::And)
    }

    pub fn or_where_between<L: Into<Value>, H: Into<Value>>(
        self,
        column: &str,
        low: L,
        high: H,
    ) -> Self {
        self.add_between(column, low.into(), high.into(), Boolean::Or)
    }

    fn add_between(mut self, column: &str, low: Value, high: Value, boolean: Boolean) -> Self {
        if self.check_identifier(column) {
            self.push_condition(Condition::Between {
                column: column.to_string(),
                low,
                high,
                boolean,
            });
        }
        self
    }

    /// Add a caller-written fragment with its own `?` bindings.
    ///
    /// The fragment is wrapped in parentheses; the placeholder count must
    /// match `bindings`.
    pub fn where_raw(mut self, sql: &str, bindings: Vec<Value>) -> Self {
        self.push_condition(Condition::Raw {
            sql: sql.to_string(),
            bindings,
            boolean: Boolean::And,
        });
        self
    }

    pub fn or_where_raw(mut self, sql: &str, bindings: Vec<Value>) -> Self {
        self.push_condition(Condition::Raw {
            sql: sql.to_string(),
            bindings,
            boolean: Boolean::Or,
        });
        self
    }

    pub fn where_null(self, column: &str) -> Self {
        self.add_null_check(column, "IS NULL")
    }

    pub fn where_not_null(self, column: &str) -> Self {
        self.add_null_check(column, "IS NOT NULL")
    }

    fn add_null_check(mut self, column: &str, check: &str) -> Self {
        if self.check_identifier(column) {
            self.push_condition(Condition::Raw {
                sql: format!("{} {}", column, check),
                bindings: Vec::new(),
                boolean: Boolean::And,
            });
        }
        self
    }

    /// Group conditions in parentheses, joined with AND.
    ///
    /// The closure receives a fresh detached builder; only its conditions
    /// are kept.
    pub fn where_nested<F>(self, build: F) -> Self
    where
        F: FnOnce(QueryBuilder<M>) -> QueryBuilder<M>,
    {
        self.add_nested(build, Boolean::And)
    }

    pub fn or_where_nested<F>(self, build: F) -> Self
    where
        F: FnOnce(QueryBuilder<M>) -> QueryBuilder<M>,
    {
        self.add_nested(build, Boolean::Or)
    }

    fn add_nested<F>(mut self, build: F, boolean: Boolean) -> Self
    where
        F: FnOnce(QueryBuilder<M>) -> QueryBuilder<M>,
    {
        let group = build(QueryBuilder::detached()).state;
        if let Some(error) = group.error {
            self.record_error(error);
        }
        self.push_condition(Condition::Nested {
            conditions: group.conditions,
            boolean,
        });
        self
    }
}
