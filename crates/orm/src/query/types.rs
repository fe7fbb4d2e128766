//! Query Builder Types - Core types and enums for query building

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde_json::Value;

use crate::error::{ModelError, ModelResult};

/// A raw result row: column name to value
pub type Row = serde_json::Map<String, Value>;

/// Comparison operators accepted by `where_` / `or_where`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOperator {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Like,
    NotLike,
}

impl QueryOperator {
    /// Parse an operator token. Anything outside the known set is rejected
    /// so that the token can be spliced into SQL verbatim.
    pub fn parse(operator: &str) -> Option<Self> {
        let normalized = operator
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_uppercase();
        match normalized.as_str() {
            "=" => Some(QueryOperator::Equal),
            "!=" | "<>" => Some(QueryOperator::NotEqual),
            ">" => Some(QueryOperator::GreaterThan),
            ">=" => Some(QueryOperator::GreaterThanOrEqual),
            "<" => Some(QueryOperator::LessThan),
            "<=" => Some(QueryOperator::LessThanOrEqual),
            "LIKE" => Some(QueryOperator::Like),
            "NOT LIKE" => Some(QueryOperator::NotLike),
            _ => None,
        }
    }
}

impl fmt::Display for QueryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryOperator::Equal => write!(f, "="),
            QueryOperator::NotEqual => write!(f, "!="),
            QueryOperator::GreaterThan => write!(f, ">"),
            QueryOperator::GreaterThanOrEqual => write!(f, ">="),
            QueryOperator::LessThan => write!(f, "<"),
            QueryOperator::LessThanOrEqual => write!(f, "<="),
            QueryOperator::Like => write!(f, "LIKE"),
            QueryOperator::NotLike => write!(f, "NOT LIKE"),
        }
    }
}

/// Keyword joining a condition to the one before it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boolean {
    And,
    Or,
}

impl fmt::Display for Boolean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Boolean::And => write!(f, "AND"),
            Boolean::Or => write!(f, "OR"),
        }
    }
}

/// Order by direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    /// Case-insensitive parse; anything other than `desc` is ascending
    pub fn coerce(direction: &str) -> Self {
        if direction.trim().eq_ignore_ascii_case("desc") {
            OrderDirection::Desc
        } else {
            OrderDirection::Asc
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderDirection::Asc => write!(f, "ASC"),
            OrderDirection::Desc => write!(f, "DESC"),
        }
    }
}

/// One entry of the WHERE clause, kept in insertion order
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Basic {
        column: String,
        operator: QueryOperator,
        value: Value,
        boolean: Boolean,
    },
    In {
        column: String,
        values: Vec<Value>,
        boolean: Boolean,
    },
    Between {
        column: String,
        low: Value,
        high: Value,
        boolean: Boolean,
    },
    Raw {
        sql: String,
        bindings: Vec<Value>,
        boolean: Boolean,
    },
    /// Conditions produced by a detached sub-builder
    Nested {
        conditions: Vec<Condition>,
        boolean: Boolean,
    },
}

impl Condition {
    pub fn boolean(&self) -> Boolean {
        match self {
            Condition::Basic { boolean, .. }
            | Condition::In { boolean, .. }
            | Condition::Between { boolean, .. }
            | Condition::Raw { boolean, .. }
            | Condition::Nested { boolean, .. } => *boolean,
        }
    }
}

/// Compiled SQL text and its positional bindings
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub bindings: Vec<Value>,
}

impl CompiledQuery {
    pub fn new(sql: String, bindings: Vec<Value>) -> Self {
        Self { sql, bindings }
    }
}

/// Conversion of insert/update payloads into a column map
pub trait IntoRow {
    fn into_row(self) -> ModelResult<Row>;
}

impl IntoRow for Row {
    fn into_row(self) -> ModelResult<Row> {
        Ok(self)
    }
}

impl IntoRow for Value {
    fn into_row(self) -> ModelResult<Row> {
        match self {
            Value::Object(map) => Ok(map),
            other => Err(ModelError::Query(format!(
                "expected a JSON object of column values, got {}",
                other
            ))),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> IntoRow for Vec<(K, V)> {
    fn into_row(self) -> ModelResult<Row> {
        Ok(self
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect())
    }
}

impl<V: Into<Value>> IntoRow for HashMap<String, V> {
    fn into_row(self) -> ModelResult<Row> {
        Ok(self.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<V: Into<Value>> IntoRow for BTreeMap<String, V> {
    fn into_row(self) -> ModelResult<Row> {
        Ok(self.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

/// Conversion of raw rows into the builder's result type
pub trait Hydrate: Sized + Send {
    fn hydrate(row: Row) -> ModelResult<Self>;

    /// Column holding the generated key and the default cursor column
    fn key_name() -> &'static str {
        "id"
    }

    /// Value of a column on an already hydrated item
    fn column_value(&self, column: &str) -> Option<Value>;

    /// Serializable view of the item
    fn to_row(&self) -> Row;
}

impl Hydrate for Row {
    fn hydrate(row: Row) -> ModelResult<Self> {
        Ok(row)
    }

    fn column_value(&self, column: &str) -> Option<Value> {
        self.get(column).cloned()
    }

    fn to_row(&self) -> Row {
        self.clone()
    }
}
