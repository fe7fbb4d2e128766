//! Query Builder SQL generation
//!
//! Each condition writes its SQL fragment and pushes its bindings in the
//! same step, so placeholders and values cannot drift apart.

use serde_json::Value;

use super::builder::{QueryBuilder, MAX_ROWS};
use super::types::*;
use crate::config::Driver;
use crate::error::{ModelError, ModelResult};
use crate::security::{count_placeholders, validate_identifier};

/// Compile `conditions` joined by their booleans. Returns false when
/// nothing was emitted (no conditions, or only empty groups).
fn compile_conditions(
    conditions: &[Condition],
    sql: &mut String,
    bindings: &mut Vec<Value>,
) -> ModelResult<bool> {
    let mut emitted = false;

    for condition in conditions {
        let fragment = match condition {
            Condition::Basic {
                column,
                operator,
                value,
                ..
            } => match (operator, value) {
                (QueryOperator::Equal, Value::Null) => format!("{} IS NULL", column),
                (QueryOperator::NotEqual, Value::Null) => format!("{} IS NOT NULL", column),
                _ => {
                    bindings.push(value.clone());
                    format!("{} {} ?", column, operator)
                }
            },
            Condition::In { column, values, .. } => {
                if values.is_empty() {
                    "1 = 0".to_string()
                } else {
                    bindings.extend(values.iter().cloned());
                    format!("{} IN ({})", column, vec!["?"; values.len()].join(", "))
                }
            }
            Condition::Between {
                column, low, high, ..
            } => {
                bindings.push(low.clone());
                bindings.push(high.clone());
                format!("{} BETWEEN ? AND ?", column)
            }
            Condition::Raw {
                sql: raw,
                bindings: raw_bindings,
                ..
            } => {
                let expected = count_placeholders(raw);
                if expected != raw_bindings.len() {
                    return Err(ModelError::Query(format!(
                        "raw condition '{}' has {} placeholders but {} bindings",
                        raw,
                        expected,
                        raw_bindings.len()
                    )));
                }
                bindings.extend(raw_bindings.iter().cloned());
                format!("({})", raw)
            }
            Condition::Nested { conditions, .. } => {
                let mut inner = String::new();
                if !compile_conditions(conditions, &mut inner, bindings)? {
                    continue;
                }
                format!("({})", inner)
            }
        };

        if emitted {
            sql.push(' ');
            sql.push_str(&condition.boolean().to_string());
            sql.push(' ');
        }
        sql.push_str(&fragment);
        emitted = true;
    }

    Ok(emitted)
}

impl<M> QueryBuilder<M> {
    /// Table to compile against, or the first recorded input error
    fn compile_table(&self) -> ModelResult<&str> {
        if let Some(error) = &self.state.error {
            return Err(ModelError::Query(error.clone()));
        }
        self.state
            .table
            .as_deref()
            .ok_or_else(|| ModelError::Query("no table specified".to_string()))
    }

    fn compile_where(&self, sql: &mut String, bindings: &mut Vec<Value>) -> ModelResult<()> {
        let mut clause = String::new();
        if compile_conditions(&self.state.conditions, &mut clause, bindings)? {
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
        }
        Ok(())
    }

    /// Compile the SELECT this builder would run, without running it
    pub fn to_sql(&self) -> ModelResult<CompiledQuery> {
        let table = self.compile_table()?;
        let mut sql = format!("SELECT {} FROM {}", self.state.columns.join(", "), table);
        let mut bindings = Vec::new();

        self.compile_where(&mut sql, &mut bindings)?;

        if !self.state.orders.is_empty() {
            let orders: Vec<String> = self
                .state
                .orders
                .iter()
                .map(|(column, direction)| format!("{} {}", column, direction))
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&orders.join(", "));
        }

        if let Some(limit) = self.state.limit {
            sql.push_str(" LIMIT ?");
            bindings.push(Value::from(limit.min(MAX_ROWS)));
            if let Some(offset) = self.state.offset {
                sql.push_str(" OFFSET ?");
                bindings.push(Value::from(offset.min(MAX_ROWS)));
            }
        }

        Ok(CompiledQuery::new(sql, bindings))
    }

    /// `SELECT COUNT(*)` over the current conditions; columns, order,
    /// limit and offset are ignored
    pub(crate) fn compile_count(&self) -> ModelResult<CompiledQuery> {
        let table = self.compile_table()?;
        let mut sql = format!("SELECT COUNT(*) AS aggregate FROM {}", table);
        let mut bindings = Vec::new();
        self.compile_where(&mut sql, &mut bindings)?;
        Ok(CompiledQuery::new(sql, bindings))
    }

    pub(crate) fn compile_insert(&self, data: &Row, driver: Driver) -> ModelResult<CompiledQuery> {
        let table = self.compile_table()?;

        if data.is_empty() {
            let sql = match driver {
                Driver::Mysql => format!("INSERT INTO {} () VALUES ()", table),
                Driver::Sqlite | Driver::Postgres => format!("INSERT INTO {} DEFAULT VALUES", table),
            };
            return Ok(CompiledQuery::new(sql, Vec::new()));
        }

        let mut columns = Vec::with_capacity(data.len());
        let mut bindings = Vec::with_capacity(data.len());
        for (column, value) in data {
            validate_identifier(column)?;
            columns.push(column.as_str());
            bindings.push(value.clone());
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            columns.join(", "),
            vec!["?"; columns.len()].join(", ")
        );
        Ok(CompiledQuery::new(sql, bindings))
    }

    pub(crate) fn compile_update(&self, data: &Row) -> ModelResult<CompiledQuery> {
        let table = self.compile_table()?;

        let mut assignments = Vec::with_capacity(data.len());
        let mut bindings = Vec::with_capacity(data.len());
        for (column, value) in data {
            validate_identifier(column)?;
            assignments.push(format!("{} = ?", column));
            bindings.push(value.clone());
        }

        let mut sql = format!("UPDATE {} SET {}", table, assignments.join(", "));
        self.compile_where(&mut sql, &mut bindings)?;
        Ok(CompiledQuery::new(sql, bindings))
    }

    pub(crate) fn compile_delete(&self) -> ModelResult<CompiledQuery> {
        let table = self.compile_table()?;
        let mut sql = format!("DELETE FROM {}", table);
        let mut bindings = Vec::new();
        self.compile_where(&mut sql, &mut bindings)?;
        Ok(CompiledQuery::new(sql, bindings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn users() -> QueryBuilder<Row> {
        QueryBuilder::detached().table("users")
    }

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_plain_select() {
        let compiled = users().to_sql().unwrap();
        assert_eq!(compiled.sql, "SELECT * FROM users");
        assert!(compiled.bindings.is_empty());
    }

    #[test]
    fn test_first_condition_has_no_boolean() {
        let compiled = users()
            .or_where_eq("email", "a@b.com")
            .or_where_eq("email", "c@d.com")
            .to_sql()
            .unwrap();
        assert_eq!(compiled.sql, "SELECT * FROM users WHERE email = ? OR email = ?");
        assert_eq!(compiled.bindings, vec![json!("a@b.com"), json!("c@d.com")]);
    }

    #[test]
    fn test_oversized_limit_and_offset_bind_as_integers() {
        let mut query = users();
        query.state.limit = Some(u64::MAX);
        query.state.offset = Some(u64::MAX);
        let compiled = query.to_sql().unwrap();
        assert_eq!(compiled.sql, "SELECT * FROM users LIMIT ? OFFSET ?");
        assert_eq!(compiled.bindings, vec![json!(i64::MAX), json!(i64::MAX)]);
        assert!(compiled.bindings.iter().all(Value::is_i64));
    }

    #[test]
    fn test_mixed_conditions_bind_in_placeholder_order() {
        let compiled = users()
            .select(["id", "email"])
            .where_("age", ">", 18)
            .where_in("role", ["admin", "editor"])
            .or_where_between("score", 10, 20)
            .where_raw("lower(name) = ?", vec![json!("bob")])
            .where_nested(|q| q.where_eq("a", 1).or_where_in("b", [2, 3]))
            .order_by("id", "desc")
            .limit(10)
            .offset(20)
            .to_sql()
            .unwrap();

        assert_eq!(
            compiled.sql,
            "SELECT id, email FROM users WHERE age > ? AND role IN (?, ?) \
             OR score BETWEEN ? AND ? AND (lower(name) = ?) AND (a = ? OR b IN (?, ?)) \
             ORDER BY id DESC LIMIT ? OFFSET ?"
        );
        assert_eq!(
            compiled.bindings,
            vec![
                json!(18),
                json!("admin"),
                json!("editor"),
                json!(10),
                json!(20),
                json!("bob"),
                json!(1),
                json!(2),
                json!(3),
                json!(10),
                json!(20)
            ]
        );
        assert_eq!(count_placeholders(&compiled.sql), compiled.bindings.len());
    }

    #[test]
    fn test_empty_in_is_always_false() {
        let compiled = users().where_in("id", Vec::<i64>::new()).to_sql().unwrap();
        assert_eq!(compiled.sql, "SELECT * FROM users WHERE 1 = 0");
        assert!(!compiled.sql.contains("IN ()"));
        assert!(compiled.bindings.is_empty());
    }

    #[test]
    fn test_empty_nested_group_is_skipped() {
        let compiled = users()
            .where_nested(|q| q)
            .or_where_eq("id", 1)
            .to_sql()
            .unwrap();
        assert_eq!(compiled.sql, "SELECT * FROM users WHERE id = ?");
    }

    #[test]
    fn test_null_comparisons() {
        let compiled = users()
            .where_eq("deleted_at", Value::Null)
            .where_("email", "!=", Value::Null)
            .where_not_null("name")
            .to_sql()
            .unwrap();
        assert_eq!(
            compiled.sql,
            "SELECT * FROM users WHERE deleted_at IS NULL AND email IS NOT NULL AND (name IS NOT NULL)"
        );
        assert!(compiled.bindings.is_empty());
    }

    #[test]
    fn test_offset_requires_limit() {
        let compiled = users().offset(5).to_sql().unwrap();
        assert_eq!(compiled.sql, "SELECT * FROM users");
    }

    #[test]
    fn test_raw_placeholder_mismatch() {
        let err = users()
            .where_raw("a = ? AND b = ?", vec![json!(1)])
            .to_sql()
            .unwrap_err();
        assert!(matches!(err, ModelError::Query(_)));
    }

    #[test]
    fn test_count_ignores_columns_order_and_limit() {
        let query = users()
            .select(["id"])
            .where_between("age", 18, 30)
            .order_by("id", "asc")
            .limit(5);
        let compiled = query.compile_count().unwrap();
        assert_eq!(
            compiled.sql,
            "SELECT COUNT(*) AS aggregate FROM users WHERE age BETWEEN ? AND ?"
        );
        assert_eq!(compiled.bindings, vec![json!(18), json!(30)]);
        assert_eq!(query.state().limit, Some(5));
    }

    #[test]
    fn test_insert_update_delete() {
        let compiled = users()
            .compile_insert(&row(json!({"age": 3, "email": "a@b.com"})), Driver::Sqlite)
            .unwrap();
        assert_eq!(compiled.sql, "INSERT INTO users (age, email) VALUES (?, ?)");
        assert_eq!(compiled.bindings, vec![json!(3), json!("a@b.com")]);

        let compiled = users().compile_insert(&Row::new(), Driver::Postgres).unwrap();
        assert_eq!(compiled.sql, "INSERT INTO users DEFAULT VALUES");
        let compiled = users().compile_insert(&Row::new(), Driver::Mysql).unwrap();
        assert_eq!(compiled.sql, "INSERT INTO users () VALUES ()");

        let compiled = users()
            .where_eq("id", 7)
            .compile_update(&row(json!({"name": "x"})))
            .unwrap();
        assert_eq!(compiled.sql, "UPDATE users SET name = ? WHERE id = ?");
        assert_eq!(compiled.bindings, vec![json!("x"), json!(7)]);

        let compiled = users().where_in("id", [1, 2]).compile_delete().unwrap();
        assert_eq!(compiled.sql, "DELETE FROM users WHERE id IN (?, ?)");
    }

    #[test]
    fn test_insert_rejects_bad_column_names() {
        let err = users()
            .compile_insert(&row(json!({"email) VALUES ('x'); --": 1})), Driver::Sqlite)
            .unwrap_err();
        assert!(matches!(err, ModelError::Query(_)));
    }

    #[test]
    fn test_missing_table() {
        let err = QueryBuilder::<Row>::detached().to_sql().unwrap_err();
        assert!(matches!(err, ModelError::Query(_)));
    }
}
