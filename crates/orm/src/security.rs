//! Identifier validation and placeholder handling
//!
//! Values always travel as bound parameters. Table and column names cannot
//! be bound, so they are checked here before being spliced into SQL.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::ModelError;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$")
        .expect("identifier pattern is a valid regex")
});

/// Longest identifier accepted (PostgreSQL truncates at 63 bytes per part)
const MAX_IDENTIFIER_LEN: usize = 128;

/// Validate a table or column name, optionally qualified as `table.column`
pub fn validate_identifier(identifier: &str) -> Result<(), ModelError> {
    if identifier.is_empty() {
        return Err(ModelError::Query("Identifier cannot be empty".to_string()));
    }

    if identifier.len() > MAX_IDENTIFIER_LEN {
        return Err(ModelError::Query(format!(
            "Identifier '{}' is too long (max {} characters)",
            identifier, MAX_IDENTIFIER_LEN
        )));
    }

    if !IDENTIFIER.is_match(identifier) {
        return Err(ModelError::Query(format!(
            "Identifier '{}' contains invalid characters",
            identifier
        )));
    }

    Ok(())
}

/// Visit every `?` placeholder that sits outside a quoted literal.
///
/// Single quotes, double quotes and backticks open literals; a doubled
/// quote inside a literal is an escaped quote.
fn for_each_placeholder(sql: &str, mut on_placeholder: impl FnMut(usize)) {
    let mut quote: Option<char> = None;
    for (index, c) in sql.char_indices() {
        match quote {
            Some(open) if c == open => quote = None,
            Some(_) => {}
            None => match c {
                '\'' | '"' | '`' => quote = Some(c),
                '?' => on_placeholder(index),
                _ => {}
            },
        }
    }
}

/// Number of `?` placeholders outside quoted literals
pub fn count_placeholders(sql: &str) -> usize {
    let mut count = 0;
    for_each_placeholder(sql, |_| count += 1);
    count
}

/// Rewrite `?` placeholders to PostgreSQL's `$1, $2, ...` form.
///
/// NULL bindings are written into the statement as `NULL` and dropped from
/// the returned bindings: a NULL bound as text fails against non-text
/// columns.
pub fn number_placeholders<'a>(sql: &str, bindings: &'a [Value]) -> (String, Vec<&'a Value>) {
    let mut positions = Vec::new();
    for_each_placeholder(sql, |index| positions.push(index));

    let mut out = String::with_capacity(sql.len() + positions.len() * 2);
    let mut kept = Vec::with_capacity(bindings.len());
    let mut last = 0;
    for (n, index) in positions.into_iter().enumerate() {
        out.push_str(&sql[last..index]);
        match bindings.get(n) {
            Some(Value::Null) => out.push_str("NULL"),
            Some(value) => {
                kept.push(value);
                out.push('$');
                out.push_str(&kept.len().to_string());
            }
            None => out.push('?'),
        }
        last = index + 1;
    }
    out.push_str(&sql[last..]);
    (out, kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("user_table").is_ok());
        assert!(validate_identifier("table1").is_ok());
        assert!(validate_identifier("_private").is_ok());
        assert!(validate_identifier("users.email").is_ok());

        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("1table").is_err());
        assert!(validate_identifier("table-name").is_err());
        assert!(validate_identifier("table name").is_err());
        assert!(validate_identifier("a.b.c").is_err());
        assert!(validate_identifier("id; DROP TABLE users").is_err());
        assert!(validate_identifier("email = 'x' OR 1").is_err());
    }

    #[test]
    fn test_count_placeholders_skips_literals() {
        assert_eq!(count_placeholders("a = ? AND b IN (?, ?)"), 3);
        assert_eq!(count_placeholders("name = 'what?' AND id = ?"), 1);
        assert_eq!(count_placeholders("note = 'it''s ?' OR x = ?"), 1);
        assert_eq!(count_placeholders("\"odd?col\" = ?"), 1);
        assert_eq!(count_placeholders("1 = 0"), 0);
    }

    #[test]
    fn test_number_placeholders() {
        let bindings = vec![json!(1), json!(2)];
        let (sql, kept) =
            number_placeholders("SELECT * FROM t WHERE a = ? AND b = '?' LIMIT ?", &bindings);
        assert_eq!(sql, "SELECT * FROM t WHERE a = $1 AND b = '?' LIMIT $2");
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_number_placeholders_inlines_nulls() {
        let bindings = vec![json!("a@b.com"), Value::Null, json!(5)];
        let (sql, kept) =
            number_placeholders("INSERT INTO t (a, b, c) VALUES (?, ?, ?)", &bindings);
        assert_eq!(sql, "INSERT INTO t (a, b, c) VALUES ($1, NULL, $2)");
        assert_eq!(kept, vec![&json!("a@b.com"), &json!(5)]);
    }
}
