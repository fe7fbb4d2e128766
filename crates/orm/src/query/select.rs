//! Query Builder table, column, ordering and limit operations

use super::builder::QueryBuilder;
use super::types::*;
use crate::security::validate_identifier;

/// `*`, `table.*`, `column` or `column AS alias`
fn validate_column(column: &str) -> Result<(), String> {
    if column == "*" {
        return Ok(());
    }
    if let Some(table) = column.strip_suffix(".*") {
        return validate_identifier(table).map_err(|e| e.to_string());
    }

    let lower = column.to_ascii_lowercase();
    if let Some(at) = lower.find(" as ") {
        let (name, alias) = (column[..at].trim(), column[at + 4..].trim());
        validate_identifier(name).map_err(|e| e.to_string())?;
        return validate_identifier(alias).map_err(|e| e.to_string());
    }

    validate_identifier(column).map_err(|e| e.to_string())
}

impl<M> QueryBuilder<M> {
    /// Set the target table
    pub fn table(mut self, table: &str) -> Self {
        if self.check_identifier(table) {
            self.state.table = Some(table.to_string());
        }
        self
    }

    /// Replace the selected columns; an empty list selects `*`
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selected = Vec::new();
        for column in columns {
            let column = column.as_ref().trim();
            match validate_column(column) {
                Ok(()) => selected.push(column.to_string()),
                Err(e) => self.record_error(e),
            }
        }
        if selected.is_empty() {
            selected.push("*".to_string());
        }
        self.state.columns = selected;
        self
    }

    /// Add LIMIT clause; zero or negative removes it
    pub fn limit(mut self, count: i64) -> Self {
        self.state.limit = u64::try_from(count).ok().filter(|&n| n > 0);
        self
    }

    /// Add OFFSET clause; negative removes it. Only emitted with a LIMIT.
    pub fn offset(mut self, count: i64) -> Self {
        self.state.offset = u64::try_from(count).ok();
        self
    }

    /// Add ORDER BY clause; any direction other than `desc` sorts ascending
    pub fn order_by(mut self, column: &str, direction: &str) -> Self {
        if self.check_identifier(column) {
            self.state
                .orders
                .push((column.to_string(), OrderDirection::coerce(direction)));
        }
        self
    }

    pub fn order_by_desc(self, column: &str) -> Self {
        self.order_by(column, "desc")
    }

    /// Newest first by `created_at`
    pub fn latest(self) -> Self {
        self.order_by("created_at", "desc")
    }

    /// Oldest first by `created_at`
    pub fn oldest(self) -> Self {
        self.order_by("created_at", "asc")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> QueryBuilder<Row> {
        QueryBuilder::detached().table("users")
    }

    #[test]
    fn test_limit_and_offset_clearing() {
        let query = builder().limit(10).offset(20);
        assert_eq!(query.state().limit, Some(10));
        assert_eq!(query.state().offset, Some(20));

        let query = query.limit(0).offset(-1);
        assert_eq!(query.state().limit, None);
        assert_eq!(query.state().offset, None);

        assert_eq!(builder().limit(-5).state().limit, None);
    }

    #[test]
    fn test_order_direction_is_coerced() {
        let query = builder().order_by("name", "DESC").order_by("id", "; DROP");
        assert_eq!(
            query.state().orders,
            vec![
                ("name".to_string(), OrderDirection::Desc),
                ("id".to_string(), OrderDirection::Asc)
            ]
        );
    }

    #[test]
    fn test_select_columns() {
        let query = builder().select(["id", "users.email", "name AS label", "posts.*"]);
        assert_eq!(query.state().columns, vec!["id", "users.email", "name AS label", "posts.*"]);
        assert!(query.state().error.is_none());

        let query = builder().select(Vec::<String>::new());
        assert_eq!(query.state().columns, vec!["*"]);

        let query = builder().select(["id, (SELECT password FROM admins)"]);
        assert!(query.state().error.is_some());
    }
}
